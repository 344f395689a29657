// Copyright 2017 ThetaSinner
//
// This file is part of Ebb.

// Ebb is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Ebb is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Ebb.  If not, see <http://www.gnu.org/licenses/>.

// Frames reach this crate already decoded. Only PING and GOAWAY carry anything the connection
// manager needs to look at, every other frame is kept as its header and passed on untouched.

pub mod ping;
pub mod go_away;

pub use self::ping::{PingData, PingFrame};
pub use self::go_away::GoAwayFrame;

pub type StreamId = u32;

pub const CONNECTION_CONTROL_STREAM_ID: StreamId = 0x0;

// Denoted 'R' in http2 Section 4.1, stream identifiers are 31 bits.
pub const MAX_STREAM_ID: StreamId = 0x7FFFFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Data,
    Headers,
    Priority,
    ResetStream,
    Settings,
    PushPromise,
    Ping,
    GoAway,
    WindowUpdate,
    Continuation
}

/// The header of a frame which the connection manager does not examine.
///
/// The frame type is `None` when the type was not recognised, (5.5) such frames must be
/// ignored rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub frame_type: Option<FrameType>,
    pub flags: u8,
    pub stream_id: StreamId
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Ping(PingFrame),
    GoAway(GoAwayFrame),
    Other(FrameHeader)
}

impl Frame {
    pub fn get_frame_type(&self) -> Option<FrameType> {
        match *self {
            Frame::Ping(_) => Some(FrameType::Ping),
            Frame::GoAway(_) => Some(FrameType::GoAway),
            Frame::Other(ref header) => header.frame_type
        }
    }

    pub fn get_stream_id(&self) -> StreamId {
        match *self {
            // (6.7) and (6.8) PING and GOAWAY frames are only ever sent on the connection control stream.
            Frame::Ping(_) | Frame::GoAway(_) => CONNECTION_CONTROL_STREAM_ID,
            Frame::Other(ref header) => header.stream_id
        }
    }
}
