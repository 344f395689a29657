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

// rand
use rand::{self, RngCore};

const FLAG_ACK: u8 = 0x1;

/// The 8 octets of opaque data carried by a PING frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PingData([u8; 8]);

impl PingData {
    pub fn new(bytes: [u8; 8]) -> Self {
        PingData(bytes)
    }

    /// Opaque data which is unlikely to collide with any other PING on the connection.
    pub fn random() -> Self {
        let mut bytes = [0; 8];
        rand::rng().fill_bytes(&mut bytes);
        PingData(bytes)
    }

    pub fn get_bytes(&self) -> [u8; 8] {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingFrame {
    flags: u8,
    payload: PingData
}

impl PingFrame {
    pub fn new(payload: PingData) -> Self {
        PingFrame {
            flags: 0,
            payload: payload
        }
    }

    /// (6.7) Receivers of a PING frame that does not include an ACK flag MUST send a PING frame
    /// with the ACK flag set in response, with an identical payload.
    pub fn new_acknowledge(payload: PingData) -> Self {
        let mut frame = PingFrame::new(payload);
        frame.set_acknowledge();
        frame
    }

    pub fn set_acknowledge(&mut self) {
        self.flags |= FLAG_ACK;
    }

    pub fn is_acknowledge(&self) -> bool {
        is_acknowledge(self.flags)
    }

    pub fn get_flags(&self) -> u8 {
        self.flags
    }

    pub fn get_payload(&self) -> PingData {
        self.payload
    }
}

pub fn is_acknowledge(flags: u8) -> bool {
    flags & FLAG_ACK == FLAG_ACK
}
