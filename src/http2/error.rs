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

// std
use std::error;
use std::fmt;
use std::io;

// ebb
use http2::frame::StreamId;
use http2::core::shutdown_state::ConnectionPhase;

/// An error observed on the connection-level pipeline.
///
/// The variants describe where the error came from rather than what went wrong, because that is
/// what decides whether the connection survives it. See `classify`.
#[derive(Debug)]
pub enum HttpError {
    ConnectionError(ErrorCode, ErrorName),
    StreamError(StreamId, ErrorCode, ErrorName),
    NoSuchStream(StreamId),
    Io(io::Error)
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            HttpError::ConnectionError(ref code, ref name) => {
                write!(f, "connection error {:?}: {}", code, name.description())
            },
            HttpError::StreamError(stream_id, ref code, ref name) => {
                write!(f, "stream error on stream {} {:?}: {}", stream_id, code, name.description())
            },
            HttpError::NoSuchStream(stream_id) => {
                write!(f, "no such stream {}", stream_id)
            },
            HttpError::Io(ref e) => {
                write!(f, "io error: {}", e)
            }
        }
    }
}

impl error::Error for HttpError {
    fn source(&self) -> Option<&(error::Error + 'static)> {
        match *self {
            HttpError::Io(ref e) => Some(e),
            _ => None
        }
    }
}

impl From<io::Error> for HttpError {
    fn from(e: io::Error) -> HttpError {
        HttpError::Io(e)
    }
}

/// What the connection should do about an error it has observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    Ignore,
    CloseConnection
}

/// Decides whether an error is fatal to the connection in its current phase.
///
/// - A reference to a stream which no longer exists is an expected race with the client once
///   the connection is draining, so it is only fatal while the connection is active.
/// - Stream errors are routed through the connection for structural reasons only and never
///   take the connection down.
/// - Anything else is fatal until proven otherwise.
pub fn classify(err: &HttpError, phase: ConnectionPhase) -> ErrorDisposition {
    match *err {
        HttpError::NoSuchStream(_) => {
            match phase {
                ConnectionPhase::Active => ErrorDisposition::CloseConnection,
                ConnectionPhase::Closing | ConnectionPhase::Closed => ErrorDisposition::Ignore
            }
        },
        HttpError::StreamError(..) => ErrorDisposition::Ignore,
        HttpError::ConnectionError(..) | HttpError::Io(_) => ErrorDisposition::CloseConnection
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // The associated condition is not a result of an error. For example, a GOAWAY might include this code to indicate graceful shutdown of a connection.
    NoError,
    // The endpoint detected an unspecific protocol error. This error is for use when a more specific error code is not available.
    ProtocolError,
    // The endpoint encountered an unexpected internal error.
    InternalError,
    // The endpoint detected that its peer violated the flow-control protocol.
    FlowControlError,
    // The endpoint sent a SETTINGS frame but did not receive a response in a timely manner. See Section 6.5.3 ("Settings Synchronization").
    SettingsTimeout,
    // The endpoint received a frame after a stream was half-closed.
    StreamClosed,
    // The endpoint received a frame with an invalid size.
    FrameSizeError,
    // The endpoint refused the stream prior to performing any application processing (see Section 8.1.4 for details).
    RefusedStream,
    // Used by the endpoint to indicate that the stream is no longer needed.
    Cancel,
    // The endpoint is unable to maintain the header compression context for the connection.
    CompressionError,
    // The connection established in response to a CONNECT request (Section 8.3) was reset or abnormally closed.
    ConnectError,
    // The endpoint detected that its peer is exhibiting a behavior that might be generating excessive load.
    EnhanceYourCalm,
    // The underlying transport has properties that do not meet minimum security requirements (see Section 9.2).
    InadequateSecurity,
    // The endpoint requires that HTTP/1.1 be used instead of HTTP/2.
    Http11Required
}

/// Names the condition behind a connection or stream error, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorName {
    StreamStateViolation,
    StreamIsClosed,
    UnexpectedGoAwayFromClient
}

impl ErrorName {
    pub fn description(&self) -> &'static str {
        match *self {
            ErrorName::StreamStateViolation => {
                "stream state violation"
            },
            ErrorName::StreamIsClosed => {
                "stream is closed"
            },
            ErrorName::UnexpectedGoAwayFromClient => {
                "unexpected go away from client"
            }
        }
    }
}
