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

// bytes
use bytes::Bytes;

// ebb
use http2::error;
use http2::frame::StreamId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoAwayFrame {
    last_stream_identifier: StreamId,
    error_code: error::ErrorCode,
    additional_debug_data: Option<Bytes>
}

impl GoAwayFrame {
    pub fn new(last_stream_identifier: StreamId, error_code: error::ErrorCode) -> Self {
        GoAwayFrame {
            last_stream_identifier: last_stream_identifier,
            error_code: error_code,
            additional_debug_data: None
        }
    }

    pub fn set_additional_debug_data(&mut self, additional_debug_data: Bytes) {
        self.additional_debug_data = Some(additional_debug_data);
    }

    pub fn get_last_stream_identifier(&self) -> StreamId {
        self.last_stream_identifier
    }

    pub fn get_error_code(&self) -> error::ErrorCode {
        self.error_code
    }

    pub fn get_additional_debug_data(&self) -> Option<&Bytes> {
        self.additional_debug_data.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::GoAwayFrame;
    use http2::error::ErrorCode;
    use http2::frame::MAX_STREAM_ID;

    #[test]
    fn debug_data_is_optional() {
        let mut go_away = GoAwayFrame::new(MAX_STREAM_ID, ErrorCode::NoError);
        assert_eq!(None, go_away.get_additional_debug_data());

        go_away.set_additional_debug_data(Bytes::from_static(b"draining"));
        assert_eq!(Some(&Bytes::from_static(b"draining")), go_away.get_additional_debug_data());
        assert_eq!(MAX_STREAM_ID, go_away.get_last_stream_identifier());
    }
}
