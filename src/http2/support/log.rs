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

#[macro_export]
macro_rules! log_conn_event {
    ( $msg:expr, $event:expr ) => {
        #[cfg(feature = "ebb_support")]
        {
            debug!("(conn) {}: {:?}", $msg, $event);
        }
    };
}

#[macro_export]
macro_rules! log_conn_send_frame {
    ( $msg:expr, $frame:expr ) => {
        #[cfg(feature = "ebb_support")]
        {
            debug!("(conn) {}: {:?}", $msg, $frame);
        }
    };
}

#[macro_export]
macro_rules! log_conn_transition {
    ( $msg:expr, $from:expr, $to:expr ) => {
        #[cfg(feature = "ebb_support")]
        {
            trace!("(conn) {}: {:?} -> {:?}", $msg, $from, $to);
        }
    };
}
