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

extern crate bytes;
extern crate futures;
extern crate tokio_core;
extern crate rand;
#[macro_use] extern crate log;

pub mod shared;
#[macro_use]
pub mod http2;

pub use http2::net::{new_connection, ConnectionTask, ConnectionHandle, ConnectionEvent, Transport, CloseMode};
pub use http2::net::shutdown_signal::QuiesceSignaller;
pub use shared::connection_settings::ConnectionSettings;
