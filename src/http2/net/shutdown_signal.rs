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
use std::mem;

// ebb
use http2::net::ConnectionHandle;

/// Fans a server-wide quiesce out to every connection.
///
/// Connections registered after the signal are quiesced as soon as they register.
pub struct QuiesceSignaller {
    connections: Vec<ConnectionHandle>,
    quiesced: bool
}

impl QuiesceSignaller {
    pub fn new() -> Self {
        QuiesceSignaller {
            connections: Vec::new(),
            quiesced: false
        }
    }

    pub fn register(&mut self, connection: ConnectionHandle) {
        if self.quiesced {
            trace!("Quiescing connection registered after the signal");
            connection.quiesce();
            return;
        }

        self.connections.push(connection);
    }

    /// Calling this more than once has no further effect.
    pub fn signal_quiesce(&mut self) {
        if self.quiesced {
            debug!("Quiesce has already been signalled");
            return;
        }
        self.quiesced = true;

        // Handles are not needed after the signal, connections which have gone are skipped.
        let connections = mem::replace(&mut self.connections, Vec::new());
        let delivered = connections.iter().filter(|connection| connection.quiesce()).count();

        info!("Signalled quiesce to {} of {} connections", delivered, connections.len());
    }

    pub fn is_quiesced(&self) -> bool {
        self.quiesced
    }

    pub fn get_connection_count(&self) -> usize {
        self.connections.len()
    }
}
