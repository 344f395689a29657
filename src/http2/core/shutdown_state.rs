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

//! Graceful shutdown bookkeeping for a single connection.
//!
//! (6.8) A server that is attempting to gracefully shut down a connection SHOULD send an initial
//! GOAWAY frame with the last stream identifier set to 2^31-1 and a NO_ERROR code. This signals
//! to the client that a shutdown is imminent and that initiating further requests is prohibited.
//! After allowing time for any in-flight stream creation (at least one round-trip time), the
//! server can send another GOAWAY frame with an updated last stream identifier.
//!
//! The round trip is measured with a PING carrying data unique to this connection. Once it is
//! acknowledged the client has seen the first GOAWAY, so the second GOAWAY can name the highest
//! stream which was actually opened and the connection closes when those streams finish.
//!
//! Nothing in here performs I/O. Each operation returns the action the caller must carry out.

// std
use std::collections::HashSet;
use std::mem;

// ebb
use http2::frame::{StreamId, PingData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Active,
    Closing,
    Closed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamClosedAction {
    None,
    StartIdleTimer,
    Close
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingAckAction {
    None,
    SendGoAway {
        last_stream_id: StreamId,
        close: bool
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GracefulShutdownAction {
    None,
    /// Send a GOAWAY naming the maximum stream identifier, then a PING carrying this data.
    SendGoAwayAndPing(PingData)
}

pub struct ShutdownStateMachine {
    name: ConnectionStateName,
    ping_data: PingData
}

impl ShutdownStateMachine {
    pub fn new() -> Self {
        ShutdownStateMachine::with_ping_data(PingData::random())
    }

    pub fn with_ping_data(ping_data: PingData) -> Self {
        ShutdownStateMachine {
            name: ConnectionStateName::Active(ConnectionState::new()),
            ping_data: ping_data
        }
    }

    /// Record a newly opened stream.
    ///
    /// Streams still open while closing because the client may not have seen the first GOAWAY.
    ///
    /// # Panics
    ///
    /// If the stream is already open.
    pub fn stream_opened(&mut self, stream_id: StreamId) {
        match self.name {
            ConnectionStateName::Active(ref mut s) => s.state.streams.open(stream_id),
            ConnectionStateName::Closing(ref mut s) => s.state.streams.open(stream_id),
            ConnectionStateName::Closed(_) => ()
        }
    }

    /// # Panics
    ///
    /// If the stream was not open.
    pub fn stream_closed(&mut self, stream_id: StreamId) -> StreamClosedAction {
        match self.name {
            ConnectionStateName::Active(ref mut s) => {
                if s.state.streams.close(stream_id) {
                    StreamClosedAction::StartIdleTimer
                }
                else {
                    StreamClosedAction::None
                }
            },
            ConnectionStateName::Closing(ref mut s) => {
                // Closing is only safe once the second GOAWAY has gone out, before that the
                // client may still open streams.
                if s.state.streams.close(stream_id) && s.state.sent_second_go_away {
                    StreamClosedAction::Close
                }
                else {
                    StreamClosedAction::None
                }
            },
            ConnectionStateName::Closed(_) => StreamClosedAction::None
        }
    }

    pub fn received_ping_ack(&mut self, data: PingData) -> PingAckAction {
        if data != self.ping_data {
            return PingAckAction::None;
        }

        match self.name {
            ConnectionStateName::Closing(ref mut s) => {
                // Only the first acknowledgement counts, there are never more than two GOAWAYs.
                if s.state.sent_second_go_away {
                    return PingAckAction::None;
                }

                s.state.sent_second_go_away = true;

                PingAckAction::SendGoAway {
                    last_stream_id: s.state.streams.last_stream_id,
                    close: s.state.streams.is_empty()
                }
            },
            ConnectionStateName::Active(_) | ConnectionStateName::Closed(_) => PingAckAction::None
        }
    }

    pub fn start_graceful_shutdown(&mut self) -> GracefulShutdownAction {
        let active = match self.name {
            ConnectionStateName::Active(ref mut s) => mem::replace(s, ConnectionState::new()),
            ConnectionStateName::Closing(_) | ConnectionStateName::Closed(_) => {
                return GracefulShutdownAction::None;
            }
        };

        log_conn_transition!("Starting graceful shutdown", ConnectionPhase::Active, ConnectionPhase::Closing);
        self.name = ConnectionStateName::Closing(active.into());

        GracefulShutdownAction::SendGoAwayAndPing(self.ping_data)
    }

    /// The transport has closed, always legal.
    pub fn mark_closed(&mut self) {
        let last_stream_id = self.get_last_stream_id();
        log_conn_transition!("Marking closed", self.get_phase(), ConnectionPhase::Closed);
        self.name = ConnectionStateName::Closed(ConnectionState::new_closed(last_stream_id));
    }

    pub fn get_phase(&self) -> ConnectionPhase {
        match self.name {
            ConnectionStateName::Active(_) => ConnectionPhase::Active,
            ConnectionStateName::Closing(_) => ConnectionPhase::Closing,
            ConnectionStateName::Closed(_) => ConnectionPhase::Closed
        }
    }

    pub fn get_ping_data(&self) -> PingData {
        self.ping_data
    }

    pub fn get_last_stream_id(&self) -> StreamId {
        match self.name {
            ConnectionStateName::Active(ref s) => s.state.streams.last_stream_id,
            ConnectionStateName::Closing(ref s) => s.state.streams.last_stream_id,
            ConnectionStateName::Closed(ref s) => s.state.last_stream_id
        }
    }

    pub fn get_open_stream_count(&self) -> usize {
        match self.name {
            ConnectionStateName::Active(ref s) => s.state.streams.open_streams.len(),
            ConnectionStateName::Closing(ref s) => s.state.streams.open_streams.len(),
            ConnectionStateName::Closed(_) => 0
        }
    }

    pub fn has_sent_second_go_away(&self) -> bool {
        match self.name {
            ConnectionStateName::Closing(ref s) => s.state.sent_second_go_away,
            _ => false
        }
    }
}

enum ConnectionStateName {
    Active(ConnectionState<StateActive>),
    Closing(ConnectionState<StateClosing>),
    Closed(ConnectionState<StateClosed>)
}

struct ConnectionState<S> {
    state: S
}

impl ConnectionState<StateActive> {
    fn new() -> Self {
        ConnectionState {
            state: StateActive {
                streams: StreamSet::new()
            }
        }
    }
}

impl ConnectionState<StateClosed> {
    fn new_closed(last_stream_id: StreamId) -> Self {
        ConnectionState {
            state: StateClosed {
                last_stream_id: last_stream_id
            }
        }
    }
}

struct StateActive {
    streams: StreamSet
}

struct StateClosing {
    streams: StreamSet,
    sent_second_go_away: bool
}

struct StateClosed {
    last_stream_id: StreamId
}

impl From<ConnectionState<StateActive>> for ConnectionState<StateClosing> {
    fn from(active: ConnectionState<StateActive>) -> ConnectionState<StateClosing> {
        ConnectionState {
            state: StateClosing {
                streams: active.state.streams,
                sent_second_go_away: false
            }
        }
    }
}

struct StreamSet {
    open_streams: HashSet<StreamId>,
    // The highest stream ever opened, even once closed, for the final GOAWAY.
    last_stream_id: StreamId
}

impl StreamSet {
    fn new() -> Self {
        StreamSet {
            open_streams: HashSet::new(),
            last_stream_id: 0
        }
    }

    fn open(&mut self, stream_id: StreamId) {
        assert!(self.open_streams.insert(stream_id), "stream {} opened twice", stream_id);

        if stream_id > self.last_stream_id {
            self.last_stream_id = stream_id;
        }
    }

    /// Yields true when the last open stream has gone.
    fn close(&mut self, stream_id: StreamId) -> bool {
        assert!(self.open_streams.remove(&stream_id), "stream {} closed but was never open", stream_id);

        self.open_streams.is_empty()
    }

    fn is_empty(&self) -> bool {
        self.open_streams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ShutdownStateMachine, ConnectionPhase, StreamClosedAction, PingAckAction, GracefulShutdownAction};
    use http2::frame::PingData;

    const TOKEN: [u8; 8] = [0x1, 0x2, 0x3, 0x4, 0x5, 0x6, 0x7, 0x8];

    fn new_machine() -> ShutdownStateMachine {
        ShutdownStateMachine::with_ping_data(PingData::new(TOKEN))
    }

    #[test]
    fn drain_with_open_stream() {
        let mut machine = new_machine();
        machine.stream_opened(1);

        assert_eq!(GracefulShutdownAction::SendGoAwayAndPing(PingData::new(TOKEN)), machine.start_graceful_shutdown());
        assert_eq!(ConnectionPhase::Closing, machine.get_phase());

        assert_eq!(
            PingAckAction::SendGoAway { last_stream_id: 1, close: false },
            machine.received_ping_ack(PingData::new(TOKEN))
        );

        assert_eq!(StreamClosedAction::Close, machine.stream_closed(1));
    }

    #[test]
    fn drain_with_no_streams_closes_on_ack() {
        let mut machine = new_machine();

        machine.start_graceful_shutdown();

        assert_eq!(
            PingAckAction::SendGoAway { last_stream_id: 0, close: true },
            machine.received_ping_ack(PingData::new(TOKEN))
        );
        assert!(machine.has_sent_second_go_away());
    }

    #[test]
    fn graceful_shutdown_is_idempotent() {
        let mut machine = new_machine();

        assert!(machine.start_graceful_shutdown() != GracefulShutdownAction::None);
        assert_eq!(GracefulShutdownAction::None, machine.start_graceful_shutdown());

        machine.mark_closed();
        assert_eq!(GracefulShutdownAction::None, machine.start_graceful_shutdown());
        assert_eq!(ConnectionPhase::Closed, machine.get_phase());
    }

    #[test]
    fn ping_ack_ignored_unless_closing_with_matching_data() {
        let mut machine = new_machine();

        // Active
        assert_eq!(PingAckAction::None, machine.received_ping_ack(PingData::new(TOKEN)));
        assert!(!machine.has_sent_second_go_away());

        machine.start_graceful_shutdown();

        // Some other ping, such as a keep alive.
        assert_eq!(PingAckAction::None, machine.received_ping_ack(PingData::new([0; 8])));
        assert!(!machine.has_sent_second_go_away());

        machine.mark_closed();
        assert_eq!(PingAckAction::None, machine.received_ping_ack(PingData::new(TOKEN)));
        assert!(!machine.has_sent_second_go_away());
    }

    #[test]
    fn only_first_ping_ack_sends_go_away() {
        let mut machine = new_machine();
        machine.stream_opened(1);
        machine.start_graceful_shutdown();

        assert!(machine.received_ping_ack(PingData::new(TOKEN)) != PingAckAction::None);
        assert_eq!(PingAckAction::None, machine.received_ping_ack(PingData::new(TOKEN)));
    }

    #[test]
    fn closing_needs_second_go_away() {
        let mut machine = new_machine();
        machine.stream_opened(1);
        machine.stream_opened(3);
        machine.start_graceful_shutdown();

        // The ping hasn't come back yet, more streams may be on the way.
        assert_eq!(StreamClosedAction::None, machine.stream_closed(1));

        machine.received_ping_ack(PingData::new(TOKEN));

        assert_eq!(StreamClosedAction::Close, machine.stream_closed(3));
    }

    #[test]
    fn last_stream_empties_while_closing_without_ack() {
        let mut machine = new_machine();
        machine.stream_opened(1);
        machine.start_graceful_shutdown();

        assert_eq!(StreamClosedAction::None, machine.stream_closed(1));

        // Nothing left open when the ack arrives, so close straight away.
        assert_eq!(
            PingAckAction::SendGoAway { last_stream_id: 1, close: true },
            machine.received_ping_ack(PingData::new(TOKEN))
        );
    }

    #[test]
    fn idle_timer_restarts_when_active_connection_empties() {
        let mut machine = new_machine();
        machine.stream_opened(1);
        machine.stream_opened(3);

        assert_eq!(StreamClosedAction::None, machine.stream_closed(3));
        assert_eq!(StreamClosedAction::StartIdleTimer, machine.stream_closed(1));
    }

    #[test]
    fn streams_raced_past_first_go_away_are_tracked() {
        let mut machine = new_machine();
        machine.stream_opened(1);
        machine.start_graceful_shutdown();

        machine.stream_opened(5);
        assert_eq!(5, machine.get_last_stream_id());
        assert_eq!(2, machine.get_open_stream_count());

        assert_eq!(
            PingAckAction::SendGoAway { last_stream_id: 5, close: false },
            machine.received_ping_ack(PingData::new(TOKEN))
        );
    }

    #[test]
    fn last_stream_id_never_decreases() {
        let mut machine = new_machine();
        let mut highest = 0;

        for &(open, close) in [(1, None), (7, Some(1)), (3, None), (9, Some(7)), (5, Some(3))].iter() {
            machine.stream_opened(open);
            if let Some(close) = close {
                machine.stream_closed(close);
            }

            assert!(machine.get_last_stream_id() >= highest);
            highest = machine.get_last_stream_id();
        }

        assert_eq!(9, highest);
    }

    #[test]
    fn closed_ignores_stream_events() {
        let mut machine = new_machine();
        machine.stream_opened(1);
        machine.mark_closed();

        machine.stream_opened(3);
        assert_eq!(StreamClosedAction::None, machine.stream_closed(1));
        assert_eq!(0, machine.get_open_stream_count());
        assert_eq!(1, machine.get_last_stream_id());
    }

    #[test]
    #[should_panic(expected = "opened twice")]
    fn double_open_panics() {
        let mut machine = new_machine();
        machine.stream_opened(1);
        machine.stream_opened(1);
    }

    #[test]
    #[should_panic(expected = "never open")]
    fn close_before_open_panics() {
        let mut machine = new_machine();
        machine.stream_closed(1);
    }

    #[test]
    fn random_ping_data_per_connection() {
        let a = ShutdownStateMachine::new();
        let b = ShutdownStateMachine::new();

        // 64 random bits, a collision here means the generator is broken.
        assert!(a.get_ping_data() != b.get_ping_data());
    }

    #[test]
    fn complemented_token_is_not_the_drain_ack() {
        let mut machine = new_machine();
        machine.stream_opened(1);
        machine.start_graceful_shutdown();

        let mut complement = TOKEN;
        for byte in complement.iter_mut() {
            *byte = !*byte;
        }

        assert_eq!(PingAckAction::None, machine.received_ping_ack(PingData::new(complement)));
        assert!(!machine.has_sent_second_go_away());

        assert_eq!(
            PingAckAction::SendGoAway { last_stream_id: 1, close: false },
            machine.received_ping_ack(PingData::new(TOKEN))
        );
    }
}
