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
use std::time::Duration;

// futures
use futures::sync::mpsc;

// tokio
use tokio_core::reactor::Handle;

// ebb
use http2::frame::{self as framing, Frame, StreamId, MAX_STREAM_ID};
use http2::error::{self, ErrorCode, ErrorDisposition, HttpError};
use http2::net::{ConnectionEvent, Transport, CloseMode};
use http2::core::scheduled_timer::ScheduledTimer;
use http2::core::shutdown_state::{self, ShutdownStateMachine, ConnectionPhase};
use shared::connection_settings::ConnectionSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Idle,
    Age,
    Grace
}

/// Enforces the idle, age and grace limits on one connection and drains it gracefully.
///
/// The manager is owned by the connection's task and every method must be called from that
/// task. Timers report back through the connection's mailbox rather than calling in directly.
pub struct ConnectionManager<T: Transport> {
    state: ShutdownStateMachine,
    transport: T,

    idle_timer: Option<ScheduledTimer>,
    age_timer: Option<ScheduledTimer>,
    grace_timer: Option<ScheduledTimer>,

    in_read_loop: bool,
    flush_pending: bool,
    close_deferred: bool
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(
        settings: &ConnectionSettings,
        transport: T,
        handle: &Handle,
        mailbox: &mpsc::UnboundedSender<ConnectionEvent>
    ) -> Self
    {
        ConnectionManager {
            state: ShutdownStateMachine::new(),
            transport: transport,
            idle_timer: new_timer(TimerKind::Idle, settings.get_max_idle_time(), handle, mailbox),
            age_timer: new_timer(TimerKind::Age, settings.get_max_age(), handle, mailbox),
            grace_timer: new_timer(TimerKind::Grace, settings.get_max_grace_time(), handle, mailbox),
            in_read_loop: false,
            flush_pending: false,
            close_deferred: false
        }
    }

    pub fn handle_event(&mut self, event: ConnectionEvent) {
        log_conn_event!("Handle event", event);

        match event {
            ConnectionEvent::Active => self.channel_active(),
            ConnectionEvent::StreamCreated(stream_id) => self.stream_created(stream_id),
            ConnectionEvent::StreamClosed(stream_id) => self.stream_closed(stream_id),
            ConnectionEvent::FrameRead(frame) => self.frame_read(frame),
            ConnectionEvent::ReadComplete => self.read_complete(),
            ConnectionEvent::Quiesce => self.quiesce(),
            ConnectionEvent::Inactive => self.channel_inactive(),
            ConnectionEvent::Error(err) => {
                self.error_caught(err);
            },
            ConnectionEvent::TimerFired(kind, generation) => self.timer_fired(kind, generation)
        }
    }

    pub fn channel_active(&mut self) {
        start_timer(&mut self.age_timer);
        start_timer(&mut self.idle_timer);
    }

    pub fn stream_created(&mut self, stream_id: StreamId) {
        // A connection with an open stream is not idle.
        cancel_timer(&mut self.idle_timer);
        self.state.stream_opened(stream_id);
    }

    pub fn stream_closed(&mut self, stream_id: StreamId) {
        match self.state.stream_closed(stream_id) {
            shutdown_state::StreamClosedAction::StartIdleTimer => {
                start_timer(&mut self.idle_timer);
            },
            shutdown_state::StreamClosedAction::Close => {
                // The frame which ended the stream may not have been flushed by the layer which
                // wrote it. Closing now could drop it, so wait for the next turn of the task.
                trace!("Last stream {} closed while draining, closing on the next turn", stream_id);
                self.close_deferred = true;
            },
            shutdown_state::StreamClosedAction::None => ()
        }
    }

    pub fn frame_read(&mut self, frame: Frame) {
        self.in_read_loop = true;

        let ping_ack_data = match frame {
            Frame::Ping(ref ping) if ping.is_acknowledge() => Some(ping.get_payload()),
            _ => None
        };

        if let Some(data) = ping_ack_data {
            match self.state.received_ping_ack(data) {
                shutdown_state::PingAckAction::SendGoAway { last_stream_id, close } => {
                    info!("Drain ping acknowledged, last stream is {}", last_stream_id);
                    self.write_frame(Frame::GoAway(framing::GoAwayFrame::new(last_stream_id, ErrorCode::NoError)));

                    if close {
                        self.flush_now();
                        self.transport.fire_frame_read(frame);
                        self.transport.close(CloseMode::Graceful);
                        return;
                    }

                    self.flush_or_defer();
                },
                shutdown_state::PingAckAction::None => ()
            }
        }

        self.transport.fire_frame_read(frame);
    }

    pub fn read_complete(&mut self) {
        self.in_read_loop = false;

        if self.flush_pending {
            self.flush_now();
        }
    }

    /// Firings are queued in the mailbox, so one may arrive after its timer was cancelled or
    /// restarted. Only a firing from the timer's current generation is acted on.
    pub fn timer_fired(&mut self, kind: TimerKind, generation: u64) {
        if !self.timer(kind).as_ref().map_or(false, |t| t.is_current(generation)) {
            trace!("Dropping stale {:?} timer firing", kind);
            return;
        }

        debug!("{:?} timer fired", kind);

        match kind {
            TimerKind::Idle | TimerKind::Age => self.initiate_graceful_shutdown(),
            TimerKind::Grace => {
                if self.state.get_phase() != ConnectionPhase::Closed {
                    info!("Grace period expired with {} streams open, closing", self.state.get_open_stream_count());
                    self.transport.close(CloseMode::Abrupt);
                }
            }
        }
    }

    pub fn quiesce(&mut self) {
        self.initiate_graceful_shutdown();
    }

    pub fn channel_inactive(&mut self) {
        cancel_timer(&mut self.idle_timer);
        cancel_timer(&mut self.age_timer);
        cancel_timer(&mut self.grace_timer);

        self.close_deferred = false;
        self.state.mark_closed();
    }

    /// Every handle to the connection has gone, so nothing is left to report it inactive or to
    /// finish a drain. Close whatever remains.
    pub fn abandon(&mut self) {
        if self.state.get_phase() != ConnectionPhase::Closed {
            warn!("Connection abandoned in phase {:?} with {} streams open, closing",
                self.state.get_phase(), self.state.get_open_stream_count());

            if self.flush_pending {
                self.flush_now();
            }
            self.transport.close(CloseMode::Abrupt);
        }

        self.channel_inactive();
    }

    pub fn error_caught(&mut self, err: HttpError) -> ErrorDisposition {
        let disposition = error::classify(&err, self.state.get_phase());

        match disposition {
            ErrorDisposition::CloseConnection => {
                warn!("Closing connection after error: {}", err);
                self.transport.close(CloseMode::Abrupt);
            },
            ErrorDisposition::Ignore => {
                debug!("Ignoring error in phase {:?}: {}", self.state.get_phase(), err);
            }
        }

        disposition
    }

    pub fn has_deferred(&self) -> bool {
        self.close_deferred
    }

    pub fn run_deferred(&mut self) {
        if !self.close_deferred {
            return;
        }
        self.close_deferred = false;

        if self.flush_pending {
            self.flush_now();
        }

        if self.state.get_phase() != ConnectionPhase::Closed {
            info!("All streams finished after drain, closing");
            self.transport.close(CloseMode::Graceful);
        }
    }

    pub fn get_phase(&self) -> ConnectionPhase {
        self.state.get_phase()
    }

    pub fn get_ping_data(&self) -> framing::PingData {
        self.state.get_ping_data()
    }

    pub fn is_timer_armed(&self, kind: TimerKind) -> bool {
        self.timer(kind).as_ref().map_or(false, |t| t.is_armed())
    }

    pub fn get_transport(&self) -> &T {
        &self.transport
    }

    fn timer(&self, kind: TimerKind) -> &Option<ScheduledTimer> {
        match kind {
            TimerKind::Idle => &self.idle_timer,
            TimerKind::Age => &self.age_timer,
            TimerKind::Grace => &self.grace_timer
        }
    }

    fn initiate_graceful_shutdown(&mut self) {
        match self.state.start_graceful_shutdown() {
            shutdown_state::GracefulShutdownAction::SendGoAwayAndPing(ping_data) => {
                info!("Starting graceful shutdown with {} streams open", self.state.get_open_stream_count());

                // The connection is already on its way out.
                cancel_timer(&mut self.idle_timer);
                cancel_timer(&mut self.age_timer);

                // (6.8) A server that is attempting to gracefully shut down a connection SHOULD send an
                // initial GOAWAY frame with the last stream identifier set to 2^31-1 and a NO_ERROR code.
                self.write_frame(Frame::GoAway(framing::GoAwayFrame::new(MAX_STREAM_ID, ErrorCode::NoError)));
                self.write_frame(Frame::Ping(framing::PingFrame::new(ping_data)));
                self.flush_or_defer();

                // Bounds the whole drain, including a client which never acknowledges the ping.
                start_timer(&mut self.grace_timer);
            },
            shutdown_state::GracefulShutdownAction::None => {
                trace!("Graceful shutdown already started");
            }
        }
    }

    fn write_frame(&mut self, frame: Frame) {
        log_conn_send_frame!("Writing frame", frame);
        self.transport.write_frame(frame);
    }

    // Writes made while reading are flushed once when the read burst completes.
    fn flush_or_defer(&mut self) {
        if self.in_read_loop {
            self.flush_pending = true;
        }
        else {
            self.flush_now();
        }
    }

    fn flush_now(&mut self) {
        self.flush_pending = false;
        self.transport.flush();
    }
}

fn new_timer(
    kind: TimerKind,
    duration: Option<Duration>,
    handle: &Handle,
    mailbox: &mpsc::UnboundedSender<ConnectionEvent>
) -> Option<ScheduledTimer>
{
    duration.map(|duration| {
        let mailbox = mailbox.clone();

        ScheduledTimer::new(duration, false, handle.clone(), move |generation| {
            if mailbox.unbounded_send(ConnectionEvent::TimerFired(kind, generation)).is_err() {
                trace!("{:?} timer fired after the connection went away", kind);
            }
        })
    })
}

fn start_timer(timer: &mut Option<ScheduledTimer>) {
    if let Some(ref mut timer) = *timer {
        if let Err(e) = timer.start() {
            warn!("Failed to start timer for {:?}: {:?}", timer.get_duration(), e);
        }
    }
}

fn cancel_timer(timer: &mut Option<ScheduledTimer>) {
    if let Some(ref mut timer) = *timer {
        timer.cancel();
    }
}
