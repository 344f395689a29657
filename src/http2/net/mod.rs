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

pub mod shutdown_signal;

// futures
use futures::{Async, Future, Poll, Stream};
use futures::sync::mpsc;
use futures::task;

// tokio
use tokio_core::reactor::Handle;

// ebb
use http2::frame::{Frame, StreamId};
use http2::error::HttpError;
use http2::core::connection_manager::{ConnectionManager, TimerKind};
use http2::core::shutdown_state::ConnectionPhase;
use shared::connection_settings::ConnectionSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseMode {
    /// Every stream has finished after the second GOAWAY.
    Graceful,
    /// Close everything now, whatever is still in flight.
    Abrupt
}

/// The connection's frame sink.
///
/// Writes are buffered until `flush`. Frames read from the client are handed back through
/// `fire_frame_read` once the connection manager has looked at them.
pub trait Transport {
    fn write_frame(&mut self, frame: Frame);

    fn flush(&mut self);

    fn close(&mut self, mode: CloseMode);

    fn fire_frame_read(&mut self, frame: Frame);
}

/// Everything which can happen to a connection.
///
/// A read burst is any number of `FrameRead` events followed by `ReadComplete`. The transport
/// must send `Inactive` once it has actually closed.
#[derive(Debug)]
pub enum ConnectionEvent {
    Active,
    StreamCreated(StreamId),
    StreamClosed(StreamId),
    FrameRead(Frame),
    ReadComplete,
    Quiesce,
    Inactive,
    Error(HttpError),
    /// Posted by a connection timer along with the generation it was started in.
    TimerFired(TimerKind, u64)
}

/// Create a connection task and the handle used to talk to it.
///
/// The task must be spawned on the reactor behind `handle`, the connection's timers run there.
pub fn new_connection<T>(settings: &ConnectionSettings, transport: T, handle: &Handle) -> (ConnectionTask<T>, ConnectionHandle)
    where T: Transport
{
    let (mailbox_tx, mailbox_rx) = mpsc::unbounded();

    let manager = ConnectionManager::new(settings, transport, handle, &mailbox_tx);

    let task = ConnectionTask {
        manager: manager,
        mailbox: mailbox_rx
    };

    (task, ConnectionHandle { mailbox: mailbox_tx })
}

/// Owns the connection manager and feeds it events, one burst per poll.
///
/// Completes once the transport has reported the connection inactive. If every handle goes away
/// first the connection is closed abruptly, because nothing could ever finish it otherwise.
pub struct ConnectionTask<T: Transport> {
    manager: ConnectionManager<T>,
    mailbox: mpsc::UnboundedReceiver<ConnectionEvent>
}

impl<T: Transport> Future for ConnectionTask<T> {
    type Item = ();
    type Error = ();

    fn poll(&mut self) -> Poll<(), ()> {
        // Deferred work from the previous burst. Anything written during that burst has had a
        // turn of the reactor to reach the socket.
        self.manager.run_deferred();

        loop {
            match self.mailbox.poll() {
                Ok(Async::Ready(Some(event))) => {
                    self.manager.handle_event(event);

                    if self.manager.get_phase() == ConnectionPhase::Closed {
                        debug!("Connection closed, task finished");
                        return Ok(Async::Ready(()));
                    }
                },
                Ok(Async::Ready(None)) => {
                    debug!("Every handle to the connection has gone, task finished");
                    self.manager.abandon();
                    return Ok(Async::Ready(()));
                },
                Ok(Async::NotReady) => {
                    break;
                },
                Err(()) => {
                    // An unbounded receiver never errors.
                    return Err(());
                }
            }
        }

        if self.manager.has_deferred() {
            task::current().notify();
        }

        Ok(Async::NotReady)
    }
}

/// Sends events to a connection task from anywhere, including other threads.
///
/// This is the only way into a connection. Events are queued and handled on the connection's
/// own reactor. Each method yields false if the connection has already gone.
#[derive(Clone)]
pub struct ConnectionHandle {
    mailbox: mpsc::UnboundedSender<ConnectionEvent>
}

impl ConnectionHandle {
    pub fn send(&self, event: ConnectionEvent) -> bool {
        match self.mailbox.unbounded_send(event) {
            Ok(_) => true,
            Err(_) => {
                debug!("Attempted to send an event but the connection has already shut down");
                false
            }
        }
    }

    pub fn active(&self) -> bool {
        self.send(ConnectionEvent::Active)
    }

    pub fn stream_created(&self, stream_id: StreamId) -> bool {
        self.send(ConnectionEvent::StreamCreated(stream_id))
    }

    pub fn stream_closed(&self, stream_id: StreamId) -> bool {
        self.send(ConnectionEvent::StreamClosed(stream_id))
    }

    pub fn frame_read(&self, frame: Frame) -> bool {
        self.send(ConnectionEvent::FrameRead(frame))
    }

    pub fn read_complete(&self) -> bool {
        self.send(ConnectionEvent::ReadComplete)
    }

    pub fn quiesce(&self) -> bool {
        self.send(ConnectionEvent::Quiesce)
    }

    pub fn inactive(&self) -> bool {
        self.send(ConnectionEvent::Inactive)
    }

    pub fn error(&self, err: HttpError) -> bool {
        self.send(ConnectionEvent::Error(err))
    }
}
