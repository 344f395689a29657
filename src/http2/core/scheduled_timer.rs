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
use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

// futures
use futures::{Future, Stream};
use futures::unsync::oneshot;

// tokio
use tokio_core::reactor::{Handle, Interval, Timeout};

/// A cancellable callback which runs on the reactor that owns the connection.
///
/// The handler should not hold on to whatever owns the timer. Connection timers post an event to
/// the connection's mailbox instead, so a pending timer never keeps the connection alive.
///
/// Every start and cancel moves the timer to a new generation, and the handler is told which
/// generation it fired for. A firing which was queued somewhere before a cancel can then be
/// recognised with `is_current` and dropped.
///
/// The timer is not `Send`. It must only be used from the reactor thread it was created with.
pub struct ScheduledTimer {
    duration: Duration,
    repeating: bool,
    handle: Handle,
    handler: Rc<Fn(u64)>,
    generation: u64,
    scheduled: Option<Scheduled>
}

struct Scheduled {
    // Dropping the sender ends the spawned task.
    _cancel_tx: oneshot::Sender<()>,
    // Checked before every firing. Once the task has been spawned a tick may already be ready in
    // the same turn as the cancel, so dropping the task alone is not enough.
    live: Rc<Cell<bool>>
}

impl ScheduledTimer {
    pub fn new<F>(duration: Duration, repeating: bool, handle: Handle, handler: F) -> Self
        where F: Fn(u64) + 'static
    {
        ScheduledTimer {
            duration: duration,
            repeating: repeating,
            handle: handle,
            handler: Rc::new(handler),
            generation: 0,
            scheduled: None
        }
    }

    /// Arm the timer, replacing any firing which is already scheduled.
    pub fn start(&mut self) -> io::Result<()> {
        self.cancel();

        let ticks: Box<Stream<Item = (), Error = io::Error>> = if self.repeating {
            Box::new(Interval::new(self.duration, &self.handle)?)
        }
        else {
            Box::new(Timeout::new(self.duration, &self.handle)?.into_stream())
        };

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let live = Rc::new(Cell::new(true));

        let task_live = live.clone();
        let handler = self.handler.clone();
        let repeating = self.repeating;
        let duration = self.duration;
        let generation = self.generation;

        let firing = ticks
            .map_err(move |e| {
                warn!("Timer for {:?} failed, it will not fire: {:?}", duration, e);
            })
            .for_each(move |_| {
                if !task_live.get() {
                    return Err(());
                }

                if !repeating {
                    task_live.set(false);
                }

                handler(generation);
                Ok(())
            });

        self.handle.spawn(
            firing
                .select(cancel_rx.map_err(|_| ()))
                .then(|_| -> Result<(), ()> { Ok(()) })
        );

        self.scheduled = Some(Scheduled {
            _cancel_tx: cancel_tx,
            live: live
        });

        Ok(())
    }

    /// Safe to call whether or not the timer is armed.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);

        if let Some(scheduled) = self.scheduled.take() {
            scheduled.live.set(false);
        }
    }

    /// Whether a firing for `generation` still belongs to the latest start.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn get_generation(&self) -> u64 {
        self.generation
    }

    pub fn is_armed(&self) -> bool {
        match self.scheduled {
            Some(ref scheduled) => scheduled.live.get(),
            None => false
        }
    }

    pub fn get_duration(&self) -> Duration {
        self.duration
    }
}

impl Drop for ScheduledTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use tokio_core::reactor::{Core, Timeout};

    use super::ScheduledTimer;

    fn wait(core: &mut Core, millis: u64) {
        let handle = core.handle();
        core.run(Timeout::new(Duration::from_millis(millis), &handle).unwrap()).unwrap();
    }

    fn counting_timer(core: &Core, millis: u64, repeating: bool) -> (ScheduledTimer, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let handler_count = count.clone();

        let timer = ScheduledTimer::new(Duration::from_millis(millis), repeating, core.handle(), move |_| {
            handler_count.set(handler_count.get() + 1);
        });

        (timer, count)
    }

    #[test]
    fn one_shot_fires_once() {
        let mut core = Core::new().unwrap();
        let (mut timer, count) = counting_timer(&core, 20, false);

        timer.start().unwrap();
        assert!(timer.is_armed());

        wait(&mut core, 120);

        assert_eq!(1, count.get());
        assert!(!timer.is_armed());
    }

    #[test]
    fn cancelled_timer_does_not_fire() {
        let mut core = Core::new().unwrap();
        let (mut timer, count) = counting_timer(&core, 20, false);

        timer.start().unwrap();
        timer.cancel();
        timer.cancel();

        wait(&mut core, 100);

        assert_eq!(0, count.get());
        assert!(!timer.is_armed());
    }

    #[test]
    fn cancel_unarmed_timer() {
        let core = Core::new().unwrap();
        let (mut timer, count) = counting_timer(&core, 20, false);

        timer.cancel();

        assert!(!timer.is_armed());
        assert_eq!(0, count.get());
    }

    #[test]
    fn restart_replaces_scheduled_firing() {
        let mut core = Core::new().unwrap();
        let (mut timer, count) = counting_timer(&core, 200, false);

        timer.start().unwrap();
        wait(&mut core, 100);
        timer.start().unwrap();
        wait(&mut core, 150);

        // The first firing would have been due by now.
        assert_eq!(0, count.get());

        wait(&mut core, 200);
        assert_eq!(1, count.get());
    }

    #[test]
    fn repeating_timer_rearms() {
        let mut core = Core::new().unwrap();
        let (mut timer, count) = counting_timer(&core, 20, true);

        timer.start().unwrap();
        wait(&mut core, 150);

        assert!(count.get() >= 3);
        assert!(timer.is_armed());

        timer.cancel();
        let fired = count.get();
        wait(&mut core, 80);
        assert_eq!(fired, count.get());
    }

    #[test]
    fn dropping_timer_cancels() {
        let mut core = Core::new().unwrap();
        let (mut timer, count) = counting_timer(&core, 20, false);

        timer.start().unwrap();
        drop(timer);

        wait(&mut core, 100);
        assert_eq!(0, count.get());
    }

    #[test]
    fn handler_is_told_its_generation() {
        let mut core = Core::new().unwrap();
        let fired = Rc::new(Cell::new(None));
        let handler_fired = fired.clone();

        let mut timer = ScheduledTimer::new(Duration::from_millis(20), false, core.handle(), move |generation| {
            handler_fired.set(Some(generation));
        });

        timer.start().unwrap();
        wait(&mut core, 100);

        let generation = fired.get().unwrap();
        assert!(timer.is_current(generation));
        assert_eq!(generation, timer.get_generation());
    }

    #[test]
    fn cancel_and_restart_retire_the_old_generation() {
        let core = Core::new().unwrap();
        let (mut timer, _) = counting_timer(&core, 60_000, false);

        timer.start().unwrap();
        let first = timer.get_generation();

        timer.cancel();
        assert!(!timer.is_current(first));

        timer.start().unwrap();
        let second = timer.get_generation();
        assert!(second != first);
        assert!(timer.is_current(second));

        timer.start().unwrap();
        assert!(!timer.is_current(second));
    }
}
