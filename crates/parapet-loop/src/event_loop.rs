// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! EventLoop - poll(2) multiplexing and one-shot timers.

use std::cell::Cell;
use std::os::unix::io::RawFd;
use std::rc::Rc;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Errors from the poll loop itself.
#[derive(Debug, Error)]
pub enum LoopError {
    /// `poll()` failed with a non-`EINTR` errno.
    #[error("poll() failed")]
    Poll(#[source] std::io::Error),
}

/// What a descriptor reported on wake-up.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Readiness {
    /// Data is available for reading.
    pub readable: bool,
    /// The peer hung up.
    pub hangup: bool,
    /// The descriptor is in an error state.
    pub error: bool,
}

type FdCallback<T> = Box<dyn FnMut(&mut T, &mut Scheduler<T>, RawFd, Readiness)>;
type TimerCallback<T> = Box<dyn FnOnce(&mut T, &mut Scheduler<T>)>;

/// Cancellation token for a scheduled timer.
///
/// Cancelling marks the timer as a tombstone; the loop drops it on the
/// next pass without firing. Cancelling twice, or after the timer fired,
/// is a no-op.
#[derive(Debug, Clone)]
pub struct TimerHandle(Rc<Cell<bool>>);

impl TimerHandle {
    fn new() -> Self {
        Self(Rc::new(Cell::new(false)))
    }

    /// Prevents the timer from ever firing.
    pub fn cancel(&self) {
        self.0.set(true);
    }

    /// Whether [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

struct Timer<T> {
    deadline: Instant,
    cancelled: Rc<Cell<bool>>,
    callback: Option<TimerCallback<T>>,
}

struct FdEvent<T> {
    callback: FdCallback<T>,
}

/// Deferred scheduling surface handed to every callback.
///
/// Work queued here lands in the loop after the current dispatch pass, so
/// callbacks never alias the loop's own structures.
pub struct Scheduler<T> {
    added: Vec<Timer<T>>,
}

impl<T> Scheduler<T> {
    fn new() -> Self {
        Self { added: Vec::new() }
    }

    /// Schedules a one-shot timer `after` from now.
    pub fn add_timer(
        &mut self,
        after: Duration,
        callback: impl FnOnce(&mut T, &mut Scheduler<T>) + 'static,
    ) -> TimerHandle {
        let handle = TimerHandle::new();
        self.added.push(Timer {
            deadline: Instant::now() + after,
            cancelled: handle.0.clone(),
            callback: Some(Box::new(callback)),
        });
        handle
    }
}

/// A single-threaded readiness loop over `poll(2)`.
pub struct EventLoop<T> {
    fds: Vec<libc::pollfd>,
    fd_events: Vec<FdEvent<T>>,
    timers: Vec<Timer<T>>,
}

impl<T> Default for EventLoop<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventLoop<T> {
    /// An empty loop.
    pub fn new() -> Self {
        Self {
            fds: Vec::new(),
            fd_events: Vec::new(),
            timers: Vec::new(),
        }
    }

    /// Registers a descriptor for read-readiness.
    pub fn add_fd(
        &mut self,
        fd: RawFd,
        callback: impl FnMut(&mut T, &mut Scheduler<T>, RawFd, Readiness) + 'static,
    ) {
        self.fds.push(libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        });
        self.fd_events.push(FdEvent {
            callback: Box::new(callback),
        });
    }

    /// Unregisters a descriptor. Returns `false` when it was not
    /// registered.
    pub fn remove_fd(&mut self, fd: RawFd) -> bool {
        let Some(index) = self.fds.iter().position(|pfd| pfd.fd == fd) else {
            return false;
        };

        self.fds.remove(index);
        self.fd_events.remove(index);
        true
    }

    /// Schedules a one-shot timer directly on the loop (outside any
    /// callback).
    pub fn add_timer(
        &mut self,
        after: Duration,
        callback: impl FnOnce(&mut T, &mut Scheduler<T>) + 'static,
    ) -> TimerHandle {
        let handle = TimerHandle::new();
        self.timers.push(Timer {
            deadline: Instant::now() + after,
            cancelled: handle.0.clone(),
            callback: Some(Box::new(callback)),
        });
        handle
    }

    /// Milliseconds until the nearest live timer; `-1` (block forever)
    /// with no timers pending.
    fn next_timeout_ms(&self) -> libc::c_int {
        let now = Instant::now();
        let mut timeout: Option<u128> = None;

        for timer in &self.timers {
            if timer.cancelled.get() {
                continue;
            }
            let ms = timer.deadline.saturating_duration_since(now).as_millis();
            timeout = Some(timeout.map_or(ms, |t| t.min(ms)));
        }

        match timeout {
            Some(ms) => ms.min(libc::c_int::MAX as u128) as libc::c_int,
            None => -1,
        }
    }

    /// One poll-and-dispatch pass: waits for readiness or the nearest
    /// timer deadline, then dispatches descriptors and expired timers.
    pub fn poll_once(&mut self, data: &mut T) -> Result<(), LoopError> {
        let timeout = self.next_timeout_ms();

        let ret = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as libc::nfds_t,
                timeout,
            )
        };
        if ret < 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(LoopError::Poll(err));
            }
            // Interrupted before anything became ready; revents is stale.
            return Ok(());
        }

        let mut sched = Scheduler::new();

        // Dispatch descriptors. Hang-up and error are always delivered so
        // callers can observe a dying peer.
        for index in 0..self.fds.len() {
            let pfd = self.fds[index];
            let interest = pfd.events | libc::POLLHUP | libc::POLLERR;

            if pfd.revents & interest != 0 {
                let readiness = Readiness {
                    readable: pfd.revents & libc::POLLIN != 0,
                    hangup: pfd.revents & libc::POLLHUP != 0,
                    error: pfd.revents & libc::POLLERR != 0,
                };
                (self.fd_events[index].callback)(data, &mut sched, pfd.fd, readiness);
            }
        }

        // Dispatch timers: tombstones are dropped, expired ones fire once.
        let now = Instant::now();
        for timer in &mut self.timers {
            if timer.cancelled.get() {
                timer.callback = None;
                continue;
            }
            if timer.deadline <= now {
                if let Some(callback) = timer.callback.take() {
                    callback(data, &mut sched);
                }
            }
        }
        self.timers.retain(|timer| timer.callback.is_some());

        // Apply work queued during dispatch.
        self.timers.append(&mut sched.added);

        Ok(())
    }

    /// Runs `f` with a [`Scheduler`], then applies whatever it queued.
    ///
    /// This is how code outside a callback (initial setup, input feeding)
    /// invokes operations that want to (re)schedule timers.
    pub fn dispatch<R>(
        &mut self,
        data: &mut T,
        f: impl FnOnce(&mut T, &mut Scheduler<T>) -> R,
    ) -> R {
        let mut sched = Scheduler::new();
        let result = f(data, &mut sched);
        self.timers.append(&mut sched.added);
        result
    }

    /// Polls until `running` returns `false`.
    pub fn run_while(
        &mut self,
        data: &mut T,
        mut running: impl FnMut(&T) -> bool,
    ) -> Result<(), LoopError> {
        while running(data) {
            self.poll_once(data)?;
        }

        Ok(())
    }
}
