// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Single-threaded poll(2) event loop with cancellable one-shot timers.
//!
//! The locker's parent process owns exactly one of these. It multiplexes
//! read-readiness over an arbitrary fd set and dispatches software timers
//! with millisecond resolution. The contract the rest of the workspace
//! leans on:
//!
//! - one thread, no callback ever runs concurrently with another;
//! - timers fire at most once and stay scheduled until they fire or are
//!   [cancelled](TimerHandle::cancel); cancelling a dead timer is a no-op;
//! - callbacks run to completion — anything they (re)schedule through the
//!   [`Scheduler`] is applied after the dispatch pass, never during it.
//!
//! Callbacks receive `(&mut T, &mut Scheduler<T>)` where `T` is whatever
//! state struct the caller threads through [`EventLoop::poll_once`].
//!
//! # Example
//!
//! ```rust
//! use parapet_loop::EventLoop;
//! use std::time::Duration;
//!
//! struct State { fired: bool }
//!
//! let mut event_loop = EventLoop::<State>::new();
//! let mut state = State { fired: false };
//!
//! event_loop.add_timer(Duration::ZERO, |state: &mut State, _sched| {
//!     state.fired = true;
//! });
//! event_loop.poll_once(&mut state).unwrap();
//!
//! assert!(state.fired);
//! ```

#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod event_loop;

pub use event_loop::{EventLoop, LoopError, Readiness, Scheduler, TimerHandle};
