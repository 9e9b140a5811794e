// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Event loop dispatch and timer semantics.

use std::os::unix::io::RawFd;
use std::time::Duration;

use crate::event_loop::EventLoop;

#[derive(Default)]
struct Counters {
    fd_wakeups: usize,
    timer_fires: usize,
    bytes: Vec<u8>,
}

fn make_pipe() -> (RawFd, RawFd) {
    let mut fds = [0 as libc::c_int; 2];
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    assert_eq!(rc, 0, "pipe() failed");
    (fds[0], fds[1])
}

fn close_fd(fd: RawFd) {
    unsafe { libc::close(fd) };
}

// =============================================================================
// fd dispatch
// =============================================================================

#[test]
fn test_readable_fd_dispatches_callback() {
    let (read_fd, write_fd) = make_pipe();
    let mut event_loop = EventLoop::<Counters>::new();
    let mut counters = Counters::default();

    event_loop.add_fd(read_fd, |state: &mut Counters, _sched, fd, readiness| {
        assert!(readiness.readable);
        state.fd_wakeups += 1;

        let mut byte = [0u8; 1];
        let n = unsafe { libc::read(fd, byte.as_mut_ptr() as *mut libc::c_void, 1) };
        assert_eq!(n, 1);
        state.bytes.push(byte[0]);
    });

    let n = unsafe { libc::write(write_fd, b"x".as_ptr() as *const libc::c_void, 1) };
    assert_eq!(n, 1);

    event_loop.poll_once(&mut counters).expect("Failed to poll_once()");

    assert_eq!(counters.fd_wakeups, 1);
    assert_eq!(counters.bytes, b"x");

    close_fd(read_fd);
    close_fd(write_fd);
}

#[test]
fn test_hangup_is_delivered() {
    let (read_fd, write_fd) = make_pipe();
    let mut event_loop = EventLoop::<Counters>::new();
    let mut counters = Counters::default();

    event_loop.add_fd(read_fd, |state: &mut Counters, _sched, _fd, readiness| {
        assert!(readiness.hangup);
        state.fd_wakeups += 1;
    });

    close_fd(write_fd);

    event_loop.poll_once(&mut counters).expect("Failed to poll_once()");

    assert_eq!(counters.fd_wakeups, 1);

    close_fd(read_fd);
}

#[test]
fn test_remove_fd_stops_dispatch() {
    let (read_fd, write_fd) = make_pipe();
    let mut event_loop = EventLoop::<Counters>::new();
    let mut counters = Counters::default();

    event_loop.add_fd(read_fd, |state: &mut Counters, _sched, _fd, _readiness| {
        state.fd_wakeups += 1;
    });

    assert!(event_loop.remove_fd(read_fd));
    assert!(!event_loop.remove_fd(read_fd));

    let n = unsafe { libc::write(write_fd, b"x".as_ptr() as *const libc::c_void, 1) };
    assert_eq!(n, 1);

    // A zero-delay timer bounds the poll.
    event_loop.add_timer(Duration::ZERO, |_state, _sched| {});
    event_loop.poll_once(&mut counters).expect("Failed to poll_once()");

    assert_eq!(counters.fd_wakeups, 0);

    close_fd(read_fd);
    close_fd(write_fd);
}

// =============================================================================
// timers
// =============================================================================

#[test]
fn test_timer_fires_exactly_once() {
    let mut event_loop = EventLoop::<Counters>::new();
    let mut counters = Counters::default();

    event_loop.add_timer(Duration::ZERO, |state: &mut Counters, _sched| {
        state.timer_fires += 1;
    });

    event_loop.poll_once(&mut counters).expect("Failed to poll_once()");
    // Second pass: nothing left to fire, bound it with another timer.
    event_loop.add_timer(Duration::ZERO, |_state, _sched| {});
    event_loop.poll_once(&mut counters).expect("Failed to poll_once()");

    assert_eq!(counters.timer_fires, 1);
}

#[test]
fn test_cancelled_timer_never_fires() {
    let mut event_loop = EventLoop::<Counters>::new();
    let mut counters = Counters::default();

    let handle = event_loop.add_timer(Duration::ZERO, |state: &mut Counters, _sched| {
        state.timer_fires += 1;
    });
    handle.cancel();

    event_loop.add_timer(Duration::ZERO, |_state, _sched| {});
    event_loop.poll_once(&mut counters).expect("Failed to poll_once()");

    assert_eq!(counters.timer_fires, 0);
    assert!(handle.is_cancelled());
}

#[test]
fn test_timer_rescheduled_from_callback_fires_later() {
    let mut event_loop = EventLoop::<Counters>::new();
    let mut counters = Counters::default();

    event_loop.add_timer(Duration::ZERO, |state: &mut Counters, sched| {
        state.timer_fires += 1;
        sched.add_timer(Duration::ZERO, |state: &mut Counters, _sched| {
            state.timer_fires += 1;
        });
    });

    event_loop.poll_once(&mut counters).expect("Failed to poll_once()");
    assert_eq!(counters.timer_fires, 1);

    event_loop.poll_once(&mut counters).expect("Failed to poll_once()");
    assert_eq!(counters.timer_fires, 2);
}

#[test]
fn test_timer_waits_for_its_deadline() {
    let mut event_loop = EventLoop::<Counters>::new();
    let mut counters = Counters::default();

    let start = std::time::Instant::now();
    event_loop.add_timer(Duration::from_millis(30), |state: &mut Counters, _sched| {
        state.timer_fires += 1;
    });

    while counters.timer_fires == 0 {
        event_loop.poll_once(&mut counters).expect("Failed to poll_once()");
    }

    assert!(start.elapsed() >= Duration::from_millis(25));
}

// =============================================================================
// run_while()
// =============================================================================

#[test]
fn test_run_while_stops_when_predicate_flips() {
    let mut event_loop = EventLoop::<Counters>::new();
    let mut counters = Counters::default();

    event_loop.add_timer(Duration::ZERO, |state: &mut Counters, _sched| {
        state.timer_fires += 1;
    });

    event_loop
        .run_while(&mut counters, |state| state.timer_fires == 0)
        .expect("Failed to run_while()");

    assert_eq!(counters.timer_fires, 1);
}
