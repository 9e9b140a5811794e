// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! State machine scenarios: submit gating, replies, timers, grace.

use std::time::{Duration, Instant};

use parapet_loop::EventLoop;
use parapet_proto::Reply;

use crate::config::AuthConfig;
use crate::session::{Activity, AuthState, Session};
use crate::tests::utils::StubChannel;

type TestSession = Session<StubChannel>;
type TestLoop = EventLoop<TestSession>;

fn session_with(stub: StubChannel, cfg: AuthConfig) -> (TestLoop, TestSession) {
    let session = Session::new(stub, cfg).expect("Failed to new()");
    (EventLoop::new(), session)
}

fn type_str(event_loop: &mut TestLoop, session: &mut TestSession, text: &str) {
    for ch in text.chars() {
        event_loop.dispatch(session, |s, sched| s.handle_character(sched, ch));
    }
}

fn poll_until(
    event_loop: &mut TestLoop,
    session: &mut TestSession,
    mut done: impl FnMut(&TestSession) -> bool,
) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(session) {
        assert!(Instant::now() < deadline, "condition never became true");
        event_loop.poll_once(session).expect("Failed to poll_once()");
    }
}

/// Short decay windows so timer tests stay fast.
fn quick_cfg() -> AuthConfig {
    AuthConfig {
        indicator_clear_ms: 5,
        password_clear_ms: 20,
        ..AuthConfig::default()
    }
}

// =============================================================================
// Submission and replies
// =============================================================================

#[test]
fn test_accepted_password_unlocks() {
    let stub = StubChannel::with_replies([Reply::Verdict(true)]);
    let (mut event_loop, mut session) = session_with(stub, AuthConfig::default());

    assert_eq!(session.auth_state(), AuthState::Idle);

    type_str(&mut event_loop, &mut session, "hunter2");
    event_loop.dispatch(&mut session, |s, sched| s.handle_submit(sched));

    assert_eq!(session.auth_state(), AuthState::Validating);
    assert_eq!(session.password_len(), 0);

    event_loop
        .dispatch(&mut session, |s, sched| s.handle_reply(sched))
        .expect("Failed to handle_reply()");

    assert!(session.is_unlocked());
    assert!(!session.is_running());

    let stub = session.into_channel();
    assert_eq!(stub.submissions, vec![b"hunter2".to_vec()]);
}

#[test]
fn test_rejected_password_counts_and_schedules_decay() {
    let stub = StubChannel::with_replies([Reply::Verdict(false)]);
    let (mut event_loop, mut session) = session_with(stub, AuthConfig::default());

    type_str(&mut event_loop, &mut session, "wrong");
    event_loop.dispatch(&mut session, |s, sched| s.handle_submit(sched));

    assert_eq!(session.failed_attempts(), 0);

    event_loop
        .dispatch(&mut session, |s, sched| s.handle_reply(sched))
        .expect("Failed to handle_reply()");

    assert_eq!(session.auth_state(), AuthState::Invalid);
    assert_eq!(session.failed_attempts(), 1);
    assert!(session.is_running());
}

#[test]
fn test_second_submit_while_validating_is_refused() {
    let stub = StubChannel::new();
    let (mut event_loop, mut session) = session_with(stub, AuthConfig::default());

    type_str(&mut event_loop, &mut session, "hunter2");
    event_loop.dispatch(&mut session, |s, sched| s.handle_submit(sched));
    assert_eq!(session.auth_state(), AuthState::Validating);

    // Refused: no second frame, state unchanged.
    event_loop.dispatch(&mut session, |s, sched| s.handle_submit(sched));

    assert_eq!(session.auth_state(), AuthState::Validating);
    assert_eq!(session.into_channel().submissions.len(), 1);
}

#[test]
fn test_input_is_ignored_while_validating() {
    let stub = StubChannel::new();
    let (mut event_loop, mut session) = session_with(stub, AuthConfig::default());

    type_str(&mut event_loop, &mut session, "hunter2");
    event_loop.dispatch(&mut session, |s, sched| s.handle_submit(sched));

    type_str(&mut event_loop, &mut session, "extra");
    event_loop.dispatch(&mut session, |s, sched| s.handle_backspace(sched));

    assert_eq!(session.password_len(), 0);
    assert_eq!(session.auth_state(), AuthState::Validating);
}

#[test]
fn test_empty_submit_is_ignored_under_policy() {
    let cfg = AuthConfig {
        ignore_empty: true,
        ..AuthConfig::default()
    };
    let (mut event_loop, mut session) = session_with(StubChannel::new(), cfg);

    event_loop.dispatch(&mut session, |s, sched| s.handle_submit(sched));

    assert_eq!(session.auth_state(), AuthState::Idle);
    assert!(session.into_channel().submissions.is_empty());
}

#[test]
fn test_failed_submit_write_maps_to_invalid() {
    let mut stub = StubChannel::new();
    stub.fail_submit = true;
    let (mut event_loop, mut session) = session_with(stub, AuthConfig::default());

    type_str(&mut event_loop, &mut session, "hunter2");
    event_loop.dispatch(&mut session, |s, sched| s.handle_submit(sched));

    // Surfaced as a failed attempt, not a crash; the password was still
    // consumed by the channel.
    assert_eq!(session.auth_state(), AuthState::Invalid);
    assert_eq!(session.password_len(), 0);
}

#[test]
fn test_status_reply_is_surfaced_not_counted() {
    let stub = StubChannel::with_replies([
        Reply::Status("place your finger on the reader".to_owned()),
        Reply::Verdict(true),
    ]);
    let (mut event_loop, mut session) = session_with(stub, AuthConfig::default());

    event_loop
        .dispatch(&mut session, |s, sched| s.handle_reply(sched))
        .expect("Failed to handle_reply()");

    assert_eq!(session.last_status(), Some("place your finger on the reader"));
    assert_eq!(session.failed_attempts(), 0);

    event_loop
        .dispatch(&mut session, |s, sched| s.handle_reply(sched))
        .expect("Failed to handle_reply()");

    assert!(session.is_unlocked());
}

#[test]
fn test_broken_reply_channel_is_fatal() {
    // No queued replies: poll_reply reports a dead channel.
    let (mut event_loop, mut session) = session_with(StubChannel::new(), AuthConfig::default());

    let result = event_loop.dispatch(&mut session, |s, sched| s.handle_reply(sched));

    assert!(result.is_err());
    assert!(!session.is_running());
    assert!(!session.is_unlocked());
}

// =============================================================================
// Input states and decay timers
// =============================================================================

#[test]
fn test_typing_sets_input_then_decays_to_idle() {
    let (mut event_loop, mut session) = session_with(StubChannel::new(), quick_cfg());

    type_str(&mut event_loop, &mut session, "a");
    assert_eq!(session.auth_state(), AuthState::Input);

    poll_until(&mut event_loop, &mut session, |s| {
        s.auth_state() == AuthState::Idle
    });
}

#[test]
fn test_idle_password_is_wiped_by_the_clear_timer() {
    let (mut event_loop, mut session) = session_with(StubChannel::new(), quick_cfg());

    type_str(&mut event_loop, &mut session, "hunter2");
    assert_eq!(session.password_len(), 7);

    poll_until(&mut event_loop, &mut session, |s| {
        s.auth_state() == AuthState::Cleared
    });

    assert_eq!(session.password_len(), 0);

    // The wipe schedules its own indicator decay back to idle.
    poll_until(&mut event_loop, &mut session, |s| {
        s.auth_state() == AuthState::Idle
    });
}

#[test]
fn test_backspace_states() {
    let (mut event_loop, mut session) = session_with(StubChannel::new(), AuthConfig::default());

    type_str(&mut event_loop, &mut session, "ab");
    event_loop.dispatch(&mut session, |s, sched| s.handle_backspace(sched));
    assert_eq!(session.auth_state(), AuthState::Backspace);
    assert_eq!(session.password_len(), 1);

    event_loop.dispatch(&mut session, |s, sched| s.handle_backspace(sched));
    event_loop.dispatch(&mut session, |s, sched| s.handle_backspace(sched));
    assert_eq!(session.auth_state(), AuthState::Cleared);
}

#[test]
fn test_clear_and_noop_states() {
    let (mut event_loop, mut session) = session_with(StubChannel::new(), AuthConfig::default());

    type_str(&mut event_loop, &mut session, "abc");
    event_loop.dispatch(&mut session, |s, sched| s.handle_clear(sched));
    assert_eq!(session.auth_state(), AuthState::Cleared);
    assert_eq!(session.password_len(), 0);

    event_loop.dispatch(&mut session, |s, sched| s.handle_noop_input(sched));
    assert_eq!(session.auth_state(), AuthState::NoOpInput);
}

// =============================================================================
// Grace period
// =============================================================================

fn grace_cfg() -> AuthConfig {
    AuthConfig {
        grace_period_ms: 30,
        grace_no_pointer: false,
        grace_no_touch: true,
        ..AuthConfig::default()
    }
}

#[test]
fn test_grace_key_unlocks_without_a_submission() {
    let (mut event_loop, mut session) = session_with(StubChannel::new(), grace_cfg());

    assert_eq!(session.auth_state(), AuthState::Grace);
    session.arm_grace_timer(&mut event_loop);

    event_loop.dispatch(&mut session, |s, sched| s.handle_character(sched, 'x'));

    assert!(session.is_unlocked());
    // The channel was never contacted.
    assert!(session.into_channel().submissions.is_empty());
}

#[test]
fn test_grace_pointer_respects_config() {
    let (mut event_loop, mut session) = session_with(StubChannel::new(), grace_cfg());
    session.arm_grace_timer(&mut event_loop);

    // Touch is opted out, pointer is not.
    session.handle_activity(Activity::Touch);
    assert!(!session.is_unlocked());

    session.handle_activity(Activity::Pointer);
    assert!(session.is_unlocked());
}

#[test]
fn test_grace_window_expires_to_idle() {
    let (mut event_loop, mut session) = session_with(StubChannel::new(), grace_cfg());
    session.arm_grace_timer(&mut event_loop);

    poll_until(&mut event_loop, &mut session, |s| {
        s.auth_state() == AuthState::Idle
    });

    // Too late: activity no longer unlocks.
    session.handle_activity(Activity::Key);
    assert!(!session.is_unlocked());
}
