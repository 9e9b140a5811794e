// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Session - the authentication state machine.

use tracing::{debug, error};

use parapet_buffer::SecretBufError;
use parapet_comm::CommError;
use parapet_loop::{EventLoop, Scheduler, TimerHandle};
use parapet_proto::Reply;

use crate::channel::AuthChannel;
use crate::config::AuthConfig;
use crate::password::Password;

/// Indicator state consumed by the rendering layer.
///
/// `Validating` additionally gates the channel: while it is set, no new
/// submission and no input mutation is accepted.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AuthState {
    /// Nothing pending; transient states decay to this.
    Idle,
    /// Pre-authentication unlock window.
    Grace,
    /// A key added a character.
    Input,
    /// Backspace removed a character.
    Backspace,
    /// A key (modifier) did nothing.
    NoOpInput,
    /// The buffer was cleared (escape, backspace on empty, auto-clear).
    Cleared,
    /// Exactly one request is in flight.
    Validating,
    /// The last validation failed; transient display state.
    Invalid,
}

impl AuthState {
    /// Display states that decay to [`Idle`](Self::Idle) when the
    /// indicator timer fires.
    fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Input | Self::Backspace | Self::NoOpInput | Self::Cleared | Self::Invalid
        )
    }
}

/// Grace-qualifying interaction kinds.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Activity {
    /// Any key event. Always unlocks during grace.
    Key,
    /// Pointer motion or button; can be opted out via config.
    Pointer,
    /// Touch; can be opted out via config.
    Touch,
}

/// The client-side unlock flow over a channel `C`.
///
/// Every operation that reacts to input reschedules the indicator-clear
/// and password-clear timers; the reply handler drives the retry
/// counter. Rendering reads [`auth_state`](Self::auth_state),
/// [`failed_attempts`](Self::failed_attempts) and
/// [`password_len`](Self::password_len) — never the password itself.
pub struct Session<C> {
    channel: C,
    password: Password,
    cfg: AuthConfig,
    auth_state: AuthState,
    failed_attempts: u32,
    last_status: Option<String>,
    unlocked: bool,
    fatal: bool,
    clear_indicator_timer: Option<TimerHandle>,
    clear_password_timer: Option<TimerHandle>,
    grace_timer: Option<TimerHandle>,
}

impl<C: AuthChannel + 'static> Session<C> {
    /// A fresh session over `channel`. Starts in [`AuthState::Grace`]
    /// when a grace period is configured, [`AuthState::Idle`] otherwise.
    pub fn new(channel: C, cfg: AuthConfig) -> Result<Self, SecretBufError> {
        let auth_state = if cfg.grace_period().is_some() {
            AuthState::Grace
        } else {
            AuthState::Idle
        };

        Ok(Self {
            channel,
            password: Password::new()?,
            cfg,
            auth_state,
            failed_attempts: 0,
            last_status: None,
            unlocked: false,
            fatal: false,
            clear_indicator_timer: None,
            clear_password_timer: None,
            grace_timer: None,
        })
    }

    // =========================================================================
    // Values exposed to the rendering layer
    // =========================================================================

    /// Current indicator state.
    pub fn auth_state(&self) -> AuthState {
        self.auth_state
    }

    /// Rejected attempts so far.
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Byte length of the password being typed (never its content).
    pub fn password_len(&self) -> usize {
        self.password.len()
    }

    /// Last status line a continuous backend reported.
    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    /// Whether authentication succeeded.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Whether the session should keep running: not unlocked and the
    /// channel is still alive.
    pub fn is_running(&self) -> bool {
        !self.unlocked && !self.fatal
    }

    /// The channel's reply descriptor, for reactor registration.
    pub fn reply_fd(&self) -> std::os::unix::io::RawFd {
        self.channel.reply_fd()
    }

    /// Consumes the session, handing the channel back (e.g. for an
    /// orderly supervisor shutdown once unlocked).
    pub fn into_channel(self) -> C {
        self.channel
    }

    // =========================================================================
    // Input operations
    // =========================================================================

    /// A printable key added `ch`.
    pub fn handle_character(&mut self, sched: &mut Scheduler<Self>, ch: char) {
        if self.grace_unlock() {
            return;
        }
        if self.auth_state == AuthState::Validating {
            return;
        }

        // A character that does not fit is rejected silently; the
        // indicator still reacts.
        self.password.append(ch);
        self.auth_state = AuthState::Input;
        self.schedule_indicator_clear(sched);
        self.schedule_password_clear(sched);
    }

    /// Backspace: one character, not one byte.
    pub fn handle_backspace(&mut self, sched: &mut Scheduler<Self>) {
        if self.grace_unlock() {
            return;
        }
        if self.auth_state == AuthState::Validating {
            return;
        }

        self.auth_state = if self.password.backspace() {
            AuthState::Backspace
        } else {
            AuthState::Cleared
        };
        self.schedule_indicator_clear(sched);
        self.schedule_password_clear(sched);
    }

    /// Escape-style clear: wipe everything typed so far.
    pub fn handle_clear(&mut self, sched: &mut Scheduler<Self>) {
        if self.grace_unlock() {
            return;
        }
        if self.auth_state == AuthState::Validating {
            return;
        }

        self.password.clear();
        self.auth_state = AuthState::Cleared;
        self.schedule_indicator_clear(sched);
    }

    /// A key that produced no input (modifiers, layout switches).
    pub fn handle_noop_input(&mut self, sched: &mut Scheduler<Self>) {
        if self.grace_unlock() {
            return;
        }
        if self.auth_state == AuthState::Validating {
            return;
        }

        self.auth_state = AuthState::NoOpInput;
        self.schedule_indicator_clear(sched);
        self.schedule_password_clear(sched);
    }

    /// Submits the typed password.
    ///
    /// Refused — no frame written, state unchanged — while a validation
    /// is already in flight, and when the password is empty under the
    /// `ignore_empty` policy. Otherwise the password moves to the channel
    /// and is zeroed locally in the same step.
    pub fn handle_submit(&mut self, sched: &mut Scheduler<Self>) {
        if self.grace_unlock() {
            return;
        }
        if self.auth_state == AuthState::Validating {
            return;
        }
        if self.cfg.ignore_empty && self.password.is_empty() {
            return;
        }

        self.auth_state = AuthState::Validating;

        if let Err(e) = self.password.submit_via(&mut self.channel) {
            // Allocation or transport trouble surfaces as a failed
            // attempt; the reply handler decides about fatality when the
            // reactor reports the fd.
            error!("failed to submit password: {e}");
            self.auth_state = AuthState::Invalid;
            self.schedule_indicator_clear(sched);
        }
    }

    /// Pointer/touch/key during the grace window.
    pub fn handle_activity(&mut self, kind: Activity) {
        if self.auth_state != AuthState::Grace {
            return;
        }

        let qualifies = match kind {
            Activity::Key => true,
            Activity::Pointer => !self.cfg.grace_no_pointer,
            Activity::Touch => !self.cfg.grace_no_touch,
        };

        if qualifies {
            debug!("grace-period activity, unlocking");
            self.unlock();
        }
    }

    // =========================================================================
    // Channel events
    // =========================================================================

    /// Consumes one reply; call when the reactor marks
    /// [`reply_fd`](Self::reply_fd) readable.
    pub fn handle_reply(&mut self, sched: &mut Scheduler<Self>) -> Result<(), CommError> {
        match self.channel.poll_reply() {
            Ok(Reply::Verdict(true)) => {
                debug!("authentication succeeded");
                self.unlock();
                Ok(())
            }
            Ok(Reply::Verdict(false)) => {
                self.auth_state = AuthState::Invalid;
                self.failed_attempts += 1;
                self.schedule_indicator_clear(sched);
                Ok(())
            }
            Ok(Reply::Status(text)) => {
                debug!("backend status: {text}");
                self.last_status = Some(text);
                Ok(())
            }
            Err(e) => {
                // Transport death is fatal to the pair; stop the loop.
                error!("reply channel failed: {e}");
                self.fatal = true;
                Err(e)
            }
        }
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Arms the grace-period end timer. No-op without a configured grace
    /// window.
    pub fn arm_grace_timer(&mut self, event_loop: &mut EventLoop<Self>) {
        let Some(period) = self.cfg.grace_period() else {
            return;
        };

        let handle = event_loop.add_timer(period, |session: &mut Self, _sched| {
            session.grace_timer = None;
            if session.auth_state == AuthState::Grace {
                session.auth_state = AuthState::Idle;
            }
        });
        self.grace_timer = Some(handle);
    }

    fn schedule_indicator_clear(&mut self, sched: &mut Scheduler<Self>) {
        if let Some(timer) = self.clear_indicator_timer.take() {
            timer.cancel();
        }

        let handle = sched.add_timer(self.cfg.indicator_clear(), |session: &mut Self, _sched| {
            session.clear_indicator_timer = None;
            if session.auth_state.is_transient() {
                session.auth_state = AuthState::Idle;
            }
        });
        self.clear_indicator_timer = Some(handle);
    }

    fn schedule_password_clear(&mut self, sched: &mut Scheduler<Self>) {
        if let Some(timer) = self.clear_password_timer.take() {
            timer.cancel();
        }

        let handle = sched.add_timer(self.cfg.password_clear(), |session: &mut Self, sched| {
            session.clear_password_timer = None;
            session.password.clear();
            session.auth_state = AuthState::Cleared;
            session.schedule_indicator_clear(sched);
        });
        self.clear_password_timer = Some(handle);
    }

    fn cancel_timers(&mut self) {
        for timer in [
            self.clear_indicator_timer.take(),
            self.clear_password_timer.take(),
            self.grace_timer.take(),
        ]
        .into_iter()
        .flatten()
        {
            timer.cancel();
        }
    }

    fn unlock(&mut self) {
        self.unlocked = true;
        self.password.clear();
        self.cancel_timers();
    }

    /// During grace, any qualifying key unlocks without touching the
    /// channel. Returns whether that happened.
    fn grace_unlock(&mut self) -> bool {
        if self.auth_state == AuthState::Grace {
            self.handle_activity(Activity::Key);
            return self.unlocked;
        }

        false
    }
}
