// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! The client side of the unlock flow: typing buffer, state machine,
//! retry and idle-clearing behavior.
//!
//! A [`Session`] owns the [`Password`] being typed and the channel to the
//! verification child, and is driven entirely by reactor callbacks:
//! keystrokes mutate the password and (re)arm the idle timers, a submit
//! hands the buffer to the channel (zeroing it in the same step), and the
//! reply transitions the [`AuthState`] that the rendering layer consumes.
//!
//! Two invariants the rest of the system relies on live here:
//!
//! - at most one validation is ever in flight — submitting while
//!   [`AuthState::Validating`] is a refused no-op;
//! - the session never retains a submitted password, and the idle
//!   password-clear timer wipes an abandoned one.
//!
//! The channel is a trait seam ([`AuthChannel`]): production code plugs in
//! the forked supervisor, tests plug in a recording stub.

#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod channel;
mod config;
mod password;
mod session;

pub use channel::AuthChannel;
pub use config::{AuthConfig, ConfigError};
pub use password::{PASSWORD_CAPACITY, Password};
pub use session::{Activity, AuthState, Session};
