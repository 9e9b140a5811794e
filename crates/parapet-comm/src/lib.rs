// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Fork-based supervisor for the credential verification child.
//!
//! [`Supervisor::spawn`] runs the backend's privileged setup, creates the
//! request and reply pipes, forks, and hands the child over to the
//! backend's blocking request loop — the child never returns from that
//! call. The parent keeps a handle exposing only what the reactor side
//! needs: the pollable reply descriptor, [`submit`](Supervisor::submit),
//! [`poll_reply`](Supervisor::poll_reply) and an orderly
//! [`shutdown`](Supervisor::shutdown).
//!
//! The channel is created once and never re-created. At most one request
//! may be outstanding; the authentication state machine upstream enforces
//! that. Transport failures in either direction are fatal to the pair —
//! there is no partial-frame recovery.

#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod error;
mod supervisor;

pub use error::CommError;
pub use supervisor::{Supervisor, SupervisorState};
