// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! <p align="center"><em>Privilege-separated authentication engine for session lockers.</em></p>
//!
//! ---
//!
//! Parapet is the authentication core a screen locker sits on: a
//! supervisor process talks to an isolated credential-verification child
//! over a pair of pipes, passwords live in mlocked page-aligned memory
//! and are volatile-zeroed on every exit path, and a small poll(2)
//! reactor drives the client-side state machine.
//!
//! # Features
//!
//! - 🔐 **Privilege separation** — verification runs in a forked child;
//!   only a boolean ever crosses back
//! - 🧹 **Secret hygiene** — locked pages, unoptimizable zeroing, no
//!   copy of a submitted password survives
//! - 🧩 **Pluggable backends** — shadow, PAM, BSD auth, fingerprint
//!   behind one contract
//! - ⏱️ **Reactor-driven** — non-blocking parent, blocking child, no
//!   threads anywhere
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use parapet::backend::ShadowBackend;
//! use parapet::comm::Supervisor;
//! use parapet::event_loop::EventLoop;
//! use parapet::session::{AuthConfig, Session};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let supervisor = Supervisor::spawn(ShadowBackend::new())?;
//!     let mut session = Session::new(supervisor, AuthConfig::default())?;
//!
//!     let mut event_loop = EventLoop::new();
//!     let reply_fd = session.reply_fd();
//!     event_loop.add_fd(reply_fd, |session: &mut Session<Supervisor>, sched, _fd, _r| {
//!         let _ = session.handle_reply(sched);
//!     });
//!
//!     // Register input descriptors, then:
//!     event_loop.run_while(&mut session, |session| session.is_running())?;
//!
//!     if session.is_unlocked() {
//!         session.into_channel().shutdown()?;
//!     }
//!     Ok(())
//! }
//! ```

pub use parapet_backend as backend;
pub use parapet_buffer as buffer;
pub use parapet_comm as comm;
pub use parapet_loop as event_loop;
pub use parapet_proto as proto;
pub use parapet_session as session;
pub use parapet_zero as zero;
