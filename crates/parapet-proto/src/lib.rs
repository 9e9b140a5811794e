// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Length-prefixed framing over the locker's two pipes.
//!
//! Both directions share one wire format: strings travel as
//! `[u64 size][size bytes]`, fixed-width scalars (booleans, reply tags)
//! travel bare. The size prefix is native-endian — both ends of a pipe are
//! the same process image on the same host.
//!
//! Three rules make the protocol safe to block on:
//!
//! - Transfers are exact. `EINTR` is retried; any other short read or
//!   write breaks the channel for good.
//! - A `size == 0` frame and a clean EOF at a frame boundary both decode
//!   as [`Empty`](read_str) — the normal shutdown signal, never an error
//!   and never an allocation.
//! - EOF *inside* a frame is [`FrameError::UnexpectedEof`]; there is no
//!   partial-frame recovery.
//!
//! Incoming string payloads are allocated through a caller-supplied
//! [`FrameAlloc`], so passwords land in mlocked [`SecretBuf`] pages while
//! non-secret status text lands in ordinary memory.
//!
//! [`SecretBuf`]: parapet_buffer::SecretBuf

#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod child;
mod error;
mod frame;
mod io;
mod reply;

pub use child::ChildChannel;
pub use error::FrameError;
pub use frame::{FrameAlloc, MAX_FRAME_LEN, PlainAlloc, SecretAlloc, read_bool, read_str, write_bool, write_str};
pub use io::{FullRead, read_full, write_full};
pub use reply::{Reply, read_reply, write_reply};
