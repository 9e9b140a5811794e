// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Volatile zeroization primitives for secret-bearing memory.
//!
//! Everything that touches a password in this workspace funnels its cleanup
//! through this crate. The guarantees are deliberately narrow:
//!
//! - [`zeroize_primitive`] overwrites a single primitive with a volatile
//!   store the compiler cannot elide.
//! - [`wipe_slice`] overwrites a byte region with `write_bytes` followed by
//!   a volatile read, which pins the memset in place while staying
//!   vectorizable.
//! - [`is_slice_zeroized`] is the runtime probe used by destroy paths and
//!   tests to verify that a wipe actually happened.
//! - [`constant_time_eq`] compares verifier outputs without leaking a
//!   position through timing.
//!
//! # Example
//!
//! ```rust
//! use parapet_zero::{is_slice_zeroized, wipe_slice};
//!
//! let mut secret = *b"hunter2";
//! wipe_slice(&mut secret);
//! assert!(is_slice_zeroized(&secret));
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod wipe;

pub use wipe::{Wipe, WipeProbe, constant_time_eq, is_slice_zeroized, wipe_slice, zeroize_primitive};
