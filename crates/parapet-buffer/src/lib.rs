// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Page-aligned, mlocked buffers for passwords in transit.
//!
//! A [`SecretBuf`] is the only memory in this workspace allowed to hold a
//! plaintext password. It is allocated with `mmap` (page-aligned by
//! construction), locked against swap with `mlock`, excluded from core
//! dumps where the platform supports it, and volatile-zeroed before the
//! pages go back to the kernel.
//!
//! # Locking outcomes
//!
//! `mlock` failures are classified rather than treated uniformly:
//!
//! - `EPERM`/`ENOSYS`: the process is simply not allowed to lock memory.
//!   This degrades to a best-effort unlocked buffer — logged once, never
//!   fatal, because most unprivileged processes run under a zero
//!   `RLIMIT_MEMLOCK`.
//! - `EAGAIN`/`ENOMEM`: transient exhaustion; retried a bounded number of
//!   times, then fatal for the allocation.
//! - anything else: fatal for the allocation.
//!
//! # Example
//!
//! ```rust
//! use parapet_buffer::SecretBuf;
//!
//! let mut buf = SecretBuf::alloc(32)?;
//! buf.as_mut_slice()[..7].copy_from_slice(b"hunter2");
//!
//! // Dropping zeroes the pages before they are unmapped; an explicit
//! // wipe is available for earlier cleanup.
//! buf.zeroize();
//! assert!(buf.as_slice().iter().all(|&b| b == 0));
//! # Ok::<(), parapet_buffer::SecretBufError>(())
//! ```

#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod error;
mod secret_buf;

pub use error::SecretBufError;
pub use secret_buf::{LockState, SecretBuf};
