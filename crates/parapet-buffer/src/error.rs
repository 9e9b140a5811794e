// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for parapet-buffer.
use thiserror::Error;

/// Errors from secret buffer syscalls.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum SecretBufError {
    /// A zero-sized allocation was requested.
    #[error("zero-sized secret allocation")]
    ZeroSized,

    /// `mmap` failed; the system is out of address space or memory.
    #[error("mmap failed")]
    OutOfMemory,

    /// `mlock` kept failing after bounded retries, or failed with an
    /// errno that does not permit degrading to an unlocked buffer.
    #[error("mlock failed")]
    LockFailed,
}
