// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for parapet-comm.
use thiserror::Error;

use parapet_backend::BackendError;
use parapet_proto::FrameError;

/// Failures establishing or using the channel to the child.
#[derive(Debug, Error)]
pub enum CommError {
    /// `pipe()` failed.
    #[error("failed to create pipe")]
    Pipe(#[source] std::io::Error),

    /// `fork()` failed.
    #[error("failed to fork")]
    Fork(#[source] std::io::Error),

    /// The backend refused to initialize (privilege preconditions,
    /// credential capture, library loading).
    #[error("backend initialization failed")]
    Backend(#[from] BackendError),

    /// A frame could not be moved across the channel; the pair is dead.
    #[error("channel failure")]
    Frame(#[from] FrameError),

    /// The child could not be reaped.
    #[error("failed to reap the verification child")]
    Wait(#[source] std::io::Error),
}
