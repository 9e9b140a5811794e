// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for parapet-backend.
use thiserror::Error;

use parapet_proto::FrameError;

/// Fatal backend failures.
///
/// Everything here aborts the child (or refuses to start it). Wrong
/// passwords and flaky verification services are *not* errors — they are
/// [`Verdict::Reject`](crate::Verdict::Reject).
#[derive(Debug, Error)]
pub enum BackendError {
    /// The channel to the supervisor broke.
    #[error("channel failure")]
    Frame(#[from] FrameError),

    /// The invoking user has no passwd entry.
    #[error("failed to resolve the invoking user")]
    UnknownUser,

    /// The credential material could not be captured (e.g. no shadow
    /// entry, or not privileged enough to read it).
    #[error("credential database unavailable")]
    CredentialsUnavailable,

    /// A privilege transition syscall failed.
    #[error("unable to drop privileges")]
    PrivilegeDrop,

    /// Privileges could be regained after the drop; the drop did not
    /// actually happen.
    #[error("privilege drop did not stick (regain succeeded)")]
    PrivilegeRegain,

    /// The process runs with elevated privilege bits and the backend
    /// refuses to operate that way.
    #[error("process is setuid/setgid; refusing to start")]
    Elevated,

    /// A runtime library (libpam, libcrypt) could not be loaded.
    #[error("failed to load {library}")]
    LibraryLoad {
        /// The soname that was requested.
        library: &'static str,
        /// The loader's error.
        #[source]
        source: libloading::Error,
    },

    /// The authentication service could not be initialized at all
    /// (e.g. `pam_start` failed). Per-request service hiccups are
    /// rejections, not errors.
    #[error("authentication service unavailable: {0}")]
    Service(&'static str),
}
