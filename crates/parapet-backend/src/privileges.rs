// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Privilege transitions shared by the backends.

use tracing::error;

use crate::error::BackendError;

/// Permanently drops to the invoking user's real uid/gid.
///
/// The drop is verified: immediately afterwards, regaining either id must
/// fail. If it does not, the drop did not actually happen and continuing
/// would hand the per-request loop elevated rights — that is fatal before
/// any secret is touched.
pub fn drop_privileges() -> Result<(), BackendError> {
    unsafe {
        if libc::setgid(libc::getgid()) != 0 {
            error!("unable to drop group privileges");
            return Err(BackendError::PrivilegeDrop);
        }
        if libc::setuid(libc::getuid()) != 0 {
            error!("unable to drop user privileges");
            return Err(BackendError::PrivilegeDrop);
        }
        if libc::setuid(0) != -1 || libc::setgid(0) != -1 {
            error!("privilege drop did not stick: regain succeeded");
            return Err(BackendError::PrivilegeRegain);
        }
    }

    Ok(())
}

/// Refuses to proceed when the process carries elevated privilege bits.
///
/// Library-backed backends (PAM) have no business running setuid; the
/// system library is expected to do its own privilege dance.
pub fn require_no_elevation() -> Result<(), BackendError> {
    let elevated = unsafe {
        libc::getuid() != libc::geteuid() || libc::getgid() != libc::getegid()
    };

    if elevated {
        error!("refusing to start from a setuid/setgid binary");
        return Err(BackendError::Elevated);
    }

    Ok(())
}
