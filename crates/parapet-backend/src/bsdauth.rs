// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! BSD auth backend (OpenBSD): auth_userokay(3) under the auth group.

use std::ffi::CString;
use std::time::Duration;

use tracing::error;

use crate::backend::{CredentialBackend, Verdict};
use crate::error::BackendError;
use crate::user::passwd_entry;

unsafe extern "C" {
    fn auth_userokay(
        name: *mut libc::c_char,
        style: *mut libc::c_char,
        auth_type: *mut libc::c_char,
        password: *mut libc::c_char,
    ) -> libc::c_int;
}

/// Verifies through the BSD authentication framework.
///
/// `auth_userokay` needs the auth group, so the child switches its gid in
/// `child_init`; no further privilege is held while requests are served.
pub struct BsdAuthBackend {
    auth_type: String,
    username: Option<CString>,
    backoff: Duration,
}

impl BsdAuthBackend {
    /// Backend with the given auth type (the login.conf service class).
    pub fn new(auth_type: &str) -> Self {
        Self {
            auth_type: auth_type.to_owned(),
            username: None,
            backoff: Duration::from_secs(2),
        }
    }
}

impl CredentialBackend for BsdAuthBackend {
    fn child_init(&mut self) -> Result<(), BackendError> {
        let (name, _) = passwd_entry()?;
        self.username = Some(name);

        // auth_userokay requires setgid(auth).
        let grent = unsafe { libc::getgrnam(c"auth".as_ptr()) };
        if grent.is_null() {
            error!("failed to look up the auth group");
            return Err(BackendError::CredentialsUnavailable);
        }

        if unsafe { libc::setgid((*grent).gr_gid) } != 0 {
            error!("unable to switch to the auth group");
            return Err(BackendError::PrivilegeDrop);
        }

        Ok(())
    }

    fn verify(&mut self, password: &[u8]) -> Verdict {
        let Some(name) = &self.username else {
            return Verdict::Reject;
        };
        if password.contains(&0) {
            return Verdict::Reject;
        }
        let Ok(auth_type) = CString::new(self.auth_type.as_str()) else {
            return Verdict::Reject;
        };

        // auth_userokay wants a mutable C string and wipes it itself.
        let mut key = Vec::with_capacity(password.len() + 1);
        key.extend_from_slice(password);
        key.push(0);

        let ok = unsafe {
            auth_userokay(
                name.as_ptr() as *mut libc::c_char,
                std::ptr::null_mut(),
                auth_type.as_ptr() as *mut libc::c_char,
                key.as_mut_ptr() as *mut libc::c_char,
            )
        } != 0;

        parapet_zero::wipe_slice(&mut key);

        if ok { Verdict::Accept } else { Verdict::Reject }
    }

    fn failure_backoff(&self) -> Duration {
        self.backoff
    }
}
