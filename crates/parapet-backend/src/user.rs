// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Invoking-user lookup shared by the backends.

use std::ffi::{CStr, CString};

use tracing::error;

use crate::error::BackendError;

/// Resolves the real uid's passwd entry: `(login name, crypt hash field)`.
pub(crate) fn passwd_entry() -> Result<(CString, Vec<u8>), BackendError> {
    let uid = unsafe { libc::getuid() };
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut storage = vec![0u8; 1024];
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    loop {
        let rc = unsafe {
            libc::getpwuid_r(
                uid,
                &mut pwd,
                storage.as_mut_ptr() as *mut libc::c_char,
                storage.len(),
                &mut result,
            )
        };

        if rc == libc::ERANGE {
            let grown = storage.len() * 2;
            storage = vec![0u8; grown];
            continue;
        }
        if rc != 0 || result.is_null() {
            error!("failed to getpwuid");
            return Err(BackendError::UnknownUser);
        }
        break;
    }

    let name = unsafe { CStr::from_ptr(pwd.pw_name) }.to_owned();
    let hash = unsafe { CStr::from_ptr(pwd.pw_passwd) }.to_bytes().to_vec();

    Ok((name, hash))
}
