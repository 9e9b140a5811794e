// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Shadow-database backend: capture the hash while privileged, drop, crypt.

use std::ffi::{CStr, CString};
use std::time::Duration;

use libloading::Library;
use tracing::{debug, error};

use parapet_zero::{constant_time_eq, wipe_slice};

use crate::backend::{CredentialBackend, Verdict};
use crate::error::BackendError;
use crate::privileges::drop_privileges;
use crate::user::passwd_entry;

/// Sonames tried for `crypt(3)`, most specific first. Glibc keeps a
/// compatibility `crypt` too, so plain libc is the last resort.
const CRYPT_SONAMES: [&str; 3] = ["libcrypt.so.1", "libcrypt.so.2", "libc.so.6"];

type CryptFn = unsafe extern "C" fn(*const libc::c_char, *const libc::c_char) -> *mut libc::c_char;

/// Runtime-loaded `crypt(3)`, dlopened so the workspace never links
/// against libcrypt at build time.
pub(crate) struct CryptLib {
    lib: Library,
}

impl CryptLib {
    pub(crate) fn load() -> Result<Self, BackendError> {
        let mut last = None;

        for soname in CRYPT_SONAMES {
            match unsafe { Library::new(soname) } {
                Ok(lib) => {
                    if unsafe { lib.get::<CryptFn>(b"crypt\0") }.is_ok() {
                        return Ok(Self { lib });
                    }
                }
                Err(e) => last = Some(e),
            }
        }

        match last {
            Some(source) => Err(BackendError::LibraryLoad {
                library: "libcrypt.so.1",
                source,
            }),
            // Every candidate loaded but none exported crypt().
            None => Err(BackendError::Service("libcrypt exports no crypt symbol")),
        }
    }

    /// Runs the hash; `None` on crypt failure (invalid setting, locked
    /// account markers and the like).
    pub(crate) fn crypt(&self, key: &CStr, setting: &CStr) -> Option<Vec<u8>> {
        let func = unsafe { self.lib.get::<CryptFn>(b"crypt\0") }.ok()?;

        let out = unsafe { func(key.as_ptr(), setting.as_ptr()) };
        if out.is_null() {
            return None;
        }

        Some(unsafe { CStr::from_ptr(out) }.to_bytes().to_vec())
    }
}

/// Verifies against the invoking user's entry in the password/shadow
/// database.
///
/// `init` runs while the process may still be privileged (a setuid locker
/// reading /etc/shadow): it captures the hash, loads libcrypt and then
/// permanently drops privilege with the regain-must-fail check. The parent
/// wipes its copy of the hash right after the fork — only the child ever
/// compares against it.
pub struct ShadowBackend {
    hash: Vec<u8>,
    crypt: Option<CryptLib>,
    backoff: Duration,
}

impl ShadowBackend {
    /// Backend with the default 2 s post-failure backoff.
    pub fn new() -> Self {
        Self::with_backoff(Duration::from_secs(2))
    }

    /// Backend with a caller-chosen post-failure backoff.
    pub fn with_backoff(backoff: Duration) -> Self {
        Self {
            hash: Vec::new(),
            crypt: None,
            backoff,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_hash_for_tests(hash: Vec<u8>, crypt: CryptLib) -> Self {
        Self {
            hash,
            crypt: Some(crypt),
            backoff: Duration::ZERO,
        }
    }

    fn capture_hash() -> Result<Vec<u8>, BackendError> {
        let (name, mut hash) = passwd_entry()?;

        // "x" means the real hash lives in the shadow database, readable
        // only while we are still privileged.
        if hash == b"x" {
            wipe_slice(&mut hash);

            #[cfg(target_os = "linux")]
            {
                hash = shadow_entry(&name)?;
            }
            #[cfg(not(target_os = "linux"))]
            {
                return Err(BackendError::CredentialsUnavailable);
            }
        }

        debug!("prepared to authorize user {:?}", name);
        Ok(hash)
    }
}

impl Default for ShadowBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialBackend for ShadowBackend {
    fn init(&mut self) -> Result<(), BackendError> {
        self.hash = Self::capture_hash()?;
        self.crypt = Some(CryptLib::load()?);

        // Capture is done; nothing below this point runs privileged.
        drop_privileges()
    }

    fn after_fork_parent(&mut self) {
        // The hash is only the child's business.
        wipe_slice(&mut self.hash);
        self.hash.clear();
        self.crypt = None;
    }

    fn verify(&mut self, password: &[u8]) -> Verdict {
        let Some(crypt) = &self.crypt else {
            error!("verify called without a loaded libcrypt");
            return Verdict::Reject;
        };

        // A password with interior NULs cannot match a crypt hash.
        let Ok(key) = CString::new(password) else {
            return Verdict::Reject;
        };
        let Ok(setting) = CString::new(self.hash.clone()) else {
            return Verdict::Reject;
        };

        let result = crypt.crypt(&key, &setting);

        let mut key = key.into_bytes();
        wipe_slice(&mut key);
        let mut setting = setting.into_bytes();
        wipe_slice(&mut setting);

        match result {
            Some(out) => {
                if constant_time_eq(&out, &self.hash) {
                    Verdict::Accept
                } else {
                    Verdict::Reject
                }
            }
            None => {
                error!("crypt() failed");
                Verdict::Reject
            }
        }
    }

    fn failure_backoff(&self) -> Duration {
        self.backoff
    }
}

impl Drop for ShadowBackend {
    fn drop(&mut self) {
        wipe_slice(&mut self.hash);
    }
}

#[cfg(target_os = "linux")]
fn shadow_entry(name: &CStr) -> Result<Vec<u8>, BackendError> {
    let mut spwd: libc::spwd = unsafe { std::mem::zeroed() };
    let mut storage = vec![0u8; 1024];
    let mut result: *mut libc::spwd = std::ptr::null_mut();

    loop {
        let rc = unsafe {
            libc::getspnam_r(
                name.as_ptr(),
                &mut spwd,
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
            error!("failed to getspnam");
            return Err(BackendError::CredentialsUnavailable);
        }
        break;
    }

    Ok(unsafe { CStr::from_ptr(spwd.sp_pwdp) }.to_bytes().to_vec())
}
