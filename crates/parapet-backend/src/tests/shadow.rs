// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Shadow backend verification tests. Skipped when no libcrypt can be
//! dlopened at runtime.

use std::ffi::CString;

use serial_test::serial;

use crate::backend::{CredentialBackend, Verdict};
use crate::shadow::{CryptLib, ShadowBackend};

fn hash_of(password: &str) -> Option<(Vec<u8>, CryptLib)> {
    let crypt = CryptLib::load().ok()?;

    let key = CString::new(password).expect("test password contains NUL");
    let setting = CString::new("$6$parapettest$").expect("static setting");
    let hash = crypt.crypt(&key, &setting)?;

    // Some crypts hand back error markers instead of NULL.
    if hash.len() < 13 {
        return None;
    }

    Some((hash, crypt))
}

#[test]
#[serial(crypt)]
fn test_verify_accepts_matching_password() {
    let Some((hash, crypt)) = hash_of("hunter2") else {
        eprintln!("no usable libcrypt, skipping");
        return;
    };

    let mut backend = ShadowBackend::with_hash_for_tests(hash, crypt);

    assert_eq!(backend.verify(b"hunter2"), Verdict::Accept);
}

#[test]
#[serial(crypt)]
fn test_verify_rejects_wrong_password() {
    let Some((hash, crypt)) = hash_of("hunter2") else {
        eprintln!("no usable libcrypt, skipping");
        return;
    };

    let mut backend = ShadowBackend::with_hash_for_tests(hash, crypt);

    assert_eq!(backend.verify(b"wrong"), Verdict::Reject);
}

#[test]
#[serial(crypt)]
fn test_verify_rejects_interior_nul() {
    let Some((hash, crypt)) = hash_of("hunter2") else {
        eprintln!("no usable libcrypt, skipping");
        return;
    };

    let mut backend = ShadowBackend::with_hash_for_tests(hash, crypt);

    assert_eq!(backend.verify(b"hunter2\0trailer"), Verdict::Reject);
}

#[test]
#[serial(crypt)]
fn test_parent_side_wipe_clears_the_hash() {
    let Some((hash, crypt)) = hash_of("hunter2") else {
        eprintln!("no usable libcrypt, skipping");
        return;
    };

    let mut backend = ShadowBackend::with_hash_for_tests(hash, crypt);
    backend.after_fork_parent();

    // With the hash gone, nothing can match.
    assert_eq!(backend.verify(b"hunter2"), Verdict::Reject);
}
