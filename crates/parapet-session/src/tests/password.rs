// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Typing buffer rules: UTF-8 appends, character-accurate backspace,
//! the bytes-beyond-len invariant.

use parapet_zero::is_slice_zeroized;

use crate::password::{PASSWORD_CAPACITY, Password};

fn tail_is_zero(password: &Password) {
    assert!(is_slice_zeroized(&password.raw_bytes()[password.len()..]));
}

// =============================================================================
// append()
// =============================================================================

#[test]
fn test_append_ascii() {
    let mut password = Password::new().expect("Failed to new()");

    for ch in "hunter2".chars() {
        assert!(password.append(ch));
    }

    assert_eq!(password.len(), 7);
    assert_eq!(&password.raw_bytes()[..7], b"hunter2");
    tail_is_zero(&password);
}

#[test]
fn test_append_multibyte() {
    let mut password = Password::new().expect("Failed to new()");

    assert!(password.append('€'));

    assert_eq!(password.len(), 3);
    assert_eq!(&password.raw_bytes()[..3], "€".as_bytes());
    tail_is_zero(&password);
}

#[test]
fn test_append_rejects_overflow_whole_character() {
    let mut password = Password::new().expect("Failed to new()");

    // Fill up to one byte short of the NUL reserve.
    for _ in 0..PASSWORD_CAPACITY - 2 {
        assert!(password.append('a'));
    }
    assert_eq!(password.len(), PASSWORD_CAPACITY - 2);

    // A 3-byte character cannot fit: rejected whole, no partial bytes.
    assert!(!password.append('€'));
    assert_eq!(password.len(), PASSWORD_CAPACITY - 2);
    tail_is_zero(&password);

    // A 1-byte character still fits.
    assert!(password.append('b'));
    assert_eq!(password.len(), PASSWORD_CAPACITY - 1);

    // And now nothing does — the final byte is the NUL reserve.
    assert!(!password.append('c'));
    assert_eq!(password.len(), PASSWORD_CAPACITY - 1);
}

// =============================================================================
// backspace()
// =============================================================================

#[test]
fn test_backspace_removes_one_character_not_one_byte() {
    let mut password = Password::new().expect("Failed to new()");

    password.append('a');
    password.append('€');
    assert_eq!(password.len(), 4);

    // U+20AC is 3 bytes; backspace rewinds all of them.
    assert!(password.backspace());
    assert_eq!(password.len(), 1);
    tail_is_zero(&password);

    assert!(password.backspace());
    assert_eq!(password.len(), 0);
    assert!(!password.backspace());
}

#[test]
fn test_backspace_restores_prior_state() {
    let mut password = Password::new().expect("Failed to new()");

    for ch in "ab".chars() {
        password.append(ch);
    }
    let before = password.len();

    password.append('€');
    password.backspace();

    assert_eq!(password.len(), before);
    assert_eq!(&password.raw_bytes()[..2], b"ab");
    tail_is_zero(&password);
}

// =============================================================================
// clear()
// =============================================================================

#[test]
fn test_clear_wipes_everything() {
    let mut password = Password::new().expect("Failed to new()");

    for ch in "hunter2".chars() {
        password.append(ch);
    }

    password.clear();

    assert_eq!(password.len(), 0);
    assert!(password.is_empty());
    assert!(is_slice_zeroized(password.raw_bytes()));
}
