// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Wipe primitives and the `Wipe`/`WipeProbe` traits.

use core::sync::atomic::{Ordering, compiler_fence};

use subtle::ConstantTimeEq;

/// Zeroizes a single primitive value using a volatile write.
///
/// Valid for every type where all-zeros is a valid bit pattern (integers,
/// bool, floats, char). The volatile store ensures the compiler cannot
/// optimize the write away even when the value is dead afterwards.
///
/// # Example
///
/// ```
/// use parapet_zero::zeroize_primitive;
///
/// let mut len = 42usize;
/// zeroize_primitive(&mut len);
/// assert_eq!(len, 0);
/// ```
#[inline(always)]
pub fn zeroize_primitive<T>(val: &mut T) {
    unsafe {
        core::ptr::write_volatile(val, core::mem::zeroed());
    }
}

/// Bulk zeroization of a byte region.
///
/// Uses `write_bytes` (memset) followed by a volatile read so the optimizer
/// cannot remove the store. This is the fast path: the memset vectorizes,
/// and the single volatile read anchors it.
///
/// # Example
///
/// ```
/// use parapet_zero::wipe_slice;
///
/// let mut data = [0xFFu8; 64];
/// wipe_slice(&mut data);
/// assert!(data.iter().all(|&b| b == 0));
/// ```
#[inline(always)]
pub fn wipe_slice(slice: &mut [u8]) {
    if slice.is_empty() {
        return;
    }

    unsafe {
        core::ptr::write_bytes(slice.as_mut_ptr(), 0, slice.len());
        // Volatile read prevents the optimizer from removing the write_bytes.
        core::ptr::read_volatile(slice.as_ptr());
    }
    compiler_fence(Ordering::SeqCst);
}

/// Returns `true` if every byte of the slice is zero.
///
/// Runtime probe for destroy paths and tests; an empty slice is zeroized.
#[inline(always)]
pub fn is_slice_zeroized(slice: &[u8]) -> bool {
    slice.iter().all(|&b| b == 0)
}

/// Constant-time equality over byte slices.
///
/// Length mismatch returns `false` early (the length is not secret); the
/// content comparison itself never short-circuits.
#[inline(always)]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

/// Types that can wipe their sensitive contents in place.
pub trait Wipe {
    /// Overwrites all sensitive bytes with zero, unoptimizably.
    fn wipe(&mut self);
}

/// Types that can report whether their sensitive contents are zeroized.
///
/// Only meaningful after a [`Wipe::wipe`]; fresh values may legitimately
/// contain nonzero bytes.
pub trait WipeProbe {
    /// Returns `true` if all sensitive bytes read as zero.
    fn is_wiped(&self) -> bool;
}

impl Wipe for [u8] {
    #[inline(always)]
    fn wipe(&mut self) {
        wipe_slice(self);
    }
}

impl WipeProbe for [u8] {
    #[inline(always)]
    fn is_wiped(&self) -> bool {
        is_slice_zeroized(self)
    }
}

impl<const N: usize> Wipe for [u8; N] {
    #[inline(always)]
    fn wipe(&mut self) {
        wipe_slice(self);
    }
}

impl<const N: usize> WipeProbe for [u8; N] {
    #[inline(always)]
    fn is_wiped(&self) -> bool {
        is_slice_zeroized(self)
    }
}
