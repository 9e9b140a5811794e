// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! SecretBuf - mmap'd, mlocked allocation for plaintext secrets.

use core::ptr;

use tracing::warn;

use parapet_zero::{Wipe, WipeProbe, wipe_slice};

use crate::error::SecretBufError;

/// How many times a transient `mlock` failure is retried before giving up.
const MLOCK_RETRIES: u32 = 5;

/// Outcome of the lock attempt for one allocation.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LockState {
    /// Pages are locked; `munlock` is required on release.
    Locked,
    /// The platform refused (`EPERM`/`ENOSYS`); best effort, unlocked.
    Unsupported,
}

/// What to do about one `mlock` errno. Internal classification table.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum LockVerdict {
    Retry,
    Degrade,
    Fatal,
}

#[inline]
pub(crate) fn classify_mlock_errno(errno: i32) -> LockVerdict {
    match errno {
        libc::EAGAIN | libc::ENOMEM => LockVerdict::Retry,
        libc::EPERM | libc::ENOSYS => LockVerdict::Degrade,
        _ => LockVerdict::Fatal,
    }
}

/// A page-aligned, swap-locked allocation holding exactly `len` secret bytes.
///
/// The mapping covers whole pages; only the first `len` bytes are exposed.
/// Release order is fixed: volatile wipe, `munlock` (iff locked), `munmap`.
pub struct SecretBuf {
    ptr: *mut u8,
    len: usize,
    mapped: usize,
    lock: LockState,
}

// Safety: SecretBuf has exactly one owner; the raw pointer is never aliased
// outside &self/&mut self access.
unsafe impl Send for SecretBuf {}

impl SecretBuf {
    fn page_size() -> usize {
        unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
    }

    /// Allocates `len` bytes of page-aligned, zero-filled, swap-locked memory.
    ///
    /// See the crate docs for the lock failure classification.
    pub fn alloc(len: usize) -> Result<Self, SecretBufError> {
        if len == 0 {
            return Err(SecretBufError::ZeroSized);
        }

        let page = Self::page_size();
        let mapped = len.div_ceil(page) * page;

        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                mapped,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(SecretBufError::OutOfMemory);
        }

        let ptr = ptr as *mut u8;

        let lock = match Self::lock_pages(ptr, mapped) {
            Ok(lock) => lock,
            Err(e) => {
                unsafe { libc::munmap(ptr as *mut libc::c_void, mapped) };
                return Err(e);
            }
        };

        // Locked pages must also stay out of core dumps.
        #[cfg(target_os = "linux")]
        unsafe {
            libc::madvise(ptr as *mut libc::c_void, mapped, libc::MADV_DONTDUMP);
        }

        Ok(Self {
            ptr,
            len,
            mapped,
            lock,
        })
    }

    fn lock_pages(ptr: *mut u8, mapped: usize) -> Result<LockState, SecretBufError> {
        let mut retries = MLOCK_RETRIES;

        loop {
            if unsafe { libc::mlock(ptr as *const libc::c_void, mapped) } == 0 {
                return Ok(LockState::Locked);
            }

            let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
            match classify_mlock_errno(errno) {
                LockVerdict::Retry => {
                    retries -= 1;
                    if retries == 0 {
                        warn!("mlock() supported but failed too often");
                        return Err(SecretBufError::LockFailed);
                    }
                }
                LockVerdict::Degrade => {
                    warn!(errno, "unable to mlock() secret memory, continuing unlocked");
                    return Ok(LockState::Unsupported);
                }
                LockVerdict::Fatal => {
                    warn!(errno, "unable to mlock() secret memory");
                    return Err(SecretBufError::LockFailed);
                }
            }
        }
    }

    /// The requested length in bytes.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer holds zero requested bytes. Never true
    /// for a live allocation; present for slice-like completeness.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the pages are actually locked against swap.
    #[inline(always)]
    pub fn lock_state(&self) -> LockState {
        self.lock
    }

    /// The first `len` bytes of the mapping; empty once destroyed.
    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        if self.ptr.is_null() {
            return &[];
        }

        unsafe { core::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Mutable view of the first `len` bytes of the mapping.
    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        if self.ptr.is_null() {
            return &mut [];
        }

        unsafe { core::slice::from_raw_parts_mut(self.ptr, self.len) }
    }

    /// Volatile wipe of the whole mapping, spare tail included.
    pub fn zeroize(&mut self) {
        if self.ptr.is_null() {
            return;
        }

        let whole = unsafe { core::slice::from_raw_parts_mut(self.ptr, self.mapped) };
        wipe_slice(whole);
    }

    /// Zero-then-release. Idempotent; also invoked from `Drop`.
    pub fn destroy(&mut self) {
        if self.ptr.is_null() {
            return;
        }

        self.zeroize();

        if self.lock == LockState::Locked {
            unsafe { libc::munlock(self.ptr as *const libc::c_void, self.mapped) };
        }

        unsafe { libc::munmap(self.ptr as *mut libc::c_void, self.mapped) };
        self.ptr = ptr::null_mut();
        self.len = 0;
        self.mapped = 0;
    }
}

impl Drop for SecretBuf {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl AsRef<[u8]> for SecretBuf {
    #[inline(always)]
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsMut<[u8]> for SecretBuf {
    #[inline(always)]
    fn as_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl Wipe for SecretBuf {
    #[inline(always)]
    fn wipe(&mut self) {
        self.zeroize();
    }
}

impl WipeProbe for SecretBuf {
    fn is_wiped(&self) -> bool {
        if self.ptr.is_null() {
            return true;
        }

        let whole = unsafe { core::slice::from_raw_parts(self.ptr, self.mapped) };
        parapet_zero::is_slice_zeroized(whole)
    }
}

impl core::fmt::Debug for SecretBuf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SecretBuf")
            .field("len", &self.len)
            .field("lock", &self.lock)
            .finish_non_exhaustive()
    }
}
