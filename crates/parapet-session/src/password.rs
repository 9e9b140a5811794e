// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Password - the fixed-capacity typing buffer over locked memory.

use parapet_buffer::{SecretBuf, SecretBufError};
use parapet_comm::CommError;
use parapet_zero::wipe_slice;

use crate::channel::AuthChannel;

/// Fixed capacity of the typing buffer, trailing NUL included.
pub const PASSWORD_CAPACITY: usize = 1024;

/// The password being typed, owned exclusively by the state machine
/// until submission.
///
/// Bytes beyond `len` are always zero — appends write into zeroed space,
/// backspace and clear wipe what they remove, and the final byte is
/// reserved so a NUL terminator always follows the content.
pub struct Password {
    buf: SecretBuf,
    len: usize,
}

impl Password {
    /// An empty buffer in freshly locked pages.
    pub fn new() -> Result<Self, SecretBufError> {
        Ok(Self {
            buf: SecretBuf::alloc(PASSWORD_CAPACITY)?,
            len: 0,
        })
    }

    /// Content length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been typed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends one character, UTF-8 encoded.
    ///
    /// A character that would not fit (leaving room for the NUL) is
    /// silently rejected as a whole — no truncation, no partial encoding.
    /// Returns whether the character was taken.
    pub fn append(&mut self, ch: char) -> bool {
        let encoded = ch.len_utf8();
        if self.len + encoded + 1 > PASSWORD_CAPACITY {
            return false;
        }

        ch.encode_utf8(&mut self.buf.as_mut_slice()[self.len..self.len + encoded]);
        self.len += encoded;
        true
    }

    /// Removes exactly one character (not one byte), wiping the bytes it
    /// occupied. Returns `false` when the buffer was already empty.
    pub fn backspace(&mut self) -> bool {
        if self.len == 0 {
            return false;
        }

        // Rewind over the continuation bytes to the char boundary.
        let slice = self.buf.as_mut_slice();
        let mut start = self.len - 1;
        while start > 0 && slice[start] & 0xC0 == 0x80 {
            start -= 1;
        }

        wipe_slice(&mut slice[start..self.len]);
        self.len = start;
        true
    }

    /// Wipes the whole buffer.
    pub fn clear(&mut self) {
        self.buf.zeroize();
        self.len = 0;
    }

    /// Hands the content (with its trailing NUL) to the channel.
    ///
    /// The channel zeroes the buffer whether or not the write succeeds;
    /// the length is forgotten in the same step, so no copy survives here.
    pub fn submit_via<C: AuthChannel>(&mut self, channel: &mut C) -> Result<(), CommError> {
        let len = self.len;
        self.len = 0;
        channel.submit(&mut self.buf, len)
    }
}

#[cfg(test)]
impl Password {
    /// Raw view of the whole buffer, for invariant checks only.
    pub(crate) fn raw_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }
}

impl core::fmt::Debug for Password {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Never the content.
        f.debug_struct("Password").field("len", &self.len).finish_non_exhaustive()
    }
}
