// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! String and scalar frames, and the allocator seam for payload routing.

use std::os::unix::io::RawFd;

use parapet_buffer::SecretBuf;

use crate::error::FrameError;
use crate::io::{FullRead, read_full, write_full};

/// Upper bound on a declared string payload. Passwords are bounded at a
/// kilobyte and status lines are short; anything larger means the peer is
/// not speaking this protocol.
pub const MAX_FRAME_LEN: u64 = 64 * 1024;

/// Allocator seam for incoming string payloads.
///
/// Secret payloads route into [`SecretBuf`] via [`SecretAlloc`]; non-secret
/// text routes into ordinary memory via [`PlainAlloc`].
pub trait FrameAlloc {
    /// The buffer type produced for a payload.
    type Buf: AsRef<[u8]> + AsMut<[u8]>;

    /// Allocates a buffer for exactly `len` payload bytes. Never called
    /// with `len == 0`.
    fn alloc(&self, len: usize) -> Result<Self::Buf, FrameError>;
}

/// Routes payloads into mlocked, zero-on-release pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecretAlloc;

impl FrameAlloc for SecretAlloc {
    type Buf = SecretBuf;

    fn alloc(&self, len: usize) -> Result<SecretBuf, FrameError> {
        Ok(SecretBuf::alloc(len)?)
    }
}

/// Routes payloads into ordinary heap memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainAlloc;

impl FrameAlloc for PlainAlloc {
    type Buf = Vec<u8>;

    fn alloc(&self, len: usize) -> Result<Vec<u8>, FrameError> {
        Ok(vec![0u8; len])
    }
}

/// Writes a string frame: native-endian u64 size, then the payload, fully.
pub fn write_str(fd: RawFd, bytes: &[u8]) -> Result<(), FrameError> {
    let size = bytes.len() as u64;
    write_full(fd, &size.to_ne_bytes())?;
    write_full(fd, bytes)
}

/// Reads a string frame through the supplied allocator.
///
/// Returns `None` (Empty) on a clean EOF at the frame boundary and on an
/// explicit `size == 0` frame — in neither case is the allocator invoked.
/// A short read after a nonzero declared size breaks the channel.
pub fn read_str<A: FrameAlloc>(fd: RawFd, alloc: &A) -> Result<Option<A::Buf>, FrameError> {
    let mut header = [0u8; 8];
    if read_full(fd, &mut header)? == FullRead::Eof {
        return Ok(None);
    }

    let size = u64::from_ne_bytes(header);
    if size == 0 {
        return Ok(None);
    }
    if size > MAX_FRAME_LEN {
        return Err(FrameError::Oversized(size));
    }

    let mut buf = alloc.alloc(size as usize)?;
    if read_full(fd, buf.as_mut())? == FullRead::Eof {
        return Err(FrameError::UnexpectedEof);
    }

    Ok(Some(buf))
}

/// Writes a bare boolean scalar (one byte, no prefix).
pub fn write_bool(fd: RawFd, value: bool) -> Result<(), FrameError> {
    write_full(fd, &[value as u8])
}

/// Reads a bare boolean scalar. EOF here is mid-message: a boolean is only
/// expected when one is owed.
pub fn read_bool(fd: RawFd) -> Result<bool, FrameError> {
    let mut byte = [0u8; 1];
    if read_full(fd, &mut byte)? == FullRead::Eof {
        return Err(FrameError::UnexpectedEof);
    }

    Ok(byte[0] != 0)
}
