// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Exact-transfer read/write primitives over raw descriptors.

use std::os::unix::io::RawFd;

use tracing::error;

use crate::error::FrameError;

/// Outcome of a [`read_full`] call.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FullRead {
    /// The buffer was filled completely.
    Full,
    /// Clean EOF before the first byte; the peer closed the stream at a
    /// frame boundary.
    Eof,
}

/// Reads exactly `buf.len()` bytes, retrying on `EINTR`.
///
/// EOF at offset zero is a boundary condition the caller decides about;
/// EOF after the first byte is a broken frame.
pub fn read_full(fd: RawFd, buf: &mut [u8]) -> Result<FullRead, FrameError> {
    let mut offset = 0usize;

    while offset < buf.len() {
        let n = unsafe {
            libc::read(
                fd,
                buf[offset..].as_mut_ptr() as *mut libc::c_void,
                buf.len() - offset,
            )
        };

        if n < 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            error!("read() failed: {err}");
            return Err(FrameError::Read(err));
        }

        if n == 0 {
            if offset == 0 {
                return Ok(FullRead::Eof);
            }
            error!("read() failed: unexpected EOF");
            return Err(FrameError::UnexpectedEof);
        }

        offset += n as usize;
    }

    Ok(FullRead::Full)
}

/// Writes exactly `buf.len()` bytes, retrying on `EINTR`.
pub fn write_full(fd: RawFd, buf: &[u8]) -> Result<(), FrameError> {
    let mut offset = 0usize;

    while offset < buf.len() {
        let n = unsafe {
            libc::write(
                fd,
                buf[offset..].as_ptr() as *const libc::c_void,
                buf.len() - offset,
            )
        };

        if n <= 0 {
            let err = std::io::Error::last_os_error();
            if n < 0 && err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            error!("write() failed: {err}");
            return Err(FrameError::Write(err));
        }

        offset += n as usize;
    }

    Ok(())
}
