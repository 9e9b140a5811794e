// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for parapet-proto.
use thiserror::Error;

use parapet_buffer::SecretBufError;

/// Errors that break a framed channel.
///
/// Every variant except `Alloc` is a transport error and is fatal to the
/// process pair; `Alloc` is fatal to the channel but surfaced to the
/// submitting side as a failed attempt.
#[derive(Debug, Error)]
pub enum FrameError {
    /// `read()` failed with a non-`EINTR` errno.
    #[error("read() failed")]
    Read(#[source] std::io::Error),

    /// `write()` failed with a non-`EINTR` errno.
    #[error("write() failed")]
    Write(#[source] std::io::Error),

    /// The stream ended inside a frame whose size was already declared.
    #[error("read() failed: unexpected EOF")]
    UnexpectedEof,

    /// A declared frame size exceeds [`MAX_FRAME_LEN`](crate::MAX_FRAME_LEN).
    #[error("oversized frame ({0} bytes)")]
    Oversized(u64),

    /// The payload allocation failed.
    #[error("frame allocation failed")]
    Alloc(#[from] SecretBufError),

    /// A reply frame carried a tag this protocol version does not know.
    #[error("unknown reply tag {0}")]
    UnknownTag(u8),
}
