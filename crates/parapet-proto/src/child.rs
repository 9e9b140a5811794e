// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! The child's blocking half of the channel.

use std::os::unix::io::RawFd;

use tracing::debug;

use parapet_buffer::SecretBuf;

use crate::error::FrameError;
use crate::frame::{SecretAlloc, read_str};
use crate::reply::{Reply, write_reply};

/// Blocking request/reply endpoints inside the verification child.
///
/// Holds the two descriptors that survive the post-fork close pass. The
/// channel never closes them itself — they live exactly as long as the
/// child process.
#[derive(Debug)]
pub struct ChildChannel {
    request_fd: RawFd,
    reply_fd: RawFd,
}

impl ChildChannel {
    /// Wraps the child's read end of the request pipe and write end of the
    /// reply pipe.
    pub fn from_raw(request_fd: RawFd, reply_fd: RawFd) -> Self {
        Self {
            request_fd,
            reply_fd,
        }
    }

    /// Blocks for the next password request.
    ///
    /// `None` is the shutdown signal (EOF or a zero-length frame). The
    /// payload arrives in an mlocked buffer and includes the trailing NUL
    /// the supervisor appends for C-library verifiers.
    pub fn read_request(&mut self) -> Result<Option<SecretBuf>, FrameError> {
        let buf = read_str(self.request_fd, &SecretAlloc)?;

        if buf.is_some() {
            debug!("received credential check request");
        }

        Ok(buf)
    }

    /// Writes the verdict for the oldest outstanding request.
    pub fn write_verdict(&mut self, success: bool) -> Result<(), FrameError> {
        write_reply(self.reply_fd, &Reply::Verdict(success))
    }

    /// Writes an informational status line (continuous backends only).
    pub fn write_status(&mut self, text: &str) -> Result<(), FrameError> {
        write_reply(self.reply_fd, &Reply::Status(text.to_owned()))
    }
}
