// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! The channel seam between the state machine and the supervisor.

use std::os::unix::io::RawFd;

use parapet_buffer::SecretBuf;
use parapet_comm::{CommError, Supervisor};
use parapet_proto::Reply;

/// What the state machine needs from the parent half of the channel.
///
/// Production code plugs in [`Supervisor`]; tests plug in a recording
/// stub. Implementations must uphold the consumption contract: `submit`
/// zeroes the password buffer whether or not the write succeeded.
pub trait AuthChannel {
    /// Writes one request frame carrying `len` password bytes plus the
    /// trailing NUL already present in the buffer, then zeroes the buffer.
    fn submit(&mut self, password: &mut SecretBuf, len: usize) -> Result<(), CommError>;

    /// Consumes exactly one framed reply; only valid when
    /// [`reply_fd`](Self::reply_fd) was reported readable.
    fn poll_reply(&mut self) -> Result<Reply, CommError>;

    /// The descriptor the reactor watches for replies.
    fn reply_fd(&self) -> RawFd;
}

impl AuthChannel for Supervisor {
    fn submit(&mut self, password: &mut SecretBuf, len: usize) -> Result<(), CommError> {
        Supervisor::submit(self, password, len)
    }

    fn poll_reply(&mut self) -> Result<Reply, CommError> {
        Supervisor::poll_reply(self)
    }

    fn reply_fd(&self) -> RawFd {
        Supervisor::reply_fd(self)
    }
}
