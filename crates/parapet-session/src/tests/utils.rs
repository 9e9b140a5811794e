// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Recording stub channel for state machine tests.

use std::collections::VecDeque;
use std::os::unix::io::RawFd;

use parapet_buffer::SecretBuf;
use parapet_comm::CommError;
use parapet_proto::{FrameError, Reply};

use crate::channel::AuthChannel;

/// Records submissions, serves pre-queued replies.
pub struct StubChannel {
    pub submissions: Vec<Vec<u8>>,
    pub replies: VecDeque<Reply>,
    pub fail_submit: bool,
}

impl StubChannel {
    pub fn new() -> Self {
        Self {
            submissions: Vec::new(),
            replies: VecDeque::new(),
            fail_submit: false,
        }
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        let mut stub = Self::new();
        stub.replies = replies.into_iter().collect();
        stub
    }
}

impl AuthChannel for StubChannel {
    fn submit(&mut self, password: &mut SecretBuf, len: usize) -> Result<(), CommError> {
        self.submissions.push(password.as_slice()[..len].to_vec());

        // Uphold the consumption contract exactly like the supervisor.
        password.zeroize();

        if self.fail_submit {
            Err(CommError::Frame(FrameError::UnexpectedEof))
        } else {
            Ok(())
        }
    }

    fn poll_reply(&mut self) -> Result<Reply, CommError> {
        self.replies
            .pop_front()
            .ok_or(CommError::Frame(FrameError::UnexpectedEof))
    }

    fn reply_fd(&self) -> RawFd {
        -1
    }
}
