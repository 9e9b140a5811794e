// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Fixtures: pipes and a scripted backend.

use std::os::unix::io::RawFd;
use std::time::Duration;

use crate::backend::{CredentialBackend, Verdict};

/// One unidirectional pipe; both ends closed on drop.
pub struct TestPipe {
    read_fd: RawFd,
    write_fd: RawFd,
}

impl TestPipe {
    pub fn new() -> Self {
        let mut fds = [0 as libc::c_int; 2];
        let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
        assert_eq!(rc, 0, "pipe() failed");

        Self {
            read_fd: fds[0],
            write_fd: fds[1],
        }
    }

    pub fn read_fd(&self) -> RawFd {
        self.read_fd
    }

    pub fn write_fd(&self) -> RawFd {
        self.write_fd
    }

    pub fn close_write(&mut self) {
        if self.write_fd >= 0 {
            unsafe { libc::close(self.write_fd) };
            self.write_fd = -1;
        }
    }
}

impl Drop for TestPipe {
    fn drop(&mut self) {
        if self.read_fd >= 0 {
            unsafe { libc::close(self.read_fd) };
        }
        self.close_write();
    }
}

/// Accepts exactly one password, records what it saw.
pub struct ScriptedBackend {
    pub expected: Vec<u8>,
    pub seen: Vec<Vec<u8>>,
    pub stop_after_success: bool,
}

impl ScriptedBackend {
    pub fn accepting(expected: &[u8]) -> Self {
        Self {
            expected: expected.to_vec(),
            seen: Vec::new(),
            stop_after_success: false,
        }
    }
}

impl CredentialBackend for ScriptedBackend {
    fn verify(&mut self, password: &[u8]) -> Verdict {
        self.seen.push(password.to_vec());
        if password == self.expected.as_slice() {
            Verdict::Accept
        } else {
            Verdict::Reject
        }
    }

    fn failure_backoff(&self) -> Duration {
        Duration::ZERO
    }

    fn stop_after_success(&self) -> bool {
        self.stop_after_success
    }
}
