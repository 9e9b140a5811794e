// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Pipe fixture for framing tests.

use std::os::unix::io::RawFd;

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

    /// Closes the write end, producing EOF on the read end.
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
