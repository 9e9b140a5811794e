// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Supervisor - child lifecycle and the parent's half of the channel.

use std::os::unix::io::RawFd;

use tracing::{debug, error};

use parapet_backend::CredentialBackend;
use parapet_buffer::SecretBuf;
use parapet_proto::{ChildChannel, Reply, read_reply, write_str};

use crate::error::CommError;

/// Lifecycle of the verification child, as seen from the parent.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SupervisorState {
    /// Forked; no request has been written yet.
    Spawned,
    /// At least one request has crossed the channel.
    Running,
    /// Reaped with exit status 0 (clean EOF shutdown).
    ExitedClean,
    /// Reaped with any other status.
    ExitedError,
}

fn make_pipe() -> Result<[RawFd; 2], CommError> {
    let mut fds = [0 as libc::c_int; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        error!("failed to create pipe");
        return Err(CommError::Pipe(std::io::Error::last_os_error()));
    }

    Ok(fds)
}

fn close_fd(fd: RawFd) {
    unsafe { libc::close(fd) };
}

/// The child must not react to the parent's custom signal handling; the
/// parent repurposes SIGUSR1 as its external unlock request.
fn reset_child_signals() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = libc::SIG_IGN;
        libc::sigaction(libc::SIGUSR1, &sa, std::ptr::null_mut());
    }
}

/// A dying child must surface as `EPIPE` on the next write, not as a
/// fatal signal.
fn ignore_sigpipe() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = libc::SIG_IGN;
        libc::sigaction(libc::SIGPIPE, &sa, std::ptr::null_mut());
    }
}

/// Parent-side handle over the verification child.
///
/// Owns the write end of the request pipe and the read end of the reply
/// pipe; the mirror ends were closed right after the fork on each side.
#[derive(Debug)]
pub struct Supervisor {
    request_fd: RawFd,
    reply_fd: RawFd,
    child: libc::pid_t,
    state: SupervisorState,
}

impl Supervisor {
    /// Initializes the backend, forks the verification child and enters
    /// its request loop there — this call only returns in the parent.
    ///
    /// Child exit codes: 0 after a clean shutdown (EOF or zero-length
    /// frame on the request stream), 1 on any I/O, privilege or backend
    /// failure.
    pub fn spawn<B: CredentialBackend>(mut backend: B) -> Result<Self, CommError> {
        // Privileged capture, privilege-bit checks and library loading
        // happen before the processes split.
        backend.init()?;

        let [request_read, request_write] = make_pipe()?;
        let [reply_read, reply_write] = match make_pipe() {
            Ok(fds) => fds,
            Err(e) => {
                close_fd(request_read);
                close_fd(request_write);
                return Err(e);
            }
        };

        let pid = unsafe { libc::fork() };
        if pid < 0 {
            let err = std::io::Error::last_os_error();
            error!("failed to fork: {err}");
            close_fd(request_read);
            close_fd(request_write);
            close_fd(reply_read);
            close_fd(reply_write);
            return Err(CommError::Fork(err));
        }

        if pid == 0 {
            // Verification child: this branch never returns.
            reset_child_signals();
            close_fd(request_write);
            close_fd(reply_read);

            let mut chan = ChildChannel::from_raw(request_read, reply_write);
            let code = match backend.child_init().and_then(|_| backend.run(&mut chan)) {
                Ok(()) => 0,
                Err(e) => {
                    error!("verification child failed: {e}");
                    1
                }
            };

            // Run backend teardown (e.g. pam_end) before the process goes.
            drop(backend);
            std::process::exit(code);
        }

        // Parent.
        close_fd(request_read);
        close_fd(reply_write);
        ignore_sigpipe();
        backend.after_fork_parent();

        debug!("spawned verification child {pid}");

        Ok(Self {
            request_fd: request_write,
            reply_fd: reply_read,
            child: pid,
            state: SupervisorState::Spawned,
        })
    }

    /// The reply descriptor, for reactor registration. Readable exactly
    /// when one framed reply can be consumed with
    /// [`poll_reply`](Self::poll_reply).
    pub fn reply_fd(&self) -> RawFd {
        self.reply_fd
    }

    /// Where the child stands.
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Writes one request frame carrying `len` password bytes plus the
    /// trailing NUL already present in the buffer.
    ///
    /// Fire-and-forget: the password is zeroed whether or not the write
    /// succeeded — this handle never retains a submitted secret.
    pub fn submit(&mut self, password: &mut SecretBuf, len: usize) -> Result<(), CommError> {
        debug_assert!(len < password.len(), "no room for the NUL terminator");

        let size = (len + 1).min(password.len());
        let result = write_str(self.request_fd, &password.as_slice()[..size]);

        password.zeroize();
        self.state = SupervisorState::Running;

        result?;
        Ok(())
    }

    /// Consumes exactly one framed reply.
    ///
    /// Only call when the reactor marked [`reply_fd`](Self::reply_fd)
    /// readable; this read blocks otherwise.
    pub fn poll_reply(&mut self) -> Result<Reply, CommError> {
        Ok(read_reply(self.reply_fd)?)
    }

    /// Orderly shutdown: zero-length frame, EOF, reap.
    pub fn shutdown(mut self) -> Result<SupervisorState, CommError> {
        // The explicit zero frame lets the child exit cleanly even if it
        // never observes the EOF.
        let _ = write_str(self.request_fd, b"");
        close_fd(self.request_fd);
        self.request_fd = -1;

        let state = self.reap()?;
        Ok(state)
    }

    fn reap(&mut self) -> Result<SupervisorState, CommError> {
        if self.child < 0 {
            return Ok(self.state);
        }

        let mut status: libc::c_int = 0;
        let pid = loop {
            let rc = unsafe { libc::waitpid(self.child, &mut status, 0) };
            if rc >= 0 {
                break rc;
            }
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                error!("waitpid failed: {err}");
                return Err(CommError::Wait(err));
            }
        };
        debug_assert_eq!(pid, self.child);
        self.child = -1;

        self.state = if libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == 0 {
            SupervisorState::ExitedClean
        } else {
            error!("verification child exited uncleanly");
            SupervisorState::ExitedError
        };

        Ok(self.state)
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if self.request_fd >= 0 {
            close_fd(self.request_fd);
            self.request_fd = -1;
        }
        if self.reply_fd >= 0 {
            close_fd(self.reply_fd);
            self.reply_fd = -1;
        }
        // EOF on the request stream is the child's exit signal; reap it
        // so no zombie outlives the handle.
        let _ = self.reap();
    }
}
