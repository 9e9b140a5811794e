// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! The backend contract and the default per-request child loop.

use std::time::Duration;

use tracing::debug;

use parapet_proto::ChildChannel;

use crate::error::BackendError;

/// Answer for one validation request.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Verdict {
    /// The password unlocks the session.
    Accept,
    /// It does not — or the backend could not tell, which is the same
    /// thing as far as the wire is concerned.
    Reject,
}

/// One credential verification strategy.
///
/// Lifecycle around the fork:
///
/// 1. [`init`](Self::init) — pre-fork, possibly privileged: capture
///    credential material, enforce privilege preconditions, load runtime
///    libraries. Failures abort before any secret is touched.
/// 2. [`after_fork_parent`](Self::after_fork_parent) — wipe captured
///    secrets from the parent's copy; they are the child's business only.
/// 3. [`child_init`](Self::child_init) — in the child: backend-specific
///    privilege transitions.
/// 4. [`run`](Self::run) — the child's blocking request loop. The default
///    implementation reads a request, calls [`verify`](Self::verify),
///    answers with the verdict and sleeps the configured backoff after
///    rejections. Continuous backends (fingerprint) override it entirely.
pub trait CredentialBackend {
    /// Pre-fork setup. Runs in the process that will become the parent.
    fn init(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Post-fork cleanup on the parent side.
    fn after_fork_parent(&mut self) {}

    /// Post-fork setup on the child side.
    fn child_init(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Checks one password. `password` excludes the wire NUL terminator.
    fn verify(&mut self, password: &[u8]) -> Verdict;

    /// Delay applied after a rejected attempt, before the next request is
    /// read. Throttles brute-forcing through the pipe.
    fn failure_backoff(&self) -> Duration {
        Duration::from_secs(2)
    }

    /// Whether the loop ends after the first accepted password. Backends
    /// with per-session service state (PAM) stop so requests queued behind
    /// a success are never processed.
    fn stop_after_success(&self) -> bool {
        false
    }

    /// The child's request loop. Returns `Ok` on clean shutdown (EOF or
    /// zero-length frame on the request stream).
    fn run(&mut self, chan: &mut ChildChannel) -> Result<(), BackendError> {
        loop {
            let Some(mut request) = chan.read_request()? else {
                debug!("request stream closed, shutting down");
                return Ok(());
            };

            // Split off the NUL the supervisor appended for C verifiers.
            // The password never leaves the locked buffer.
            let verdict = match request.as_slice().split_last() {
                Some((&0, password)) => self.verify(password),
                _ => Verdict::Reject,
            };
            request.destroy();

            chan.write_verdict(verdict == Verdict::Accept)?;

            match verdict {
                Verdict::Accept if self.stop_after_success() => {
                    debug!("authenticated, leaving the request loop");
                    return Ok(());
                }
                Verdict::Reject => {
                    let backoff = self.failure_backoff();
                    if !backoff.is_zero() {
                        std::thread::sleep(backoff);
                    }
                }
                Verdict::Accept => {}
            }
        }
    }
}
