// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Pluggable credential verification for the locker's isolated child.
//!
//! A [`CredentialBackend`] answers exactly one question — does this
//! password unlock the invoking user's session — behind a contract that
//! hides where the answer comes from:
//!
//! - [`ShadowBackend`]: captures the crypt hash from the password database
//!   while still privileged, drops privilege irreversibly, compares with
//!   `crypt(3)` in constant time.
//! - [`PamBackend`]: full PAM conversation through a runtime-loaded
//!   `libpam.so.0`; refuses to run from a setuid binary.
//! - `BsdAuthBackend` (OpenBSD): `auth_userokay(3)` with the auth group.
//! - `FingerprintBackend` (feature `fingerprint`): fprintd over D-Bus; a
//!   continuous backend that never consumes passwords.
//!
//! Verification failures of any kind — wrong password, missing library,
//! absent hardware — are a [`Verdict::Reject`]. The reason stays in the
//! child's log; only the boolean crosses the wire.

#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod backend;
mod error;
mod pam;
mod privileges;
mod shadow;
mod user;

#[cfg(target_os = "openbsd")]
mod bsdauth;

#[cfg(feature = "fingerprint")]
mod fingerprint;

pub use backend::{CredentialBackend, Verdict};
pub use error::BackendError;
pub use pam::PamBackend;
pub use privileges::{drop_privileges, require_no_elevation};
pub use shadow::ShadowBackend;

#[cfg(target_os = "openbsd")]
pub use bsdauth::BsdAuthBackend;

#[cfg(feature = "fingerprint")]
pub use fingerprint::FingerprintBackend;
