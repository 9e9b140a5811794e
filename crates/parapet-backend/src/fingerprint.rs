// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Fingerprint backend over fprintd's D-Bus interface.
//!
//! A continuous backend: it never consumes password requests. The child
//! claims the default reader and loops scan rounds internally, streaming
//! progress as tagged status frames and the match as the verdict.

use tracing::{debug, error};

use parapet_proto::ChildChannel;

use crate::backend::{CredentialBackend, Verdict};
use crate::error::BackendError;
use crate::user::passwd_entry;

const FPRINTD_BUS: &str = "net.reactivated.Fprint";
const FPRINTD_MANAGER_PATH: &str = "/net/reactivated/Fprint/Manager";
const FPRINTD_MANAGER_IFACE: &str = "net.reactivated.Fprint.Manager";
const FPRINTD_DEVICE_IFACE: &str = "net.reactivated.Fprint.Device";

fn dbus_err(context: &'static str) -> impl FnOnce(zbus::Error) -> BackendError {
    move |e| {
        error!("{context}: {e}");
        BackendError::Service(context)
    }
}

fn scan_hint(result: &str) -> &'static str {
    match result {
        "verify-retry-scan" => "retry your scan",
        "verify-swipe-too-short" => "swipe too short, retry",
        "verify-finger-not-centered" => "finger not centered, retry",
        "verify-remove-and-retry" => "remove your finger and retry",
        _ => "scanning",
    }
}

/// Verifies through fprintd; requires the `fingerprint` feature and a
/// running fprintd with an enrolled finger.
pub struct FingerprintBackend {
    finger: String,
}

impl FingerprintBackend {
    /// Backend scanning the given finger (`"any"` for whichever is
    /// enrolled).
    pub fn new(finger: &str) -> Self {
        Self {
            finger: finger.to_owned(),
        }
    }
}

impl Default for FingerprintBackend {
    fn default() -> Self {
        Self::new("any")
    }
}

impl CredentialBackend for FingerprintBackend {
    /// Never called — `run` is overridden — but the contract requires an
    /// answer: a password is not a fingerprint.
    fn verify(&mut self, _password: &[u8]) -> Verdict {
        Verdict::Reject
    }

    fn run(&mut self, chan: &mut ChildChannel) -> Result<(), BackendError> {
        let (username, _) = passwd_entry()?;
        let username = username.to_string_lossy().into_owned();

        let conn = zbus::blocking::Connection::system()
            .map_err(dbus_err("failed to connect to the system bus"))?;

        let manager = zbus::blocking::Proxy::new(
            &conn,
            FPRINTD_BUS,
            FPRINTD_MANAGER_PATH,
            FPRINTD_MANAGER_IFACE,
        )
        .map_err(dbus_err("failed to reach the fprintd manager"))?;

        let device_path: zbus::zvariant::OwnedObjectPath = manager
            .call("GetDefaultDevice", &())
            .map_err(dbus_err("no fingerprint device available"))?;

        debug!("using fingerprint device {}", device_path.as_str());

        let device = zbus::blocking::Proxy::new(
            &conn,
            FPRINTD_BUS,
            device_path.as_str().to_owned(),
            FPRINTD_DEVICE_IFACE,
        )
        .map_err(dbus_err("failed to reach the fingerprint device"))?;

        device
            .call::<_, _, ()>("Claim", &(username.as_str(),))
            .map_err(dbus_err("failed to claim the fingerprint device"))?;

        let outcome = self.scan_loop(chan, &device);

        let _ = device.call::<_, _, ()>("Release", &());
        outcome
    }
}

impl FingerprintBackend {
    fn scan_loop(
        &mut self,
        chan: &mut ChildChannel,
        device: &zbus::blocking::Proxy<'_>,
    ) -> Result<(), BackendError> {
        loop {
            let signals = device
                .receive_signal("VerifyStatus")
                .map_err(dbus_err("failed to subscribe to scan results"))?;

            device
                .call::<_, _, ()>("VerifyStart", &(self.finger.as_str(),))
                .map_err(dbus_err("failed to start a scan"))?;

            chan.write_status("place your finger on the reader")?;

            let mut matched = false;
            for msg in signals {
                let (result, done): (String, bool) = match msg.body().deserialize() {
                    Ok(body) => body,
                    Err(e) => {
                        error!("malformed VerifyStatus signal: {e}");
                        continue;
                    }
                };

                debug!("verify result: {result} (done: {done})");

                if !done {
                    chan.write_status(scan_hint(&result))?;
                    continue;
                }

                let _ = device.call::<_, _, ()>("VerifyStop", &());
                matched = result == "verify-match";
                break;
            }

            chan.write_verdict(matched)?;

            if matched {
                return Ok(());
            }
        }
    }
}
