// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Session configuration, loadable from a TOML file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
}

/// Knobs for the unlock flow. Defaults match the historical behavior:
/// 3 s indicator decay, 10 s password auto-clear, 2 s post-failure
/// backoff, no grace period.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Treat a submit of an empty password as a no-op.
    pub ignore_empty: bool,
    /// Pre-authentication unlock window in milliseconds; 0 disables it.
    pub grace_period_ms: u64,
    /// During the grace period, ignore pointer events.
    pub grace_no_pointer: bool,
    /// During the grace period, ignore touch events.
    pub grace_no_touch: bool,
    /// How long transient indicator states linger before decaying to idle.
    pub indicator_clear_ms: u64,
    /// Inactivity window after which a half-typed password is wiped.
    pub password_clear_ms: u64,
    /// Delay the child applies after a rejected attempt.
    pub failure_backoff_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            ignore_empty: false,
            grace_period_ms: 0,
            grace_no_pointer: false,
            grace_no_touch: false,
            indicator_clear_ms: 3000,
            password_clear_ms: 10_000,
            failure_backoff_ms: 2000,
        }
    }
}

impl AuthConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// The grace window, `None` when disabled.
    pub fn grace_period(&self) -> Option<Duration> {
        (self.grace_period_ms > 0).then(|| Duration::from_millis(self.grace_period_ms))
    }

    /// Indicator decay as a `Duration`.
    pub fn indicator_clear(&self) -> Duration {
        Duration::from_millis(self.indicator_clear_ms)
    }

    /// Password auto-clear as a `Duration`.
    pub fn password_clear(&self) -> Duration {
        Duration::from_millis(self.password_clear_ms)
    }

    /// Post-failure backoff as a `Duration`.
    pub fn failure_backoff(&self) -> Duration {
        Duration::from_millis(self.failure_backoff_ms)
    }
}
