// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

// Demo: drive the full authentication stack from a raw-mode terminal.
//
// The terminal stands in for the seat: printable keys feed the typing
// buffer, Enter submits, Backspace rewinds one character, Ctrl-U/Escape
// clear. The reply pipe and all timers run on the same poll loop a real
// locker would use.
//
//   cargo run -p locker-demo -- --backend pam
//   RUST_LOG=debug cargo run -p locker-demo -- --backend shadow

use std::os::unix::io::RawFd;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use parapet::backend::{PamBackend, ShadowBackend};
use parapet::comm::Supervisor;
use parapet::event_loop::{EventLoop, Scheduler};
use parapet::session::{AuthConfig, AuthState, Session};

const STDIN_FD: RawFd = 0;

type LockSession = Session<Supervisor>;

/// Restores cooked mode when the demo leaves scope.
struct RawMode {
    saved: libc::termios,
}

impl RawMode {
    fn enter() -> Option<Self> {
        let mut saved: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(STDIN_FD, &mut saved) } != 0 {
            return None;
        }

        let mut raw = saved;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO);
        if unsafe { libc::tcsetattr(STDIN_FD, libc::TCSANOW, &raw) } != 0 {
            return None;
        }

        Some(Self { saved })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        unsafe { libc::tcsetattr(STDIN_FD, libc::TCSANOW, &self.saved) };
    }
}

/// Accumulates stdin bytes into characters; raw mode delivers UTF-8
/// sequences one byte at a time.
#[derive(Default)]
struct Utf8Accumulator {
    pending: Vec<u8>,
}

impl Utf8Accumulator {
    fn push(&mut self, byte: u8) -> Option<char> {
        self.pending.push(byte);
        match std::str::from_utf8(&self.pending) {
            Ok(s) => {
                let ch = s.chars().next();
                self.pending.clear();
                ch
            }
            Err(_) if self.pending.len() < 4 => None,
            Err(_) => {
                self.pending.clear();
                None
            }
        }
    }
}

fn describe(session: &LockSession) {
    let state = match session.auth_state() {
        AuthState::Idle => "idle",
        AuthState::Grace => "grace",
        AuthState::Input => "input",
        AuthState::Backspace => "backspace",
        AuthState::NoOpInput => "no-op input",
        AuthState::Cleared => "cleared",
        AuthState::Validating => "validating...",
        AuthState::Invalid => "wrong password",
    };

    eprint!(
        "\r\x1b[K[{state}] typed: {} byte(s), failed attempts: {}",
        session.password_len(),
        session.failed_attempts()
    );
    if let Some(status) = session.last_status() {
        eprint!(" ({status})");
    }
}

fn on_stdin(
    acc: &mut Utf8Accumulator,
    session: &mut LockSession,
    sched: &mut Scheduler<LockSession>,
) {
    let mut byte = [0u8; 1];
    let n = unsafe { libc::read(STDIN_FD, byte.as_mut_ptr() as *mut libc::c_void, 1) };
    if n != 1 {
        return;
    }

    match byte[0] {
        b'\r' | b'\n' => session.handle_submit(sched),
        0x7F | 0x08 => session.handle_backspace(sched),
        0x15 | 0x1B => session.handle_clear(sched),
        byte => {
            if let Some(ch) = acc.push(byte) {
                if ch.is_control() {
                    session.handle_noop_input(sched);
                } else {
                    session.handle_character(sched, ch);
                }
            }
        }
    }
}

fn run(backend_name: &str, cfg: AuthConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backoff = cfg.failure_backoff();
    let supervisor = match backend_name {
        "shadow" => Supervisor::spawn(ShadowBackend::with_backoff(backoff))?,
        "pam" => Supervisor::spawn(PamBackend::new("parapet"))?,
        #[cfg(feature = "fingerprint")]
        "fingerprint" => Supervisor::spawn(parapet::backend::FingerprintBackend::default())?,
        other => return Err(format!("unknown backend: {other}").into()),
    };

    let mut session = Session::new(supervisor, cfg)?;
    let mut event_loop = EventLoop::new();

    let reply_fd = session.reply_fd();
    event_loop.add_fd(reply_fd, |session: &mut LockSession, sched, _fd, _readiness| {
        let _ = session.handle_reply(sched);
        describe(session);
    });

    let mut acc = Utf8Accumulator::default();
    event_loop.add_fd(STDIN_FD, move |session: &mut LockSession, sched, _fd, _readiness| {
        on_stdin(&mut acc, session, sched);
        describe(session);
    });

    session.arm_grace_timer(&mut event_loop);

    let _raw = RawMode::enter();
    eprintln!("type the password, Enter submits (backend: {backend_name})");
    describe(&session);

    event_loop.run_while(&mut session, |session| session.is_running())?;
    eprintln!();

    if session.is_unlocked() {
        info!("unlocked");
        session.into_channel().shutdown()?;
        Ok(())
    } else {
        error!("channel failed before authentication completed");
        Err("authentication channel failed".into())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut backend_name = String::from("pam");
    let mut cfg = AuthConfig::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--backend" => {
                backend_name = args.next().unwrap_or_else(|| {
                    eprintln!("--backend needs a value");
                    std::process::exit(2);
                });
            }
            "--config" => {
                let path = args.next().unwrap_or_else(|| {
                    eprintln!("--config needs a path");
                    std::process::exit(2);
                });
                cfg = match AuthConfig::load(&path) {
                    Ok(cfg) => cfg,
                    Err(e) => {
                        eprintln!("failed to load {path}: {e}");
                        std::process::exit(2);
                    }
                };
            }
            "--grace" => {
                let ms: u64 = args
                    .next()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_else(|| {
                        eprintln!("--grace needs milliseconds");
                        std::process::exit(2);
                    });
                cfg.grace_period_ms = ms;
            }
            "--ignore-empty" => cfg.ignore_empty = true,
            other => {
                eprintln!("usage: locker [--backend shadow|pam] [--config <toml>] [--grace <ms>] [--ignore-empty]");
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
    }

    if let Err(e) = run(&backend_name, cfg) {
        eprintln!("locker: {e}");
        std::process::exit(1);
    }
}
