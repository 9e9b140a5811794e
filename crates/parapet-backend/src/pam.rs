// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! PAM backend over a runtime-loaded libpam.so.0.
//!
//! libpam is dlopened, never linked, so the workspace builds on systems
//! without PAM headers and the library's absence degrades to rejected
//! attempts instead of a missing binary.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::time::Duration;

use libloading::Library;
use tracing::{debug, error};

use parapet_zero::wipe_slice;

use crate::backend::{CredentialBackend, Verdict};
use crate::error::BackendError;
use crate::privileges::require_no_elevation;
use crate::user::passwd_entry;

const PAM_SONAMES: [&str; 2] = ["libpam.so.0", "libpam.so"];

const PAM_SUCCESS: c_int = 0;
const PAM_AUTH_ERR: c_int = 7;
const PAM_CRED_INSUFFICIENT: c_int = 8;
const PAM_AUTHINFO_UNAVAIL: c_int = 9;
const PAM_MAXTRIES: c_int = 11;
const PAM_ABORT: c_int = 26;

const PAM_PROMPT_ECHO_OFF: c_int = 1;
const PAM_PROMPT_ECHO_ON: c_int = 2;

const PAM_REFRESH_CRED: c_int = 0x0010;

// Mirrors of the Linux-PAM structs; some fields only matter to the C side.
#[repr(C)]
#[allow(dead_code)]
struct PamMessage {
    msg_style: c_int,
    msg: *const c_char,
}

#[repr(C)]
#[allow(dead_code)]
struct PamResponse {
    resp: *mut c_char,
    resp_retcode: c_int,
}

type ConvCallback = unsafe extern "C" fn(
    c_int,
    *mut *const PamMessage,
    *mut *mut PamResponse,
    *mut c_void,
) -> c_int;

#[repr(C)]
#[allow(dead_code)]
struct PamConv {
    conv: Option<ConvCallback>,
    appdata_ptr: *mut c_void,
}

type PamHandle = c_void;

type PamStartFn =
    unsafe extern "C" fn(*const c_char, *const c_char, *const PamConv, *mut *mut PamHandle) -> c_int;
type PamAuthenticateFn = unsafe extern "C" fn(*mut PamHandle, c_int) -> c_int;
type PamSetcredFn = unsafe extern "C" fn(*mut PamHandle, c_int) -> c_int;
type PamEndFn = unsafe extern "C" fn(*mut PamHandle, c_int) -> c_int;

/// The password the conversation callback answers prompts with. Lives in
/// a `Box` so its address is stable for the whole pam_start..pam_end span.
struct ConvState {
    password: *const c_char,
}

/// libpam with its four symbols resolved per call.
struct PamLib {
    lib: Library,
}

impl PamLib {
    fn load() -> Result<Self, BackendError> {
        let mut last = None;

        for soname in PAM_SONAMES {
            match unsafe { Library::new(soname) } {
                Ok(lib) => {
                    if unsafe { lib.get::<PamStartFn>(b"pam_start\0") }.is_ok() {
                        return Ok(Self { lib });
                    }
                }
                Err(e) => last = Some(e),
            }
        }

        match last {
            Some(source) => Err(BackendError::LibraryLoad {
                library: "libpam.so.0",
                source,
            }),
            None => Err(BackendError::Service("libpam exports no pam_start symbol")),
        }
    }

    fn start(
        &self,
        service: &CStr,
        user: &CStr,
        conv: *const PamConv,
        handle: *mut *mut PamHandle,
    ) -> c_int {
        match unsafe { self.lib.get::<PamStartFn>(b"pam_start\0") } {
            Ok(f) => unsafe { f(service.as_ptr(), user.as_ptr(), conv, handle) },
            Err(_) => PAM_ABORT,
        }
    }

    fn authenticate(&self, handle: *mut PamHandle) -> c_int {
        match unsafe { self.lib.get::<PamAuthenticateFn>(b"pam_authenticate\0") } {
            Ok(f) => unsafe { f(handle, 0) },
            Err(_) => PAM_ABORT,
        }
    }

    fn setcred(&self, handle: *mut PamHandle, flags: c_int) -> c_int {
        match unsafe { self.lib.get::<PamSetcredFn>(b"pam_setcred\0") } {
            Ok(f) => unsafe { f(handle, flags) },
            Err(_) => PAM_ABORT,
        }
    }

    fn end(&self, handle: *mut PamHandle, status: c_int) -> c_int {
        match unsafe { self.lib.get::<PamEndFn>(b"pam_end\0") } {
            Ok(f) => unsafe { f(handle, status) },
            Err(_) => PAM_ABORT,
        }
    }
}

/// PAM expects one response per message; prompts are answered with a copy
/// of the current password, which PAM clears and frees itself.
unsafe extern "C" fn conversation(
    num_msg: c_int,
    msg: *mut *const PamMessage,
    resp: *mut *mut PamResponse,
    data: *mut c_void,
) -> c_int {
    if num_msg <= 0 || msg.is_null() || resp.is_null() || data.is_null() {
        return PAM_ABORT;
    }

    let replies = unsafe {
        libc::calloc(num_msg as usize, std::mem::size_of::<PamResponse>())
    } as *mut PamResponse;
    if replies.is_null() {
        return PAM_ABORT;
    }
    unsafe { *resp = replies };

    for i in 0..num_msg as usize {
        let message = unsafe { *msg.add(i) };
        if message.is_null() {
            return PAM_ABORT;
        }

        let style = unsafe { (*message).msg_style };
        if style == PAM_PROMPT_ECHO_OFF || style == PAM_PROMPT_ECHO_ON {
            let password = unsafe { (*(data as *const ConvState)).password };
            if password.is_null() {
                return PAM_ABORT;
            }

            let dup = unsafe { libc::strdup(password) };
            if dup.is_null() {
                return PAM_ABORT;
            }
            unsafe { (*replies.add(i)).resp = dup };
        }
    }

    PAM_SUCCESS
}

fn auth_error(status: c_int) -> &'static str {
    match status {
        PAM_AUTH_ERR => "invalid credentials",
        PAM_CRED_INSUFFICIENT => {
            "cannot authenticate users; check the PAM service file has been installed properly"
        }
        PAM_AUTHINFO_UNAVAIL => "authentication information unavailable",
        PAM_MAXTRIES => "maximum number of authentication tries exceeded",
        _ => "unknown error",
    }
}

/// Authenticates through the system PAM stack.
///
/// One PAM session spans the whole child lifetime: `pam_start` on the
/// first request, one `pam_authenticate` per request, `pam_setcred` +
/// `pam_end` when the child winds down. The loop stops after the first
/// success so requests queued behind it are never processed.
pub struct PamBackend {
    service: String,
    lib: Option<PamLib>,
    handle: *mut PamHandle,
    conv_state: Box<ConvState>,
    conv: Box<PamConv>,
    username: Option<CString>,
    last_status: c_int,
}

impl PamBackend {
    /// Backend for the given PAM service name (e.g. `"parapet"`).
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_owned(),
            lib: None,
            handle: std::ptr::null_mut(),
            conv_state: Box::new(ConvState {
                password: std::ptr::null(),
            }),
            conv: Box::new(PamConv {
                conv: Some(conversation as ConvCallback),
                appdata_ptr: std::ptr::null_mut(),
            }),
            username: None,
            last_status: PAM_SUCCESS,
        }
    }

    fn ensure_started(&mut self) -> bool {
        if !self.handle.is_null() {
            return true;
        }

        let (Some(lib), Some(user)) = (&self.lib, &self.username) else {
            return false;
        };
        let Ok(service) = CString::new(self.service.as_str()) else {
            error!("service name contains NUL");
            return false;
        };

        // Both boxes are heap-pinned; the pointers stay valid for the
        // whole pam_start..pam_end span even if this struct moves.
        self.conv.appdata_ptr = (&mut *self.conv_state) as *mut ConvState as *mut c_void;

        let status = lib.start(&service, user, &*self.conv, &mut self.handle);
        if status != PAM_SUCCESS {
            error!("pam_start failed");
            self.handle = std::ptr::null_mut();
            return false;
        }

        debug!("prepared to authorize user {:?}", user);
        true
    }
}

impl CredentialBackend for PamBackend {
    fn init(&mut self) -> Result<(), BackendError> {
        // A setuid locker must not talk to PAM; the stack does its own
        // privilege handling.
        require_no_elevation()?;
        self.lib = Some(PamLib::load()?);
        Ok(())
    }

    fn child_init(&mut self) -> Result<(), BackendError> {
        let (name, _) = passwd_entry()?;
        self.username = Some(name);
        Ok(())
    }

    fn verify(&mut self, password: &[u8]) -> Verdict {
        if !self.ensure_started() {
            return Verdict::Reject;
        }

        let Ok(key) = CString::new(password) else {
            return Verdict::Reject;
        };

        self.conv_state.password = key.as_ptr();
        let status = self.lib.as_ref().map_or(PAM_ABORT, |lib| {
            lib.authenticate(self.handle)
        });
        self.conv_state.password = std::ptr::null();

        let mut key = key.into_bytes();
        wipe_slice(&mut key);

        self.last_status = status;

        if status == PAM_SUCCESS {
            Verdict::Accept
        } else {
            error!("pam_authenticate failed: {}", auth_error(status));
            Verdict::Reject
        }
    }

    /// PAM modules apply their own fail delay.
    fn failure_backoff(&self) -> Duration {
        Duration::ZERO
    }

    fn stop_after_success(&self) -> bool {
        true
    }
}

impl Drop for PamBackend {
    fn drop(&mut self) {
        if self.handle.is_null() {
            return;
        }

        if let Some(lib) = &self.lib {
            lib.setcred(self.handle, PAM_REFRESH_CRED);
            if lib.end(self.handle, self.last_status) != PAM_SUCCESS {
                error!("pam_end failed");
            }
        }
        self.handle = std::ptr::null_mut();
    }
}
