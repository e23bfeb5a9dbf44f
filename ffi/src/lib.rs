//! C-ABI wrapper around `plex-core`.
//!
//! # Overview
//! Exposes the two Plex operations to any language with a C FFI, keeping
//! the shape of the classic `libplex` interface: a process-wide
//! `plex_global_init` / `plex_global_cleanup` pair around
//! `plex_get_auth_token` and `plex_get_device_uri`.
//!
//! # Design
//! - The Rust API has no global state; this layer keeps one `Resolver`
//!   behind a `Mutex`, created by init and dropped by cleanup. Calls made
//!   outside that window return `NotInitialized` instead of crashing.
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Results come back in an `FfiPlexResult` envelope that the caller owns
//!   and must release with `plex_free_result`.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::panic::catch_unwind;
use std::sync::{Mutex, MutexGuard, PoisonError};

use plex_core::{AuthToken, ClientConfig, Credentials, Resolver};

use types::*;

static RESOLVER: Mutex<Option<Resolver>> = Mutex::new(None);

fn resolver() -> MutexGuard<'static, Option<Resolver>> {
    RESOLVER.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Borrow a C string argument, or produce the error result to return.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives the
/// returned borrow.
unsafe fn str_arg<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, *mut FfiPlexResult> {
    if ptr.is_null() {
        return Err(FfiPlexResult::null_arg(name));
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().map_err(|_| {
        FfiPlexResult::error(
            FfiErrorCode::InvalidInput,
            0,
            format!("{name} is not valid UTF-8"),
        )
    })
}

fn install(config: ClientConfig) -> c_int {
    match Resolver::new(config) {
        Ok(new) => {
            *resolver() = Some(new);
            0
        }
        Err(_) => -1,
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Initialize the library against the public Plex endpoints.
///
/// Returns 0 on success, -1 on failure. Calling it again replaces the
/// current client.
#[unsafe(no_mangle)]
pub extern "C" fn plex_global_init() -> c_int {
    catch_unwind(|| install(ClientConfig::default())).unwrap_or(-1)
}

/// Initialize the library against custom sign-in and resources endpoints.
///
/// Returns -1 if either pointer is null or either URL is not http(s).
#[unsafe(no_mangle)]
pub extern "C" fn plex_global_init_with_endpoints(
    sign_in_url: *const c_char,
    resources_url: *const c_char,
) -> c_int {
    catch_unwind(|| {
        if sign_in_url.is_null() || resources_url.is_null() {
            return -1;
        }
        let sign_in = unsafe { CStr::from_ptr(sign_in_url) }.to_str();
        let resources = unsafe { CStr::from_ptr(resources_url) }.to_str();
        match (sign_in, resources) {
            (Ok(sign_in), Ok(resources)) => install(
                ClientConfig::default()
                    .with_sign_in_url(sign_in)
                    .with_resources_url(resources),
            ),
            _ => -1,
        }
    })
    .unwrap_or(-1)
}

/// Release the client created by init. Safe to call more than once.
#[unsafe(no_mangle)]
pub extern "C" fn plex_global_cleanup() {
    let _ = catch_unwind(|| {
        resolver().take();
    });
}

/// Version of the C interface, as published in `plex.h`.
pub const LIBPLEX_VERSION: &str = "0.0.1";

/// `LIBPLEX_VERSION` as a static NUL-terminated string. Do not free.
#[unsafe(no_mangle)]
pub extern "C" fn plex_version() -> *const c_char {
    c"0.0.1".as_ptr()
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Exchange a username and password for an authentication token.
///
/// On success `value` holds the token.
#[unsafe(no_mangle)]
pub extern "C" fn plex_get_auth_token(
    username: *const c_char,
    password: *const c_char,
) -> *mut FfiPlexResult {
    catch_unwind(|| {
        let username = match unsafe { str_arg(username, "username") } {
            Ok(s) => s,
            Err(result) => return result,
        };
        let password = match unsafe { str_arg(password, "password") } {
            Ok(s) => s,
            Err(result) => return result,
        };

        let mut guard = resolver();
        let Some(resolver) = guard.as_mut() else {
            return FfiPlexResult::not_initialized();
        };
        match resolver.get_auth_token(&Credentials::new(username, password)) {
            Ok(token) => FfiPlexResult::ok(token.into_inner()),
            Err(e) => FfiPlexResult::from_auth_error(e),
        }
    })
    .unwrap_or_else(|_| FfiPlexResult::panic("panic in plex_get_auth_token"))
}

/// Resolve a device name to the URI of one of its local connections.
///
/// On success `value` holds the URI.
#[unsafe(no_mangle)]
pub extern "C" fn plex_get_device_uri(
    token: *const c_char,
    name: *const c_char,
) -> *mut FfiPlexResult {
    catch_unwind(|| {
        let token = match unsafe { str_arg(token, "token") } {
            Ok(s) => s,
            Err(result) => return result,
        };
        let name = match unsafe { str_arg(name, "name") } {
            Ok(s) => s,
            Err(result) => return result,
        };
        let token = match AuthToken::new(token) {
            Ok(token) => token,
            Err(e) => return FfiPlexResult::from_input_error(e),
        };

        let mut guard = resolver();
        let Some(resolver) = guard.as_mut() else {
            return FfiPlexResult::not_initialized();
        };
        match resolver.get_device_uri(&token, name) {
            Ok(uri) => FfiPlexResult::ok(uri.into_inner()),
            Err(e) => FfiPlexResult::from_resolve_error(e),
        }
    })
    .unwrap_or_else(|_| FfiPlexResult::panic("panic in plex_get_device_uri"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiPlexResult` returned by any `plex_get_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn plex_free_result(result: *mut FfiPlexResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.value.is_null() {
            drop(unsafe { CString::from_raw(result.value) });
        }
    });
}
