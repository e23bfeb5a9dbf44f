//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Every request function returns one heap-allocated `FfiPlexResult`. The
//! error category is a C enum, the message and value are owned C strings,
//! and the caller releases the whole envelope with `plex_free_result`.

use std::ffi::CString;
use std::os::raw::c_char;

use plex_core::{AuthError, InputError, ResolveError, TransportError};

/// Error codes returned in `FfiPlexResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotInitialized = 1,
    InvalidInput = 2,
    Transport = 3,
    Http = 4,
    Parse = 5,
    Query = 6,
    NotFound = 7,
    NullArg = 8,
    Panic = 9,
}

/// Result envelope for `plex_get_auth_token` and `plex_get_device_uri`.
///
/// On success `error_code` is `Ok`, `error_message` is null and `value`
/// holds the token or URI. On failure `value` is null, `error_message`
/// describes the problem and `http_status` is set when the server answered
/// with a non-success status.
#[repr(C)]
pub struct FfiPlexResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub value: *mut c_char,
}

impl FfiPlexResult {
    pub(crate) fn ok(value: String) -> *mut Self {
        Box::into_raw(Box::new(FfiPlexResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            value: c_string(value),
        }))
    }

    pub(crate) fn error(error_code: FfiErrorCode, http_status: u16, message: String) -> *mut Self {
        Box::into_raw(Box::new(FfiPlexResult {
            error_code,
            error_message: c_string(message),
            http_status,
            value: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn from_auth_error(err: AuthError) -> *mut Self {
        let (code, status) = match &err {
            AuthError::Transport(e) => transport_code(e),
            AuthError::Parse(_) => (FfiErrorCode::Parse, 0),
            AuthError::Query(_) => (FfiErrorCode::Query, 0),
            AuthError::InvalidInput(_) => (FfiErrorCode::InvalidInput, 0),
            AuthError::NotFound => (FfiErrorCode::NotFound, 0),
        };
        Self::error(code, status, err.to_string())
    }

    pub(crate) fn from_resolve_error(err: ResolveError) -> *mut Self {
        let (code, status) = match &err {
            ResolveError::Transport(e) => transport_code(e),
            ResolveError::Parse(_) => (FfiErrorCode::Parse, 0),
            ResolveError::Query(_) => (FfiErrorCode::Query, 0),
            ResolveError::InvalidInput(_) => (FfiErrorCode::InvalidInput, 0),
            ResolveError::NotFound { .. } => (FfiErrorCode::NotFound, 0),
        };
        Self::error(code, status, err.to_string())
    }

    pub(crate) fn from_input_error(err: InputError) -> *mut Self {
        Self::error(FfiErrorCode::InvalidInput, 0, err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    pub(crate) fn not_initialized() -> *mut Self {
        Self::error(
            FfiErrorCode::NotInitialized,
            0,
            "plex_global_init has not been called".to_string(),
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, 0, msg.to_string())
    }
}

fn transport_code(err: &TransportError) -> (FfiErrorCode, u16) {
    match err {
        TransportError::Status { status, .. } => (FfiErrorCode::Http, *status),
        _ => (FfiErrorCode::Transport, 0),
    }
}

/// Hand ownership of `value` to C. Interior NULs cannot come out of XML, so
/// a failed conversion degrades to an empty string.
fn c_string(value: String) -> *mut c_char {
    CString::new(value).unwrap_or_default().into_raw()
}
