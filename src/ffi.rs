//! FFI interface for host bindings
//!
//! C-compatible functions over the transformation engine. HTML is passed as
//! a byte buffer, everything else as null-terminated JSON.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::Serialize;

use crate::config::{available_presets, parse_config, preset_info, validate, ConfigError, ValidationResult};
use crate::responsify;

/// Result struct returned to the host.
/// Both pointers are owned by Rust and must be freed via free_responsify_result
#[repr(C)]
pub struct ResponsifyResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if the call itself failed (null-terminated), or null
    pub error_ptr: *mut c_char,
}

/// Transform HTML according to a JSON configuration.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `config_json` - JSON configuration (null-terminated)
///
/// # Returns
/// `json_ptr` holds the result envelope `{success, html?, error?, code?, stats}`,
/// including transformation failures. `error_ptr` is set only when the
/// arguments or the configuration could not be read.
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `config_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_responsify_result`
#[no_mangle]
pub unsafe extern "C" fn responsify_html(
    html_ptr: *const c_char,
    html_len: usize,
    config_json: *const c_char,
) -> ResponsifyResultFFI {
    let html = match html_from_raw(html_ptr, html_len) {
        Ok(html) => html,
        Err(msg) => return make_error_result(msg),
    };

    let config_str = match str_from_c(config_json, "Config JSON") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };

    let config = match parse_config(config_str) {
        Ok(config) => config,
        Err(e) => return make_error_result(&e.to_string()),
    };

    make_json_result(&responsify(&html, &config))
}

/// Validate a JSON configuration, returning `{valid, errors?}`.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_responsify_result`
#[no_mangle]
pub unsafe extern "C" fn validate_config_json(config_json: *const c_char) -> ResponsifyResultFFI {
    let config_str = match str_from_c(config_json, "Config JSON") {
        Ok(s) => s,
        Err(msg) => return make_error_result(&msg),
    };

    let result = match parse_config(config_str) {
        Ok(config) => validate(&config),
        Err(ConfigError::Validation(errors)) => ValidationResult {
            valid: false,
            errors: Some(errors),
        },
        Err(e) => ValidationResult {
            valid: false,
            errors: Some(vec![e.to_string()]),
        },
    };

    make_json_result(&result)
}

/// List built-in presets as `[{name, description}]`
///
/// # Safety
/// Caller must free the result via `free_responsify_result`
#[no_mangle]
pub unsafe extern "C" fn list_presets_json() -> ResponsifyResultFFI {
    let presets: Vec<_> = available_presets().into_iter().filter_map(preset_info).collect();
    make_json_result(&presets)
}

/// Free a ResponsifyResultFFI returned by any function in this module
///
/// # Safety
/// - `result` must have been returned by this module
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_responsify_result(result: ResponsifyResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn html_from_raw(html_ptr: *const c_char, html_len: usize) -> Result<String, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok(String::new());
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice)
        .map(str::to_string)
        .map_err(|_| "Invalid UTF-8 in HTML content")
}

unsafe fn str_from_c<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err(format!("{} is null", what));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| format!("Invalid UTF-8 in {}", what))
}

fn make_json_result<T: Serialize + ?Sized>(value: &T) -> ResponsifyResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ResponsifyResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> ResponsifyResultFFI {
    let error_cstr = CString::new(msg).unwrap_or_else(|_| c"Unknown error".to_owned());
    ResponsifyResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
