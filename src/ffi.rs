//! FFI bindings for Synheart Gesture
//!
//! C-compatible entry points for hosts that feed recorded or live landmarks
//! from another language. Strings are null-terminated UTF-8; every returned
//! string is allocated here and must be released with `gesture_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

use crate::config::RecognizerConfig;
use crate::pipeline::{analyze_recording, GestureProcessor};
use crate::types::FrameSize;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Like `cstr_to_string`, recording an error naming the argument on failure
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn json_or_null<T: serde::Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze a recording (NDJSON or JSON array of landmark frames).
///
/// Returns `{"snapshots": [...], "stats": {...}}`.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Zero `width` or `height` falls back to 1280x720.
/// - Returns a newly allocated string that must be freed with `gesture_free_string`.
/// - Returns NULL on error; call `gesture_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gesture_analyze_recording(
    json: *const c_char,
    width: u32,
    height: u32,
) -> *mut c_char {
    clear_last_error();

    let Some(input) = required_arg(json, "JSON") else {
        return ptr::null_mut();
    };
    let size = if width == 0 || height == 0 {
        FrameSize::default()
    } else {
        FrameSize::new(width, height)
    };

    match analyze_recording(&input, size) {
        Ok(analysis) => json_or_null(&analysis),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a GestureProcessor
pub struct GestureProcessorHandle {
    processor: GestureProcessor,
}

/// Create a processor.
///
/// # Safety
/// - `config_json` may be NULL for the default configuration, otherwise a
///   valid null-terminated C string holding a (partial) configuration.
/// - Must be freed with `gesture_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn gesture_processor_new(
    config_json: *const c_char,
) -> *mut GestureProcessorHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        RecognizerConfig::default()
    } else {
        let Some(json) = required_arg(config_json, "config") else {
            return ptr::null_mut();
        };
        match RecognizerConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let handle = Box::new(GestureProcessorHandle {
        processor: GestureProcessor::with_config(config),
    });
    Box::into_raw(handle)
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gesture_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn gesture_processor_free(processor: *mut GestureProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Process landmark frames and return the per-frame snapshots as a JSON array.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gesture_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `gesture_free_string`.
/// - Returns NULL on error; call `gesture_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gesture_processor_process(
    processor: *mut GestureProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let Some(input) = required_arg(json, "JSON") else {
        return ptr::null_mut();
    };

    match handle.processor.process_json(&input) {
        Ok(snapshots) => json_or_null(&snapshots),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Current session statistics as JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gesture_processor_new`.
/// - Returns a newly allocated string that must be freed with `gesture_free_string`.
/// - Returns NULL on error; call `gesture_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gesture_processor_stats(
    processor: *mut GestureProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    json_or_null(&handle.processor.stats())
}

/// Write the session report to `path`, replacing any existing file.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gesture_processor_new`.
/// - `path` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `gesture_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gesture_processor_save_stats(
    processor: *mut GestureProcessorHandle,
    path: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &*processor;

    let Some(path) = required_arg(path, "path") else {
        return -1;
    };

    match handle.processor.save_stats(Path::new(&path)) {
        Ok(_) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Clear temporal buffers and start a new session.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `gesture_processor_new`.
/// - Returns 0 on success, non-zero if `processor` is NULL.
#[no_mangle]
pub unsafe extern "C" fn gesture_processor_reset(processor: *mut GestureProcessorHandle) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    (*processor).processor.reset();
    0
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by a gesture function.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a gesture function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn gesture_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next gesture function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn gesture_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn gesture_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
