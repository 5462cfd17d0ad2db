//! FFI bindings for docs-readtime
//!
//! This module provides C-compatible functions for embedding the engine in a
//! host page runtime. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `readtime_free_string`.
//!
//! Sessions created here tick on a host-driven clock: the host calls
//! `readtime_session_advance` from its own event loop.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::time::Duration;

use serde::Serialize;

use crate::config::ReadingConfig;
use crate::content::{extract_region_text, StaticText, DEFAULT_REGION};
use crate::estimator::{EstimateInput, Estimator};
use crate::overlay::{OverlayModel, OverlayVariant};
use crate::progress::{format_clock, ProgressCalculator};
use crate::session::SessionCoordinator;
use crate::ticker::ManualClock;
use crate::types::SessionSnapshot;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn estimator_for(words_per_minute: i32) -> Estimator {
    if words_per_minute <= 0 {
        Estimator::new()
    } else {
        Estimator::with_words_per_minute(words_per_minute as u32)
    }
}

fn to_json<T: Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

#[derive(Serialize)]
struct ClockedSnapshot {
    #[serde(flatten)]
    snapshot: SessionSnapshot,
    clock: String,
}

// ============================================================================
// Stateless API
// ============================================================================

/// Estimate reading minutes for plain text.
///
/// A non-positive `words_per_minute` selects the default rate (160).
///
/// # Safety
/// - `text` must be a valid null-terminated C string.
/// - Returns -1 on error; call `readtime_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn readtime_estimate_text(text: *const c_char, words_per_minute: i32) -> i64 {
    clear_last_error();

    let text = match cstr_to_string(text) {
        Some(s) => s,
        None => {
            set_last_error("Invalid text string pointer");
            return -1;
        }
    };

    estimator_for(words_per_minute).estimate_text(&text) as i64
}

/// Estimate reading minutes for the content region of an HTML page.
///
/// `region` may be NULL to use the `<article>` element. A missing region
/// yields 0, which means no overlay should be rendered.
///
/// # Safety
/// - `html` must be a valid null-terminated C string; `region` must be NULL
///   or a valid null-terminated C string.
/// - Returns -1 on error; call `readtime_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn readtime_estimate_html(
    html: *const c_char,
    region: *const c_char,
    words_per_minute: i32,
) -> i64 {
    clear_last_error();

    let html = match cstr_to_string(html) {
        Some(s) => s,
        None => {
            set_last_error("Invalid HTML string pointer");
            return -1;
        }
    };
    let region = cstr_to_string(region).unwrap_or_else(|| DEFAULT_REGION.to_string());

    match extract_region_text(&html, &region) {
        Some(text) => estimator_for(words_per_minute).estimate_text(&text) as i64,
        None => 0,
    }
}

/// Compute the progress view as JSON.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `readtime_free_string`.
#[no_mangle]
pub unsafe extern "C" fn readtime_progress_json(
    estimated_minutes: u64,
    elapsed_seconds: u64,
) -> *mut c_char {
    clear_last_error();
    to_json(&ProgressCalculator::compute(estimated_minutes, elapsed_seconds))
}

/// Format seconds as `m:ss`.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `readtime_free_string`.
#[no_mangle]
pub unsafe extern "C" fn readtime_format_clock(seconds: u64) -> *mut c_char {
    clear_last_error();
    string_to_cstr(&format_clock(seconds))
}

// ============================================================================
// Session API
// ============================================================================

/// Opaque handle to a reading session and its host-driven clock
pub struct ReadtimeSessionHandle {
    clock: ManualClock,
    session: SessionCoordinator,
}

/// Open a reading session.
///
/// `precomputed_minutes` wins when finite and non-negative; pass NaN (or a
/// negative value) to estimate from `text` instead. `text` may be NULL.
///
/// # Safety
/// - `text` must be NULL or a valid null-terminated C string.
/// - Returns NULL when there is no estimate (no overlay) or on error; the
///   handle must be freed with `readtime_session_free`.
#[no_mangle]
pub unsafe extern "C" fn readtime_session_new(
    precomputed_minutes: f64,
    text: *const c_char,
    words_per_minute: i32,
) -> *mut ReadtimeSessionHandle {
    clear_last_error();

    let mut config = ReadingConfig::default();
    if words_per_minute > 0 {
        config.words_per_minute = words_per_minute as u32;
    }

    let content = cstr_to_string(text).map(StaticText::new);
    let mut input = EstimateInput::precomputed(precomputed_minutes);
    if let Some(content) = &content {
        input = input.with_content(content);
    }

    let clock = ManualClock::new();
    match SessionCoordinator::open(&config, &input, Box::new(clock.ticker())) {
        Some(session) => Box::into_raw(Box::new(ReadtimeSessionHandle { clock, session })),
        None => {
            set_last_error("No reading-time estimate for this document");
            ptr::null_mut()
        }
    }
}

/// Dispose a session and free its handle.
///
/// # Safety
/// - `handle` must be a pointer returned by `readtime_session_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn readtime_session_free(handle: *mut ReadtimeSessionHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

unsafe fn transition(
    handle: *mut ReadtimeSessionHandle,
    apply: impl FnOnce(&SessionCoordinator) -> bool,
) -> i32 {
    clear_last_error();

    match handle.as_ref() {
        Some(handle) => i32::from(apply(&handle.session)),
        None => {
            set_last_error("Null session handle");
            -1
        }
    }
}

/// Start (or resume) the timer. Returns 1 on transition, 0 on no-op, -1 on error.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `readtime_session_new`.
#[no_mangle]
pub unsafe extern "C" fn readtime_session_start(handle: *mut ReadtimeSessionHandle) -> i32 {
    transition(handle, |session| session.start())
}

/// Stop the timer, keeping elapsed time. Returns 1 on transition, 0 on no-op,
/// -1 on error.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `readtime_session_new`.
#[no_mangle]
pub unsafe extern "C" fn readtime_session_stop(handle: *mut ReadtimeSessionHandle) -> i32 {
    transition(handle, |session| session.stop())
}

/// Stop when running, start otherwise.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `readtime_session_new`.
#[no_mangle]
pub unsafe extern "C" fn readtime_session_toggle(handle: *mut ReadtimeSessionHandle) -> i32 {
    transition(handle, |session| session.toggle())
}

/// Reset to idle with zero elapsed time.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `readtime_session_new`.
#[no_mangle]
pub unsafe extern "C" fn readtime_session_reset(handle: *mut ReadtimeSessionHandle) -> i32 {
    transition(handle, |session| session.reset())
}

/// Longest span a single `readtime_session_advance` call may cover (24 hours)
pub const MAX_ADVANCE_MILLIS: u64 = 24 * 60 * 60 * 1000;

/// Advance the session clock by `millis`. Returns the number of ticks
/// delivered, or -1 on error.
///
/// Ticks are delivered one by one, so the span is capped at
/// [`MAX_ADVANCE_MILLIS`]; longer spans are rejected without advancing.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `readtime_session_new`.
#[no_mangle]
pub unsafe extern "C" fn readtime_session_advance(
    handle: *mut ReadtimeSessionHandle,
    millis: u64,
) -> i64 {
    clear_last_error();

    let Some(handle) = handle.as_ref() else {
        set_last_error("Null session handle");
        return -1;
    };

    if millis > MAX_ADVANCE_MILLIS {
        set_last_error(&format!(
            "Advance span {}ms exceeds the {}ms limit",
            millis, MAX_ADVANCE_MILLIS
        ));
        return -1;
    }

    handle.clock.advance(Duration::from_millis(millis)) as i64
}

/// Current session state and progress as JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `readtime_session_new`.
/// - Returns a newly allocated string that must be freed with `readtime_free_string`.
#[no_mangle]
pub unsafe extern "C" fn readtime_session_snapshot_json(
    handle: *mut ReadtimeSessionHandle,
) -> *mut c_char {
    clear_last_error();

    let Some(handle) = handle.as_ref() else {
        set_last_error("Null session handle");
        return ptr::null_mut();
    };

    let snapshot = handle.session.snapshot();
    to_json(&ClockedSnapshot {
        clock: format_clock(snapshot.session.elapsed_seconds),
        snapshot,
    })
}

/// Render the overlay markup. `variant` is 0 for the floating card and 1 for
/// the sticky bar. Returns an empty string when no overlay should be shown.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `readtime_session_new`.
/// - Returns a newly allocated string that must be freed with `readtime_free_string`.
#[no_mangle]
pub unsafe extern "C" fn readtime_session_overlay_html(
    handle: *mut ReadtimeSessionHandle,
    variant: i32,
) -> *mut c_char {
    clear_last_error();

    let Some(handle) = handle.as_ref() else {
        set_last_error("Null session handle");
        return ptr::null_mut();
    };

    let variant = match variant {
        0 => OverlayVariant::FloatingCard,
        1 => OverlayVariant::StickyBar,
        other => {
            set_last_error(&format!("Unknown overlay variant: {}", other));
            return ptr::null_mut();
        }
    };

    let snapshot = handle.session.snapshot();
    let model = OverlayModel::new(&snapshot.session, &snapshot.progress);
    let html = model
        .map(|model| variant.renderer().render(&model))
        .unwrap_or_default();
    string_to_cstr(&html)
}

// ============================================================================
// Memory & diagnostics
// ============================================================================

/// Free a string returned by any `readtime_*` function.
///
/// # Safety
/// - `ptr` must be a pointer returned by this library, or NULL.
#[no_mangle]
pub unsafe extern "C" fn readtime_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message (or NULL if none).
///
/// # Safety
/// - The returned pointer is valid until the next `readtime_*` call on the
///   same thread. Do not free it.
#[no_mangle]
pub unsafe extern "C" fn readtime_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version string.
///
/// # Safety
/// - Returns a static string; do not free it.
#[no_mangle]
pub unsafe extern "C" fn readtime_version() -> *const c_char {
    // Use a static CString to avoid allocation
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
