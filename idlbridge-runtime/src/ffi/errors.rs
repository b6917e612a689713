//! Error channel - C API for the per-thread last error
//!
//! These calls read or reset the slot and never write an outcome of their
//! own, so checking the error does not clear it.

use std::os::raw::c_char;

use crate::context;

/// Message of the last failed call on this thread; empty string if none
///
/// The pointer stays valid until the next boundary call on this thread.
#[no_mangle]
pub extern "C" fn idlbridge_get_last_error() -> *const c_char {
    context::last_error_ptr()
}

/// Numeric code of the last failed call on this thread; 0 if none
#[no_mangle]
pub extern "C" fn idlbridge_last_error_code() -> i32 {
    context::last_error_code() as i32
}

#[no_mangle]
pub extern "C" fn idlbridge_clear_last_error() {
    context::clear_last_error();
}
