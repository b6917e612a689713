//! C FFI - stable ABI for generated bindings and foreign callers
//!
//! Design: plain `extern "C"` functions over opaque handles.
//! 1. Object lifecycle (create, add-ref, release)
//! 2. Dynamic property and method access with tagged values
//! 3. Boundary strings and collections
//! 4. Error propagation via sentinels plus a per-thread last error
//!
//! Pointer arguments are checked for null; beyond that the caller must pass
//! pointers that are valid for the documented access.

mod collections;
mod dynamic;
mod errors;
mod guard;
mod lifecycle;
mod strings;
mod types;

pub use collections::{
    idlbridge_array_count, idlbridge_array_item, idlbridge_array_new, idlbridge_array_push,
    idlbridge_array_release, idlbridge_dict_count, idlbridge_dict_insert, idlbridge_dict_new,
    idlbridge_dict_next, idlbridge_dict_release, idlbridge_dict_reset, idlbridge_set_count,
    idlbridge_set_insert, idlbridge_set_new, idlbridge_set_next, idlbridge_set_release,
    idlbridge_set_reset,
};
pub use dynamic::{idlbridge_get_property, idlbridge_invoke, idlbridge_set_property};
pub use errors::{idlbridge_clear_last_error, idlbridge_get_last_error, idlbridge_last_error_code};
pub use guard::{boundary, Sentinel};
pub use lifecycle::{idlbridge_add_ref, idlbridge_create, idlbridge_refcount, idlbridge_release};
pub use strings::{
    idlbridge_string_copy, idlbridge_string_create, idlbridge_string_length,
    idlbridge_string_release, idlbridge_string_value,
};
pub use types::{FfiType, FfiValue, TypedValue};

use std::ffi::CStr;
use std::os::raw::c_char;

use crate::error::{BridgeError, BridgeResult};

/// Borrow a NUL-terminated UTF-8 argument
pub(crate) fn c_str<'a>(ptr: *const c_char, what: &str) -> BridgeResult<&'a str> {
    if ptr.is_null() {
        return Err(BridgeError::invalid_argument(format!("Null {}", what)));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| BridgeError::invalid_argument(format!("{} is not valid UTF-8", what)))
}

/// Store through a caller-provided output pointer
pub(crate) fn write_out<T>(out: *mut T, value: T) -> BridgeResult<()> {
    if out.is_null() {
        return Err(BridgeError::invalid_argument("Null output pointer"));
    }
    unsafe { out.write(value) };
    Ok(())
}
