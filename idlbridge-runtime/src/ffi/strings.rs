//! Boundary strings - C API
//!
//! Strings are immutable. `idlbridge_string_value` lends a pointer that is
//! valid until the handle is released; everything else copies.

use std::os::raw::c_char;

use super::c_str;
use super::guard::boundary;
use crate::error::BridgeError;
use crate::handle::{handles, Handle};
use crate::object::{ObjRef, Payload, TypeTag};
use crate::string::{new_string_handle, read_string, BoundaryString};

fn with_string<R>(handle: Handle, f: impl FnOnce(&BoundaryString) -> R) -> Result<R, BridgeError> {
    let obj: ObjRef = handles().resolve(handle, Some(TypeTag::String))?;
    obj.with_payload(|payload| match payload {
        Payload::String(s) => Some(f(s)),
        _ => None,
    })?
    .ok_or_else(|| BridgeError::type_mismatch("string", "non-string object"))
}

/// Copy `text` into a new string handle owned by the caller
///
/// # Safety
/// - `text` must be null or a NUL-terminated string
#[no_mangle]
pub extern "C" fn idlbridge_string_create(text: *const c_char) -> Handle {
    boundary("idlbridge_string_create", || {
        new_string_handle(c_str(text, "string value")?)
    })
}

/// Borrow the string's content; null on failure
#[no_mangle]
pub extern "C" fn idlbridge_string_value(handle: Handle) -> *const c_char {
    boundary("idlbridge_string_value", || with_string(handle, |s| s.as_ptr()))
}

/// Length in bytes, excluding the terminator
#[no_mangle]
pub extern "C" fn idlbridge_string_length(handle: Handle) -> usize {
    boundary("idlbridge_string_length", || with_string(handle, |s| s.len()))
}

/// Independent copy with its own handle
#[no_mangle]
pub extern "C" fn idlbridge_string_copy(handle: Handle) -> Handle {
    boundary("idlbridge_string_copy", || {
        let content = read_string(handle)?;
        new_string_handle(&content)
    })
}

#[no_mangle]
pub extern "C" fn idlbridge_string_release(handle: Handle) -> bool {
    boundary("idlbridge_string_release", || {
        handles().release(handle, Some(TypeTag::String))?;
        Ok(true)
    })
}
