//! Boundary strings - immutable, independently owned UTF-8 text
//!
//! Every string crossing the boundary is a fresh copy with its own handle.
//! Content is stored NUL-terminated so `idlbridge_string_value` can lend a
//! pointer that stays valid until the handle is released.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use crate::error::{BridgeError, BridgeResult};
use crate::handle::{handles, Handle};
use crate::object::{ObjRef, Payload, TypeTag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryString {
    value: CString,
}

impl BoundaryString {
    pub fn new(text: &str) -> BridgeResult<Self> {
        let value = CString::new(text).map_err(|e| {
            BridgeError::invalid_argument(format!(
                "string contains an interior NUL at byte {}",
                e.nul_position()
            ))
        })?;
        Ok(Self { value })
    }

    pub fn from_c(text: &CStr) -> BridgeResult<Self> {
        text.to_str()
            .map_err(|_| BridgeError::invalid_argument("string is not valid UTF-8"))?;
        Ok(Self {
            value: text.to_owned(),
        })
    }

    pub fn as_str(&self) -> &str {
        // Constructors only admit UTF-8
        self.value.to_str().unwrap_or_default()
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.value.as_ptr()
    }

    /// Length in bytes, excluding the terminator
    pub fn len(&self) -> usize {
        self.value.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn new_string_object(text: &str) -> BridgeResult<ObjRef> {
    Ok(ObjRef::new(
        TypeTag::String,
        Payload::String(BoundaryString::new(text)?),
    ))
}

/// Allocate a string handle owned by the caller
pub fn new_string_handle(text: &str) -> BridgeResult<Handle> {
    handles().issue(new_string_object(text)?)
}

pub fn string_content(obj: &ObjRef) -> BridgeResult<String> {
    obj.with_payload(|payload| match payload {
        Payload::String(s) => Some(s.as_str().to_string()),
        _ => None,
    })?
    .ok_or_else(|| BridgeError::type_mismatch("string", "non-string object"))
}

/// Copy the content of a string handle
pub fn read_string(handle: Handle) -> BridgeResult<String> {
    let obj = handles().resolve(handle, Some(TypeTag::String))?;
    string_content(&obj)
}
