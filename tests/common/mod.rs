//! Helpers shared by the integration tests; they call the C entry points
//! exactly as a foreign host would.

#![allow(dead_code)]

use std::ffi::{CStr, CString};

use idlbridge::runtime::ffi::{
    idlbridge_get_last_error, idlbridge_last_error_code, idlbridge_release,
    idlbridge_string_create, idlbridge_string_value,
};
use idlbridge::runtime::{Handle, TypedValue};
use idlbridge::taskmanager;

/// Make sure the TaskManager model is registered
pub fn setup() {
    taskmanager::ids().unwrap();
}

/// New boundary string owned by the test
pub fn string(text: &str) -> Handle {
    let text = CString::new(text).unwrap();
    let handle = idlbridge_string_create(text.as_ptr());
    assert!(!handle.is_null(), "string_create failed: {}", last_error());
    handle
}

/// Content of a string handle, then release it
pub fn take_string(handle: Handle) -> String {
    assert!(!handle.is_null(), "expected a string handle: {}", last_error());
    let ptr = idlbridge_string_value(handle);
    let text = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
    release(handle);
    text
}

pub fn release(handle: Handle) {
    assert!(idlbridge_release(handle), "release failed: {}", last_error());
}

pub fn last_error() -> String {
    unsafe { CStr::from_ptr(idlbridge_get_last_error()) }
        .to_str()
        .unwrap()
        .to_string()
}

pub fn last_code() -> i32 {
    idlbridge_last_error_code()
}

pub fn handle_of(value: TypedValue) -> Handle {
    value.as_handle().expect("handle value")
}
