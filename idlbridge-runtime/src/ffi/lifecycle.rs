//! Object lifecycle - C API for creation and reference counting
//!
//! Every handle owns one reference. `idlbridge_add_ref` hands out a second
//! handle for the same object; each handle is released exactly once.

use std::os::raw::c_char;

use super::c_str;
use super::guard::boundary;
use crate::error::BridgeError;
use crate::handle::{handles, Handle};
use crate::invoke;
use crate::model::registry;

/// Create an object through the named interface's factory
///
/// # Safety
/// - `interface` must be null or a NUL-terminated string
#[no_mangle]
pub extern "C" fn idlbridge_create(interface: *const c_char) -> Handle {
    boundary("idlbridge_create", || {
        let name = c_str(interface, "interface name")?;
        let desc = registry().interface_by_name(name).ok_or_else(|| {
            BridgeError::invalid_argument(format!("unknown interface '{}'", name))
        })?;
        invoke::create(desc.id)
    })
}

/// Take another reference; returns a new handle for the same object
#[no_mangle]
pub extern "C" fn idlbridge_add_ref(handle: Handle) -> Handle {
    boundary("idlbridge_add_ref", || handles().duplicate(handle, None))
}

/// Release the handle's reference; false on invalid or repeated release
#[no_mangle]
pub extern "C" fn idlbridge_release(handle: Handle) -> bool {
    boundary("idlbridge_release", || {
        handles().release(handle, None)?;
        Ok(true)
    })
}

/// Current reference count (for debugging/testing); 0 for invalid handles
#[no_mangle]
pub extern "C" fn idlbridge_refcount(handle: Handle) -> i32 {
    boundary("idlbridge_refcount", || handles().refcount(handle, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{last_error_code, last_error_message};
    use crate::error::ErrorCode;
    use std::ffi::CString;

    #[test]
    fn test_create_unknown_interface() {
        let name = CString::new("INoSuchInterface").unwrap();
        assert!(idlbridge_create(name.as_ptr()).is_null());
        assert_eq!(last_error_code(), ErrorCode::InvalidArgument);
        assert_eq!(
            last_error_message(),
            "InvalidArgument: unknown interface 'INoSuchInterface'"
        );

        assert!(idlbridge_create(std::ptr::null()).is_null());
        assert_eq!(last_error_message(), "InvalidArgument: Null interface name");
    }

    #[test]
    fn test_null_handle() {
        assert!(!idlbridge_release(Handle::NULL));
        assert_eq!(last_error_message(), "InvalidHandle: Null handle");
        assert_eq!(idlbridge_refcount(Handle::NULL), 0);
        assert!(idlbridge_add_ref(Handle::NULL).is_null());
    }
}
