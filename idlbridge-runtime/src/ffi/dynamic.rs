//! Dynamic property and method access over tagged values
//!
//! For hosts without generated bindings. The interface is taken from the
//! handle itself; member names and argument tags are checked against the
//! registered descriptor.

use std::os::raw::c_char;
use std::slice;

use super::guard::boundary;
use super::types::TypedValue;
use super::{c_str, write_out};
use crate::error::BridgeError;
use crate::handle::{handles, Handle};
use crate::invoke;

/// Read a property into `out`
///
/// # Safety
/// - `name` must be null or a NUL-terminated string
/// - `out` must be null or valid for a write of one `TypedValue`
#[no_mangle]
pub extern "C" fn idlbridge_get_property(
    handle: Handle,
    name: *const c_char,
    out: *mut TypedValue,
) -> bool {
    boundary("idlbridge_get_property", || {
        let iface = invoke::interface_of(handle)?;
        let name = c_str(name, "property name")?;
        if out.is_null() {
            return Err(BridgeError::invalid_argument("Null output pointer"));
        }
        write_out(out, invoke::get_property(handle, iface, name)?)?;
        Ok(true)
    })
}

/// Write a property; handle values are copied, the caller keeps its handle
///
/// # Safety
/// - `name` must be null or a NUL-terminated string
#[no_mangle]
pub extern "C" fn idlbridge_set_property(
    handle: Handle,
    name: *const c_char,
    value: TypedValue,
) -> bool {
    boundary("idlbridge_set_property", || {
        let iface = invoke::interface_of(handle)?;
        let name = c_str(name, "property name")?;
        invoke::set_property(handle, iface, name, value)?;
        Ok(true)
    })
}

/// Call a method with `argc` arguments
///
/// When `out` is null the result is discarded (and released if it is a
/// handle).
///
/// # Safety
/// - `method` must be null or a NUL-terminated string
/// - `args` must point to `argc` readable `TypedValue`s (may be null when
///   `argc` is 0)
/// - `out` must be null or valid for a write of one `TypedValue`
#[no_mangle]
pub extern "C" fn idlbridge_invoke(
    handle: Handle,
    method: *const c_char,
    args: *const TypedValue,
    argc: usize,
    out: *mut TypedValue,
) -> bool {
    boundary("idlbridge_invoke", || {
        let iface = invoke::interface_of(handle)?;
        let method = c_str(method, "method name")?;
        let args: &[TypedValue] = if argc == 0 {
            &[]
        } else if args.is_null() {
            return Err(BridgeError::invalid_argument("Null argument array"));
        } else {
            unsafe { slice::from_raw_parts(args, argc) }
        };

        let result = invoke::call_method(handle, iface, method, args)?;
        if out.is_null() {
            if let Some(returned) = result.as_handle() {
                handles().release(returned, None)?;
            }
        } else {
            write_out(out, result)?;
        }
        Ok(true)
    })
}
