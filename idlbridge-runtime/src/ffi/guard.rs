//! Boundary guard - one outcome per entry point, no unwinding across it
//!
//! Every exported function runs its body through `boundary`. A successful
//! body clears the thread's last error; an error or a caught panic records
//! the message and returns the type's sentinel value.

use std::any::Any;
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use super::types::TypedValue;
use crate::context::{clear_last_error, set_last_error};
use crate::error::{BridgeError, BridgeResult};
use crate::handle::Handle;
use crate::logging::{log_boundary_call, log_boundary_error, log_native_panic};
use crate::options;
use crate::stats::{bump, COUNTERS};

/// Value returned by an entry point that failed
pub trait Sentinel {
    fn sentinel() -> Self;
}

impl Sentinel for () {
    fn sentinel() -> Self {}
}

impl Sentinel for bool {
    fn sentinel() -> Self {
        false
    }
}

impl Sentinel for i32 {
    fn sentinel() -> Self {
        0
    }
}

impl Sentinel for i64 {
    fn sentinel() -> Self {
        0
    }
}

impl Sentinel for usize {
    fn sentinel() -> Self {
        0
    }
}

impl Sentinel for f32 {
    fn sentinel() -> Self {
        0.0
    }
}

impl Sentinel for f64 {
    fn sentinel() -> Self {
        0.0
    }
}

impl Sentinel for Handle {
    fn sentinel() -> Self {
        Handle::NULL
    }
}

impl Sentinel for *const c_char {
    fn sentinel() -> Self {
        ptr::null()
    }
}

impl Sentinel for TypedValue {
    fn sentinel() -> Self {
        TypedValue::void()
    }
}

/// Run `body` as the entry point `operation`
pub fn boundary<T: Sentinel>(operation: &'static str, body: impl FnOnce() -> BridgeResult<T>) -> T {
    bump(&COUNTERS.calls_made);
    if options::trace_calls() {
        log_boundary_call(operation);
    }

    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(value)) => {
            clear_last_error();
            value
        }
        Ok(Err(err)) => {
            bump(&COUNTERS.failed_calls);
            log_boundary_error(operation, &err.to_string());
            set_last_error(&err);
            T::sentinel()
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            bump(&COUNTERS.failed_calls);
            bump(&COUNTERS.panics_caught);
            log_native_panic(operation, &message);
            set_last_error(&BridgeError::Panic { message });
            T::sentinel()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
