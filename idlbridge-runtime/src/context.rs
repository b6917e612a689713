//! Per-thread last-error slot
//!
//! Each boundary call writes exactly one outcome here: cleared on success,
//! set on failure. The message is kept NUL-terminated so a pointer to it can
//! be lent to the caller until the next call on the same thread.

use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

use crate::error::{BridgeError, ErrorCode};

struct CallContext {
    code: ErrorCode,
    message: CString,
}

impl CallContext {
    fn new() -> Self {
        Self {
            code: ErrorCode::None,
            message: CString::default(),
        }
    }
}

thread_local! {
    static LAST_ERROR: RefCell<CallContext> = RefCell::new(CallContext::new());
}

pub fn set_last_error(err: &BridgeError) {
    let text = err.to_string().replace('\0', "\\0");
    let message = CString::new(text).unwrap_or_default();

    LAST_ERROR.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        ctx.code = err.code();
        ctx.message = message;
    });
}

pub fn clear_last_error() {
    LAST_ERROR.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        if ctx.code != ErrorCode::None {
            ctx.code = ErrorCode::None;
            ctx.message = CString::default();
        }
    });
}

/// Last error message on this thread; empty when the last call succeeded
pub fn last_error_message() -> String {
    LAST_ERROR.with(|ctx| ctx.borrow().message.to_string_lossy().into_owned())
}

pub fn last_error_code() -> ErrorCode {
    LAST_ERROR.with(|ctx| ctx.borrow().code)
}

/// Pointer to the thread's message, valid until the next boundary call on
/// this thread
pub fn last_error_ptr() -> *const c_char {
    // The CString's heap buffer outlives the borrow; it is only replaced by
    // the next set/clear on this same thread.
    LAST_ERROR.with(|ctx| ctx.borrow().message.as_ptr())
}
