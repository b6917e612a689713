//! Runtime options pushed in by the host
//!
//! Kept in atomics so every boundary call can read them without locking.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeOptions {
    /// Maximum number of simultaneously live handles; 0 means unlimited
    pub max_live_handles: usize,
    /// Emit a trace event for every boundary call
    pub trace_calls: bool,
}

static MAX_LIVE_HANDLES: AtomicUsize = AtomicUsize::new(0);
static TRACE_CALLS: AtomicBool = AtomicBool::new(false);

pub fn configure(options: RuntimeOptions) {
    MAX_LIVE_HANDLES.store(options.max_live_handles, Ordering::Relaxed);
    TRACE_CALLS.store(options.trace_calls, Ordering::Relaxed);
}

pub fn options() -> RuntimeOptions {
    RuntimeOptions {
        max_live_handles: MAX_LIVE_HANDLES.load(Ordering::Relaxed),
        trace_calls: TRACE_CALLS.load(Ordering::Relaxed),
    }
}

#[inline]
pub(crate) fn max_live_handles() -> usize {
    MAX_LIVE_HANDLES.load(Ordering::Relaxed)
}

#[inline]
pub(crate) fn trace_calls() -> bool {
    TRACE_CALLS.load(Ordering::Relaxed)
}
