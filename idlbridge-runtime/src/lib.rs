//! idlbridge runtime - handle-based C ABI for IDL-described interfaces
//!
//! This crate is linked into every generated binding. It owns the pieces
//! that do not depend on a particular interface:
//! - the interface model registry (`model`)
//! - reference-counted managed objects and the handle table
//! - marshalling between boundary values and native values
//! - descriptor-checked dispatch (`invoke`)
//! - the per-thread last-error channel and the boundary guard
//!
//! Native implementations plug in through the `BoundaryObject` trait.

pub mod collection;
pub mod context;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod invoke;
pub mod logging;
pub mod marshal;
pub mod model;
pub mod object;
pub mod options;
pub mod stats;
pub mod string;
pub mod value;

pub use error::{BridgeError, BridgeResult, DomainError, ErrorCode};
pub use ffi::{boundary, FfiType, TypedValue};
pub use handle::{handles, Handle};
pub use model::{registry, InterfaceId, InterfaceModel, LoadedModel, ModelError, TypeDesc};
pub use object::{BoundaryObject, ObjRef, TypeTag};
pub use options::{configure, options, RuntimeOptions};
pub use stats::{stats, InteropStats};
pub use value::{arg, Args, Value};

/// Runtime initialization: installs logging from `IDLBRIDGE_LOG_*`
#[no_mangle]
pub extern "C" fn idlbridge_runtime_init() {
    boundary("idlbridge_runtime_init", || {
        logging::init();
        logging::log_runtime_init();
        Ok(())
    })
}

/// Runtime cleanup: reports handles the host never released
#[no_mangle]
pub extern "C" fn idlbridge_runtime_cleanup() {
    boundary("idlbridge_runtime_cleanup", || {
        logging::log_runtime_shutdown(handles().live());
        Ok(())
    })
}

/// Number of live handles across all threads
#[no_mangle]
pub extern "C" fn idlbridge_live_handles() -> usize {
    boundary("idlbridge_live_handles", || Ok(handles().live()))
}
