//! idlbridge - boundary bindings for IDL-described interfaces
//!
//! The runtime (`idlbridge-runtime`) owns handles, marshalling and dispatch.
//! This crate adds what a host needs around it:
//! - `config` - `idlbridge.toml` loading and application
//! - `logging` - subscriber setup with file rotation
//! - `symbols` - the C entry points a model implies
//! - `taskmanager` - reference binding for the TaskManager model
//!
//! Built as a `cdylib`, the library exports the runtime's `idlbridge_*` API
//! together with the TaskManager entry points.

pub mod config;
pub mod logging;
pub mod symbols;
pub mod taskmanager;

pub use config::{BridgeConfig, ConfigError};
pub use logging::{init_cli_logging, init_logging, LogConfig, LogFormat, LogOutput};
pub use symbols::{interface_symbols, namespace_symbols, BoundarySymbol};

pub use idlbridge_runtime as runtime;

use tracing_appender::non_blocking::WorkerGuard;

/// Apply `config`: runtime options first, then the global subscriber
///
/// Hosts call this once at startup and keep the returned guard alive.
pub fn init_from_config(config: &BridgeConfig) -> Result<Option<WorkerGuard>, ConfigError> {
    let log_config = config.log_config()?;
    config.apply();
    let guard = init_logging(log_config);
    tracing::info!(
        max_live_handles = config.runtime.max_live_handles,
        trace_calls = config.runtime.trace_calls,
        "idlbridge configured"
    );
    Ok(guard)
}
