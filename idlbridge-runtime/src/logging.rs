//! Logging infrastructure - structured tracing throughout the runtime
//!
//! Design: `tracing` events under `idlbridge_runtime::*` targets so hosts can
//! filter them:
//! - `handles` for handle issue and release
//! - `objects` for managed object destruction
//! - `boundary` for entry point calls and failures
//! - `model` for interface model registration
//!
//! The runtime never installs a subscriber on its own. Hosts call `init` (or
//! `idlbridge_runtime_init` over the C ABI) when they want output.

use once_cell::sync::OnceCell;
use std::io;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub use tracing::{debug, error, info, trace, warn};

static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Emit JSON lines instead of human-readable text
    pub json_format: bool,
    /// Show span enter/close events
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Build config from `IDLBRIDGE_LOG_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // IDLBRIDGE_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level) = std::env::var("IDLBRIDGE_LOG_LEVEL") {
            config.level = parse_level(&level).unwrap_or(Level::WARN);
        }

        config.json_format = std::env::var("IDLBRIDGE_LOG_JSON").is_ok();
        config.show_spans = std::env::var("IDLBRIDGE_LOG_SPANS").is_ok();

        config
    }

    /// Verbose config for debugging a binding
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            json_format: false,
            show_spans: true,
        }
    }
}

pub fn parse_level(text: &str) -> Option<Level> {
    match text.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize logging from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging once; later calls and foreign subscribers win silently
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "idlbridge_runtime={}",
                config.level.as_str().to_lowercase()
            ))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let result = if config.json_format {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_span_events(span_events)
                        .with_target(true),
                )
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(io::stderr)
                        .with_span_events(span_events)
                        .with_target(true)
                        .with_thread_ids(cfg!(debug_assertions)),
                )
                .try_init()
        };

        // A host-installed subscriber takes precedence
        let _ = result;
    });
}

pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

// ============================================================================
// Runtime-specific logging functions
// ============================================================================

#[inline]
pub fn log_handle_issued(handle: u64, tag: &str, object: u64) {
    trace!(
        target: "idlbridge_runtime::handles",
        handle,
        tag,
        object,
        "handle issued"
    );
}

#[inline]
pub fn log_handle_released(handle: u64, object: u64, remaining: i32) {
    trace!(
        target: "idlbridge_runtime::handles",
        handle,
        object,
        remaining,
        "handle released"
    );
}

#[inline]
pub fn log_object_destroyed(object: u64, tag: &str) {
    debug!(target: "idlbridge_runtime::objects", object, tag, "managed object destroyed");
}

#[inline]
pub fn log_boundary_call(operation: &str) {
    trace!(target: "idlbridge_runtime::boundary", operation, "boundary call");
}

pub fn log_boundary_error(operation: &str, error: &str) {
    warn!(target: "idlbridge_runtime::boundary", operation, error, "boundary call failed");
}

pub fn log_native_panic(operation: &str, message: &str) {
    error!(
        target: "idlbridge_runtime::boundary",
        operation,
        panic = message,
        "native implementation panicked"
    );
}

pub fn log_model_loaded(namespace: &str, interfaces: usize, enums: usize) {
    debug!(
        target: "idlbridge_runtime::model",
        namespace,
        interfaces,
        enums,
        "interface model registered"
    );
}

pub fn log_runtime_init() {
    info!(target: "idlbridge_runtime::boundary", version = env!("CARGO_PKG_VERSION"), "runtime initialized");
}

pub fn log_runtime_shutdown(live_handles: usize) {
    if live_handles > 0 {
        warn!(
            target: "idlbridge_runtime::boundary",
            live_handles,
            "runtime cleanup with outstanding handles"
        );
    } else {
        info!(target: "idlbridge_runtime::boundary", "runtime cleanup");
    }
}
