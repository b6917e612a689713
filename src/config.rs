//! `idlbridge.toml` configuration
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "compact"
//! output = "file"
//! directory = "logs"
//!
//! [runtime]
//! max_live_handles = 100000
//! trace_calls = true
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Level;

use crate::logging::{invalid_directives, LogConfig, LogFormat, LogOutput};
use idlbridge_runtime::RuntimeOptions;

pub const CONFIG_FILE: &str = "idlbridge.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: OutputKind,

    /// Directory for `output = "file"`
    #[serde(default = "default_directory")]
    pub directory: String,

    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub span_events: bool,

    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Stdout,
    #[default]
    Stderr,
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 0 disables the limit
    #[serde(default)]
    pub max_live_handles: usize,

    #[serde(default)]
    pub trace_calls: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            output: OutputKind::default(),
            directory: default_directory(),
            prefix: default_prefix(),
            span_events: false,
            filter: None,
        }
    }
}

fn default_level() -> String { "info".to_string() }
fn default_directory() -> String { "logs".to_string() }
fn default_prefix() -> String { "idlbridge".to_string() }

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(String),
    InvalidLevel(String),
    InvalidFilter(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Failed to read config {}: {}", path.display(), source)
            }
            Self::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
            Self::InvalidLevel(level) => write!(f, "Invalid log level '{}'", level),
            Self::InvalidFilter(directives) => {
                write!(f, "Invalid filter directive(s): {}", directives.join(", "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// First `idlbridge.toml` in the current directory or its parents
    pub fn discover() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        Self::discover_from(&cwd)
    }

    pub fn discover_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            max_live_handles: self.runtime.max_live_handles,
            trace_calls: self.runtime.trace_calls,
        }
    }

    /// Push the `[runtime]` section into the runtime
    pub fn apply(&self) {
        idlbridge_runtime::configure(self.runtime_options());
    }

    /// Host logging settings from the `[logging]` section
    pub fn log_config(&self) -> Result<LogConfig, ConfigError> {
        let logging = &self.logging;
        let level = Level::from_str(&logging.level)
            .map_err(|_| ConfigError::InvalidLevel(logging.level.clone()))?;

        if let Some(filter) = &logging.filter {
            let invalid = invalid_directives(filter);
            if !invalid.is_empty() {
                return Err(ConfigError::InvalidFilter(invalid));
            }
        }

        let output = match logging.output {
            OutputKind::Stdout => LogOutput::Stdout,
            OutputKind::Stderr => LogOutput::Stderr,
            OutputKind::File => LogOutput::File {
                directory: logging.directory.clone(),
                prefix: logging.prefix.clone(),
            },
        };

        Ok(LogConfig {
            level,
            format: logging.format,
            output,
            span_events: logging.span_events,
            filter: logging.filter.clone(),
        })
    }
}
