//! Boundary error taxonomy
//!
//! Every failure that can cross the boundary is a `BridgeError`. At the C ABI
//! it collapses into a numeric `ErrorCode` plus a message in the calling
//! thread's last-error slot; inside the runtime it travels as a `Result`.

use std::fmt;

/// Numeric error codes exposed through `idlbridge_last_error_code`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum ErrorCode {
    #[default]
    None = 0,
    InvalidHandle = 1,
    TypeMismatch = 2,
    InvalidEnumValue = 3,
    IndexOutOfBounds = 4,
    DomainFailure = 5,
    DoubleRelease = 6,
    InvalidArgument = 7,
    HandleLimit = 8,
}

impl ErrorCode {
    /// Kind name used as the prefix of every last-error message
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::InvalidHandle => "InvalidHandle",
            Self::TypeMismatch => "TypeMismatch",
            Self::InvalidEnumValue => "InvalidEnumValue",
            Self::IndexOutOfBounds => "IndexOutOfBounds",
            Self::DomainFailure => "DomainFailure",
            Self::DoubleRelease => "DoubleRelease",
            Self::InvalidArgument => "InvalidArgument",
            Self::HandleLimit => "HandleLimit",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    NullHandle,
    UnknownHandle { handle: u64 },
    StaleHandle { handle: u64 },
    ObjectDestroyed { object: u64 },
    TypeMismatch { expected: String, found: String },
    InvalidEnumValue { enum_name: String, value: i64 },
    IndexOutOfBounds { index: usize, count: usize },
    Domain { message: String },
    Panic { message: String },
    DoubleRelease { handle: u64 },
    OverRelease { object: u64 },
    InvalidArgument { message: String },
    HandleLimit { limit: usize },
}

impl BridgeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NullHandle
            | Self::UnknownHandle { .. }
            | Self::StaleHandle { .. }
            | Self::ObjectDestroyed { .. } => ErrorCode::InvalidHandle,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::InvalidEnumValue { .. } => ErrorCode::InvalidEnumValue,
            Self::IndexOutOfBounds { .. } => ErrorCode::IndexOutOfBounds,
            Self::Domain { .. } | Self::Panic { .. } => ErrorCode::DomainFailure,
            Self::DoubleRelease { .. } | Self::OverRelease { .. } => ErrorCode::DoubleRelease,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::HandleLimit { .. } => ErrorCode::HandleLimit,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain { message: message.into() }
    }

    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.code())?;
        match self {
            Self::NullHandle => write!(f, "Null handle"),
            Self::UnknownHandle { handle } => {
                write!(f, "handle {:#018x} was never issued", handle)
            }
            Self::StaleHandle { handle } => {
                write!(f, "handle {:#018x} has already been released", handle)
            }
            Self::ObjectDestroyed { object } => {
                write!(f, "object #{} has been destroyed", object)
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            Self::InvalidEnumValue { enum_name, value } => {
                write!(f, "{} is not a declared enumerator of {}", value, enum_name)
            }
            Self::IndexOutOfBounds { index, count } => {
                write!(f, "index {} out of bounds for collection of {}", index, count)
            }
            Self::Domain { message } => write!(f, "{}", message),
            Self::Panic { message } => {
                write!(f, "native implementation panicked: {}", message)
            }
            Self::DoubleRelease { handle } => {
                write!(f, "handle {:#018x} released twice", handle)
            }
            Self::OverRelease { object } => {
                write!(f, "object #{} released more times than it was referenced", object)
            }
            Self::InvalidArgument { message } => write!(f, "{}", message),
            Self::HandleLimit { limit } => {
                write!(f, "live handle limit of {} reached", limit)
            }
        }
    }
}

impl std::error::Error for BridgeError {}

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Business-rule failure reported by a native implementation
///
/// Implementations return this from their capability methods; the invocation
/// layer turns it into `ErrorCode::DomainFailure` at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainError {
    message: String,
}

impl DomainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn unknown_member(interface: &str, member: &str) -> Self {
        Self::new(format!("{} has no member '{}'", interface, member))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DomainError {}

impl From<DomainError> for BridgeError {
    fn from(err: DomainError) -> Self {
        Self::Domain { message: err.message }
    }
}
