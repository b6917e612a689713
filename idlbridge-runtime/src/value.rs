//! Native-side values exchanged with `BoundaryObject` implementations
//!
//! Implementations never see handles. Strings arrive as owned `String`s,
//! collections as plain vectors and interface references as `ObjRef`s.

use smallvec::SmallVec;

use crate::error::DomainError;
use crate::object::ObjRef;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Void,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    /// Backing integer of a declared enumerator
    Enum(i64),
    Object(ObjRef),
    Array(Vec<Value>),
    /// Entries in insertion order
    Dict(Vec<(Value, Value)>),
    Set(Vec<Value>),
}

/// Method arguments, inline for the common short case
pub type Args = SmallVec<[Value; 4]>;

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool(_) => "bool",
            Self::I32(_) => "int32_t",
            Self::I64(_) => "int64_t",
            Self::F32(_) => "float",
            Self::F64(_) => "double",
            Self::Str(_) => "string_t",
            Self::Enum(_) => "enum",
            Self::Object(_) => "interface",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Set(_) => "set",
        }
    }

    fn unexpected(&self, expected: &str) -> DomainError {
        DomainError::new(format!("expected {} value, found {}", expected, self.kind_name()))
    }

    pub fn as_bool(&self) -> Result<bool, DomainError> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(other.unexpected("bool")),
        }
    }

    pub fn as_i32(&self) -> Result<i32, DomainError> {
        match self {
            Self::I32(v) => Ok(*v),
            Self::Enum(v) => i32::try_from(*v).map_err(|_| self.unexpected("int32_t")),
            other => Err(other.unexpected("int32_t")),
        }
    }

    pub fn as_i64(&self) -> Result<i64, DomainError> {
        match self {
            Self::I32(v) => Ok(*v as i64),
            Self::I64(v) | Self::Enum(v) => Ok(*v),
            other => Err(other.unexpected("int64_t")),
        }
    }

    pub fn as_f64(&self) -> Result<f64, DomainError> {
        match self {
            Self::F32(v) => Ok(*v as f64),
            Self::F64(v) => Ok(*v),
            other => Err(other.unexpected("double")),
        }
    }

    pub fn as_enum(&self) -> Result<i64, DomainError> {
        match self {
            Self::Enum(v) => Ok(*v),
            other => Err(other.unexpected("enum")),
        }
    }

    pub fn as_str(&self) -> Result<&str, DomainError> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(other.unexpected("string_t")),
        }
    }

    pub fn into_string(self) -> Result<String, DomainError> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(other.unexpected("string_t")),
        }
    }

    pub fn into_object(self) -> Result<ObjRef, DomainError> {
        match self {
            Self::Object(obj) => Ok(obj),
            other => Err(other.unexpected("interface")),
        }
    }

    pub fn into_array(self) -> Result<Vec<Value>, DomainError> {
        match self {
            Self::Array(items) => Ok(items),
            other => Err(other.unexpected("array")),
        }
    }

    pub fn into_dict(self) -> Result<Vec<(Value, Value)>, DomainError> {
        match self {
            Self::Dict(entries) => Ok(entries),
            other => Err(other.unexpected("dict")),
        }
    }

    pub fn into_set(self) -> Result<Vec<Value>, DomainError> {
        match self {
            Self::Set(items) => Ok(items),
            other => Err(other.unexpected("set")),
        }
    }

    /// Structural equality used for set membership and dictionary keys
    ///
    /// Objects compare by identity. Floats compare bitwise so a set never
    /// holds two NaNs with the same payload.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Void, Self::Void) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) | (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Array(a), Self::Array(b)) | (Self::Set(a), Self::Set(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same(y))
            }
            (Self::Dict(a), Self::Dict(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka.same(kb) && va.same(vb))
            }
            _ => false,
        }
    }
}

/// Positional argument, reporting a domain failure when missing
pub fn arg(args: &Args, index: usize) -> Result<&Value, DomainError> {
    args.get(index)
        .ok_or_else(|| DomainError::new(format!("missing argument {}", index)))
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<ObjRef> for Value {
    fn from(v: ObjRef) -> Self {
        Self::Object(v)
    }
}
