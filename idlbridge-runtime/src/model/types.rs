//! Resolved type descriptors
//!
//! `TypeDesc` is what the marshalling layer works against. Every interface or
//! enum it mentions is already registered, so marshalling never meets an
//! unresolved name.

use std::fmt;

use crate::ffi::FfiType;

/// Index of a registered interface descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceId(pub(crate) u32);

impl InterfaceId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interface#{}", self.0)
    }
}

/// Index of a registered enum descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub(crate) u32);

impl EnumId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EnumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enum#{}", self.0)
    }
}

/// Underlying integer width of an enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumBacking {
    I32,
    I64,
}

impl EnumBacking {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "int32_t" => Some(Self::I32),
            "int64_t" => Some(Self::I64),
            _ => None,
        }
    }

    pub const fn ffi_type(self) -> FfiType {
        match self {
            Self::I32 => FfiType::I32,
            Self::I64 => FfiType::I64,
        }
    }

    pub const fn contains(self, value: i64) -> bool {
        match self {
            Self::I32 => value >= i32::MIN as i64 && value <= i32::MAX as i64,
            Self::I64 => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    Void,
    Bool,
    I32,
    I64,
    F32,
    F64,
    String,
    Enum(EnumId),
    Interface(InterfaceId),
    Array(Box<TypeDesc>),
    Dict(Box<TypeDesc>, Box<TypeDesc>),
    Set(Box<TypeDesc>),
}

impl TypeDesc {
    /// Primitive named by its IDL spelling
    pub fn primitive(name: &str) -> Option<Self> {
        match name {
            "void" => Some(Self::Void),
            "bool" => Some(Self::Bool),
            "int32_t" => Some(Self::I32),
            "int64_t" => Some(Self::I64),
            "float" => Some(Self::F32),
            "double" => Some(Self::F64),
            "string_t" => Some(Self::String),
            _ => None,
        }
    }

    /// Types that cross the boundary as handles
    pub const fn is_handle(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Interface(_) | Self::Array(_) | Self::Dict(..) | Self::Set(_)
        )
    }

    /// Types usable as dictionary keys
    pub const fn is_key(&self) -> bool {
        matches!(self, Self::String | Self::I32 | Self::I64 | Self::Enum(_))
    }

    pub fn contains_void(&self) -> bool {
        match self {
            Self::Void => true,
            Self::Array(inner) | Self::Set(inner) => inner.contains_void(),
            Self::Dict(key, value) => key.contains_void() || value.contains_void(),
            _ => false,
        }
    }
}
