//! C-compatible value representation for dynamic boundary calls
//!
//! `TypedValue` is a tag byte plus an untagged union. The tag is kept as a
//! raw `u8` so a foreign caller writing an unknown tag is reported instead of
//! producing an invalid enum.

use crate::handle::Handle;

/// Boundary-level type of a `TypedValue`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FfiType {
    Void = 0,
    Bool = 1,
    I32 = 2,
    I64 = 3,
    F32 = 4,
    F64 = 5,
    /// Any handle: string, interface or collection
    Handle = 6,
}

impl FfiType {
    #[inline]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Void),
            1 => Some(Self::Bool),
            2 => Some(Self::I32),
            3 => Some(Self::I64),
            4 => Some(Self::F32),
            5 => Some(Self::F64),
            6 => Some(Self::Handle),
            _ => None,
        }
    }

    /// Get size of type in bytes
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Void => 0,
            Self::Bool => 1,
            Self::I32 | Self::F32 => 4,
            Self::I64 | Self::F64 | Self::Handle => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::I32 => "int32_t",
            Self::I64 => "int64_t",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::Handle => "handle",
        }
    }
}

/// FFI value container (untagged union)
#[repr(C)]
#[derive(Clone, Copy)]
pub union FfiValue {
    pub boolean: u8,
    pub i32: i32,
    pub i64: i64,
    pub f32: f32,
    pub f64: f64,
    pub handle: u64,
}

impl Default for FfiValue {
    #[inline]
    fn default() -> Self {
        Self { handle: 0 }
    }
}

impl core::fmt::Debug for FfiValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Every variant is plain old data, so the widest view is always readable
        write!(f, "FfiValue({:#018x})", unsafe { self.handle })
    }
}

/// Tagged value exchanged by `idlbridge_get_property`, `idlbridge_invoke` and
/// collection accessors
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedValue {
    pub tag: u8,
    pub value: FfiValue,
}

impl TypedValue {
    #[inline]
    pub const fn kind(&self) -> Option<FfiType> {
        FfiType::from_raw(self.tag)
    }

    pub const fn void() -> Self {
        Self {
            tag: FfiType::Void as u8,
            value: FfiValue { handle: 0 },
        }
    }

    pub fn bool(v: bool) -> Self {
        let mut value = FfiValue { handle: 0 };
        value.boolean = v as u8;
        Self {
            tag: FfiType::Bool as u8,
            value,
        }
    }

    pub fn i32(v: i32) -> Self {
        // Zero the upper bytes so Debug output stays deterministic
        let mut value = FfiValue { handle: 0 };
        value.i32 = v;
        Self {
            tag: FfiType::I32 as u8,
            value,
        }
    }

    pub const fn i64(v: i64) -> Self {
        Self {
            tag: FfiType::I64 as u8,
            value: FfiValue { i64: v },
        }
    }

    pub fn f32(v: f32) -> Self {
        let mut value = FfiValue { handle: 0 };
        value.f32 = v;
        Self {
            tag: FfiType::F32 as u8,
            value,
        }
    }

    pub const fn f64(v: f64) -> Self {
        Self {
            tag: FfiType::F64 as u8,
            value: FfiValue { f64: v },
        }
    }

    pub const fn handle(h: Handle) -> Self {
        Self {
            tag: FfiType::Handle as u8,
            value: FfiValue { handle: h.0 },
        }
    }

    // Accessors: reading the union is sound for every field because each
    // variant is plain old data; the tag check keeps the meaning right.

    pub fn as_bool(&self) -> Option<bool> {
        (self.kind()? == FfiType::Bool).then(|| unsafe { self.value.boolean != 0 })
    }

    pub fn as_i32(&self) -> Option<i32> {
        (self.kind()? == FfiType::I32).then(|| unsafe { self.value.i32 })
    }

    pub fn as_i64(&self) -> Option<i64> {
        (self.kind()? == FfiType::I64).then(|| unsafe { self.value.i64 })
    }

    pub fn as_f32(&self) -> Option<f32> {
        (self.kind()? == FfiType::F32).then(|| unsafe { self.value.f32 })
    }

    pub fn as_f64(&self) -> Option<f64> {
        (self.kind()? == FfiType::F64).then(|| unsafe { self.value.f64 })
    }

    pub fn as_handle(&self) -> Option<Handle> {
        (self.kind()? == FfiType::Handle).then(|| Handle(unsafe { self.value.handle }))
    }
}
