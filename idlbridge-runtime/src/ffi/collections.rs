//! Boundary collections - C API for arrays, dictionaries and sets
//!
//! `*_new` returns a mutable builder; collections returned by properties and
//! methods are read-only snapshots. Items read out of a collection are new
//! values owned by the caller (handles for strings, objects and nested
//! collections).

use super::guard::boundary;
use super::types::TypedValue;
use super::write_out;
use crate::collection::{Collection, CollectionKind};
use crate::error::{BridgeError, BridgeResult};
use crate::handle::{handles, Handle};
use crate::marshal::{from_boundary_untyped, to_boundary, to_boundary_untyped};
use crate::model::TypeDesc;
use crate::object::{ObjRef, Payload};
use crate::value::Value;

fn new_collection(kind: CollectionKind) -> BridgeResult<Handle> {
    let obj = ObjRef::new(kind.tag(), Payload::Collection(Collection::builder(kind)));
    handles().issue(obj)
}

fn with_collection<R>(
    handle: Handle,
    kind: CollectionKind,
    f: impl FnOnce(&Collection) -> BridgeResult<R>,
) -> BridgeResult<R> {
    let obj = handles().resolve(handle, Some(kind.tag()))?;
    obj.with_payload(|payload| match payload {
        Payload::Collection(c) => f(c),
        _ => Err(BridgeError::type_mismatch(kind.name(), "non-collection object")),
    })?
}

fn release_collection(handle: Handle, kind: CollectionKind) -> BridgeResult<bool> {
    handles().release(handle, Some(kind.tag()))?;
    Ok(true)
}

/// Inbound item for a builder; typed snapshots never reach this path
fn item_in(raw: TypedValue) -> BridgeResult<Value> {
    from_boundary_untyped(raw)
}

fn typed_out(value: Value, ty: Option<&TypeDesc>) -> BridgeResult<TypedValue> {
    match ty {
        Some(ty) => to_boundary(value, ty),
        None => to_boundary_untyped(value),
    }
}

/// Give back a handle issued for a value that never reached the caller
fn discard(value: TypedValue) {
    if let Some(issued) = value.as_handle() {
        let _ = handles().release(issued, None);
    }
}

/// Dictionary keys must be strings or integers
fn key_in(raw: TypedValue) -> BridgeResult<Value> {
    let key = item_in(raw)?;
    match key {
        Value::Str(_) | Value::I32(_) | Value::I64(_) => Ok(key),
        other => Err(BridgeError::invalid_argument(format!(
            "{} cannot be a dictionary key",
            other.kind_name()
        ))),
    }
}

// ============================================================================
// Arrays
// ============================================================================

#[no_mangle]
pub extern "C" fn idlbridge_array_new() -> Handle {
    boundary("idlbridge_array_new", || new_collection(CollectionKind::Array))
}

/// Append a value; handle values are copied, the caller keeps its handle
#[no_mangle]
pub extern "C" fn idlbridge_array_push(handle: Handle, value: TypedValue) -> bool {
    boundary("idlbridge_array_push", || {
        with_collection(handle, CollectionKind::Array, |c| {
            c.push(item_in(value)?)?;
            Ok(true)
        })
    })
}

#[no_mangle]
pub extern "C" fn idlbridge_array_count(handle: Handle) -> usize {
    boundary("idlbridge_array_count", || {
        with_collection(handle, CollectionKind::Array, |c| Ok(c.count()))
    })
}

/// Read the item at `index` into `out`
///
/// # Safety
/// - `out` must be null or valid for a write of one `TypedValue`
#[no_mangle]
pub extern "C" fn idlbridge_array_item(handle: Handle, index: usize, out: *mut TypedValue) -> bool {
    boundary("idlbridge_array_item", || {
        if out.is_null() {
            return Err(BridgeError::invalid_argument("Null output pointer"));
        }
        let value = with_collection(handle, CollectionKind::Array, |c| {
            typed_out(c.item(index)?, c.elem_ty())
        })?;
        write_out(out, value)?;
        Ok(true)
    })
}

#[no_mangle]
pub extern "C" fn idlbridge_array_release(handle: Handle) -> bool {
    boundary("idlbridge_array_release", || {
        release_collection(handle, CollectionKind::Array)
    })
}

// ============================================================================
// Dictionaries
// ============================================================================

#[no_mangle]
pub extern "C" fn idlbridge_dict_new() -> Handle {
    boundary("idlbridge_dict_new", || new_collection(CollectionKind::Dict))
}

/// Insert or replace `key`
#[no_mangle]
pub extern "C" fn idlbridge_dict_insert(handle: Handle, key: TypedValue, value: TypedValue) -> bool {
    boundary("idlbridge_dict_insert", || {
        with_collection(handle, CollectionKind::Dict, |c| {
            c.insert_entry(key_in(key)?, item_in(value)?)?;
            Ok(true)
        })
    })
}

#[no_mangle]
pub extern "C" fn idlbridge_dict_count(handle: Handle) -> usize {
    boundary("idlbridge_dict_count", || {
        with_collection(handle, CollectionKind::Dict, |c| Ok(c.count()))
    })
}

/// Advance the dictionary cursor; false once exhausted
///
/// # Safety
/// - `key_out` and `value_out` must be valid for a write of one `TypedValue`
#[no_mangle]
pub extern "C" fn idlbridge_dict_next(
    handle: Handle,
    key_out: *mut TypedValue,
    value_out: *mut TypedValue,
) -> bool {
    boundary("idlbridge_dict_next", || {
        if key_out.is_null() || value_out.is_null() {
            return Err(BridgeError::invalid_argument("Null output pointer"));
        }
        let entry = with_collection(handle, CollectionKind::Dict, |c| {
            c.next_with(|key, value| {
                let key = typed_out(key.unwrap_or_default(), c.key_ty())?;
                match typed_out(value, c.elem_ty()) {
                    Ok(value) => Ok((key, value)),
                    Err(err) => {
                        discard(key);
                        Err(err)
                    }
                }
            })
        })?;

        match entry {
            Some((key, value)) => {
                write_out(key_out, key)?;
                write_out(value_out, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    })
}

#[no_mangle]
pub extern "C" fn idlbridge_dict_reset(handle: Handle) -> bool {
    boundary("idlbridge_dict_reset", || {
        with_collection(handle, CollectionKind::Dict, |c| {
            c.reset();
            Ok(true)
        })
    })
}

#[no_mangle]
pub extern "C" fn idlbridge_dict_release(handle: Handle) -> bool {
    boundary("idlbridge_dict_release", || {
        release_collection(handle, CollectionKind::Dict)
    })
}

// ============================================================================
// Sets
// ============================================================================

#[no_mangle]
pub extern "C" fn idlbridge_set_new() -> Handle {
    boundary("idlbridge_set_new", || new_collection(CollectionKind::Set))
}

/// Add a value; false (with no error) when already present
#[no_mangle]
pub extern "C" fn idlbridge_set_insert(handle: Handle, value: TypedValue) -> bool {
    boundary("idlbridge_set_insert", || {
        with_collection(handle, CollectionKind::Set, |c| c.insert(item_in(value)?))
    })
}

#[no_mangle]
pub extern "C" fn idlbridge_set_count(handle: Handle) -> usize {
    boundary("idlbridge_set_count", || {
        with_collection(handle, CollectionKind::Set, |c| Ok(c.count()))
    })
}

/// Advance the set cursor; false once exhausted
///
/// # Safety
/// - `out` must be valid for a write of one `TypedValue`
#[no_mangle]
pub extern "C" fn idlbridge_set_next(handle: Handle, out: *mut TypedValue) -> bool {
    boundary("idlbridge_set_next", || {
        if out.is_null() {
            return Err(BridgeError::invalid_argument("Null output pointer"));
        }
        let item = with_collection(handle, CollectionKind::Set, |c| {
            c.next_with(|_, value| typed_out(value, c.elem_ty()))
        })?;

        match item {
            Some(value) => {
                write_out(out, value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    })
}

#[no_mangle]
pub extern "C" fn idlbridge_set_reset(handle: Handle) -> bool {
    boundary("idlbridge_set_reset", || {
        with_collection(handle, CollectionKind::Set, |c| {
            c.reset();
            Ok(true)
        })
    })
}

#[no_mangle]
pub extern "C" fn idlbridge_set_release(handle: Handle) -> bool {
    boundary("idlbridge_set_release", || {
        release_collection(handle, CollectionKind::Set)
    })
}
