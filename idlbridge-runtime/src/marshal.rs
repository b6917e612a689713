//! Type marshalling - boundary `TypedValue`s <-> native `Value`s
//!
//! Design: the descriptor type drives every conversion.
//! - Outbound strings, collections and interface references become fresh
//!   handles owned by the caller
//! - Inbound handles are resolved and copied; the caller keeps its handle
//! - Enum values are checked against the declared enumerators on the way in
//!   and on the way out

use crate::collection::Collection;
use crate::error::{BridgeError, BridgeResult};
use crate::ffi::{FfiType, TypedValue};
use crate::handle::{handles, Handle};
use crate::model::{registry, TypeDesc};
use crate::object::{ObjRef, Payload, TypeTag};
use crate::string::{new_string_handle, string_content};
use crate::value::Value;

/// Boundary representation of a declared type
pub fn boundary_type(ty: &TypeDesc) -> FfiType {
    match ty {
        TypeDesc::Void => FfiType::Void,
        TypeDesc::Bool => FfiType::Bool,
        TypeDesc::I32 => FfiType::I32,
        TypeDesc::I64 => FfiType::I64,
        TypeDesc::F32 => FfiType::F32,
        TypeDesc::F64 => FfiType::F64,
        TypeDesc::Enum(id) => registry()
            .enum_desc(*id)
            .map(|e| e.backing.ffi_type())
            .unwrap_or(FfiType::I32),
        TypeDesc::String
        | TypeDesc::Interface(_)
        | TypeDesc::Array(_)
        | TypeDesc::Dict(..)
        | TypeDesc::Set(_) => FfiType::Handle,
    }
}

/// Handle tag a declared handle type resolves against
pub fn handle_tag(ty: &TypeDesc) -> Option<TypeTag> {
    match ty {
        TypeDesc::String => Some(TypeTag::String),
        TypeDesc::Interface(id) => Some(TypeTag::Interface(*id)),
        TypeDesc::Array(_) => Some(TypeTag::Array),
        TypeDesc::Dict(..) => Some(TypeTag::Dict),
        TypeDesc::Set(_) => Some(TypeTag::Set),
        _ => None,
    }
}

fn returned(value: &Value, ty: &TypeDesc) -> BridgeError {
    BridgeError::domain(format!(
        "implementation returned {} where {} was declared",
        value.kind_name(),
        registry().type_name(ty)
    ))
}

fn check_enum(ty: &TypeDesc, value: i64) -> BridgeResult<i64> {
    let TypeDesc::Enum(id) = ty else {
        return Ok(value);
    };
    let desc = registry()
        .enum_desc(*id)
        .ok_or_else(|| BridgeError::invalid_argument(format!("unregistered {}", id)))?;

    if desc.contains(value) {
        Ok(value)
    } else {
        Err(BridgeError::InvalidEnumValue {
            enum_name: desc.name.clone(),
            value,
        })
    }
}

/// Native value -> boundary value, issuing handles where the type needs one
pub fn to_boundary(value: Value, ty: &TypeDesc) -> BridgeResult<TypedValue> {
    let out = match (ty, value) {
        (TypeDesc::Void, _) => TypedValue::void(),
        (TypeDesc::Bool, Value::Bool(v)) => TypedValue::bool(v),
        (TypeDesc::I32, Value::I32(v)) => TypedValue::i32(v),
        (TypeDesc::I64, Value::I32(v)) => TypedValue::i64(v as i64),
        (TypeDesc::I64, Value::I64(v)) => TypedValue::i64(v),
        (TypeDesc::F32, Value::F32(v)) => TypedValue::f32(v),
        (TypeDesc::F64, Value::F32(v)) => TypedValue::f64(v as f64),
        (TypeDesc::F64, Value::F64(v)) => TypedValue::f64(v),
        (TypeDesc::Enum(_), Value::Enum(v) | Value::I64(v)) => enum_out(ty, v)?,
        (TypeDesc::Enum(_), Value::I32(v)) => enum_out(ty, v as i64)?,
        (TypeDesc::String, Value::Str(s)) => TypedValue::handle(new_string_handle(&s)?),
        (TypeDesc::Interface(id), Value::Object(obj)) => {
            if obj.tag() != TypeTag::Interface(*id) {
                return Err(BridgeError::domain(format!(
                    "implementation returned {} where {} was declared",
                    registry().tag_name(obj.tag()),
                    registry().type_name(ty)
                )));
            }
            TypedValue::handle(handles().issue(obj)?)
        }
        (TypeDesc::Array(_) | TypeDesc::Dict(..) | TypeDesc::Set(_), value) => {
            TypedValue::handle(issue_snapshot(value, ty)?)
        }
        (_, value) => return Err(returned(&value, ty)),
    };
    Ok(out)
}

fn enum_out(ty: &TypeDesc, value: i64) -> BridgeResult<TypedValue> {
    let value = check_enum(ty, value)?;
    Ok(match boundary_type(ty) {
        FfiType::I64 => TypedValue::i64(value),
        _ => TypedValue::i32(value as i32),
    })
}

fn issue_snapshot(value: Value, ty: &TypeDesc) -> BridgeResult<Handle> {
    let collection = Collection::snapshot(value, ty)?;
    let tag = collection.kind().tag();
    handles().issue(ObjRef::new(tag, Payload::Collection(collection)))
}

/// Boundary value -> native value, checked against the declared type
pub fn from_boundary(raw: TypedValue, ty: &TypeDesc) -> BridgeResult<Value> {
    let kind = raw
        .kind()
        .ok_or_else(|| BridgeError::invalid_argument(format!("unknown value tag {}", raw.tag)))?;
    let expected = boundary_type(ty);
    if kind != expected {
        return Err(BridgeError::invalid_argument(format!(
            "expected {} value for {}, found {}",
            expected.name(),
            registry().type_name(ty),
            kind.name()
        )));
    }

    let value = match ty {
        TypeDesc::Void => Value::Void,
        TypeDesc::Bool => Value::Bool(raw.as_bool().unwrap_or_default()),
        TypeDesc::I32 => Value::I32(raw.as_i32().unwrap_or_default()),
        TypeDesc::I64 => Value::I64(raw.as_i64().unwrap_or_default()),
        TypeDesc::F32 => Value::F32(raw.as_f32().unwrap_or_default()),
        TypeDesc::F64 => Value::F64(raw.as_f64().unwrap_or_default()),
        TypeDesc::Enum(_) => {
            let v = raw
                .as_i32()
                .map(i64::from)
                .or_else(|| raw.as_i64())
                .unwrap_or_default();
            Value::Enum(check_enum(ty, v)?)
        }
        _ => {
            let handle = raw.as_handle().unwrap_or_default();
            let obj = handles().resolve(handle, handle_tag(ty))?;
            object_value(obj, Some(ty))?
        }
    };
    Ok(value)
}

/// Native view of a resolved handle
fn object_value(obj: ObjRef, ty: Option<&TypeDesc>) -> BridgeResult<Value> {
    match obj.tag() {
        TypeTag::Interface(_) => Ok(Value::Object(obj)),
        TypeTag::String => Ok(Value::Str(string_content(&obj)?)),
        TypeTag::Array | TypeTag::Dict | TypeTag::Set => {
            let value = obj.with_payload(|payload| match payload {
                Payload::Collection(c) => Some(c.to_value()),
                _ => None,
            })?;
            let value = value.ok_or_else(|| {
                BridgeError::type_mismatch("collection", registry().tag_name(obj.tag()))
            })?;
            match ty {
                Some(ty) => conform(value, ty),
                None => Ok(value),
            }
        }
    }
}

/// Boundary value -> native value where no type is declared
///
/// Used for items pushed into caller-built collections; typing happens when
/// the collection is handed to a setter or method.
pub fn from_boundary_untyped(raw: TypedValue) -> BridgeResult<Value> {
    let kind = raw
        .kind()
        .ok_or_else(|| BridgeError::invalid_argument(format!("unknown value tag {}", raw.tag)))?;

    let value = match kind {
        FfiType::Void => Value::Void,
        FfiType::Bool => Value::Bool(raw.as_bool().unwrap_or_default()),
        FfiType::I32 => Value::I32(raw.as_i32().unwrap_or_default()),
        FfiType::I64 => Value::I64(raw.as_i64().unwrap_or_default()),
        FfiType::F32 => Value::F32(raw.as_f32().unwrap_or_default()),
        FfiType::F64 => Value::F64(raw.as_f64().unwrap_or_default()),
        FfiType::Handle => {
            let obj = handles().resolve(raw.as_handle().unwrap_or_default(), None)?;
            object_value(obj, None)?
        }
    };
    Ok(value)
}

/// Native value -> boundary value where no type is declared
pub fn to_boundary_untyped(value: Value) -> BridgeResult<TypedValue> {
    let out = match value {
        Value::Void => TypedValue::void(),
        Value::Bool(v) => TypedValue::bool(v),
        Value::I32(v) => TypedValue::i32(v),
        Value::I64(v) | Value::Enum(v) => TypedValue::i64(v),
        Value::F32(v) => TypedValue::f32(v),
        Value::F64(v) => TypedValue::f64(v),
        Value::Str(s) => TypedValue::handle(new_string_handle(&s)?),
        Value::Object(obj) => TypedValue::handle(handles().issue(obj)?),
        value @ (Value::Array(_) | Value::Dict(_) | Value::Set(_)) => {
            let collection = Collection::untyped_snapshot(value)?;
            let tag = collection.kind().tag();
            TypedValue::handle(handles().issue(ObjRef::new(tag, Payload::Collection(collection)))?)
        }
    };
    Ok(out)
}

/// Check an untyped native value against a declared type
///
/// Integers narrow or widen when they fit, enums are validated and
/// collections are checked item by item.
pub fn conform(value: Value, ty: &TypeDesc) -> BridgeResult<Value> {
    let mismatch =
        |value: &Value| BridgeError::type_mismatch(registry().type_name(ty), value.kind_name());

    let out = match (ty, value) {
        (TypeDesc::Void, _) => Value::Void,
        (TypeDesc::Bool, v @ Value::Bool(_)) => v,
        (TypeDesc::I32, v @ Value::I32(_)) => v,
        (TypeDesc::I32, Value::I64(v)) => {
            Value::I32(i32::try_from(v).map_err(|_| mismatch(&Value::I64(v)))?)
        }
        (TypeDesc::I64, Value::I32(v)) => Value::I64(v as i64),
        (TypeDesc::I64, v @ Value::I64(_)) => v,
        (TypeDesc::F32, v @ Value::F32(_)) => v,
        (TypeDesc::F64, Value::F32(v)) => Value::F64(v as f64),
        (TypeDesc::F64, v @ Value::F64(_)) => v,
        (TypeDesc::Enum(_), Value::I32(v)) => Value::Enum(check_enum(ty, v as i64)?),
        (TypeDesc::Enum(_), Value::I64(v) | Value::Enum(v)) => Value::Enum(check_enum(ty, v)?),
        (TypeDesc::String, v @ Value::Str(_)) => v,
        (TypeDesc::Interface(id), Value::Object(obj)) => {
            if obj.tag() != TypeTag::Interface(*id) {
                return Err(BridgeError::type_mismatch(
                    registry().type_name(ty),
                    registry().tag_name(obj.tag()),
                ));
            }
            Value::Object(obj)
        }
        (TypeDesc::Array(elem), Value::Array(items)) => Value::Array(
            items
                .into_iter()
                .map(|item| conform(item, elem))
                .collect::<BridgeResult<_>>()?,
        ),
        (TypeDesc::Set(elem), Value::Set(items)) => {
            let mut out: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                let item = conform(item, elem)?;
                if !out.iter().any(|existing| existing.same(&item)) {
                    out.push(item);
                }
            }
            Value::Set(out)
        }
        (TypeDesc::Dict(key_ty, elem), Value::Dict(pairs)) => Value::Dict(
            pairs
                .into_iter()
                .map(|(k, v)| Ok((conform(k, key_ty)?, conform(v, elem)?)))
                .collect::<BridgeResult<_>>()?,
        ),
        (_, value) => return Err(mismatch(&value)),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeRegistry;
    use crate::string::read_string;

    #[test]
    fn test_primitive_round_trip() {
        let raw = to_boundary(Value::I32(7), &TypeDesc::I32).unwrap();
        assert_eq!(raw.as_i32(), Some(7));
        assert!(matches!(from_boundary(raw, &TypeDesc::I32).unwrap(), Value::I32(7)));

        let widened = to_boundary(Value::F32(1.5), &TypeDesc::F64).unwrap();
        assert_eq!(widened.as_f64(), Some(1.5));
    }

    #[test]
    fn test_tag_mismatch_is_invalid_argument() {
        let err = from_boundary(TypedValue::i64(1), &TypeDesc::I32).unwrap_err();
        assert_eq!(
            err.to_string(),
            "InvalidArgument: expected int32_t value for int32_t, found int64_t"
        );
    }

    #[test]
    fn test_string_out_is_fresh_handle() {
        let raw = to_boundary(Value::from("hello"), &TypeDesc::String).unwrap();
        let handle = raw.as_handle().unwrap();
        assert_eq!(read_string(handle).unwrap(), "hello");

        let value = from_boundary(raw, &TypeDesc::String).unwrap();
        assert_eq!(value.into_string().unwrap(), "hello");
        // Reading copies; the caller still owns the handle
        handles().release(handle, Some(TypeTag::String)).unwrap();
    }

    #[test]
    fn test_native_type_error_is_domain_failure() {
        let err = to_boundary(Value::Str("x".into()), &TypeDesc::I32).unwrap_err();
        assert_eq!(
            err.to_string(),
            "DomainFailure: implementation returned string_t where int32_t was declared"
        );
    }

    #[test]
    fn test_conform_collections() {
        let ty = TypeDesc::Set(Box::new(TypeDesc::I64));
        let value = conform(Value::Set(vec![Value::I32(1), Value::I64(1), Value::I32(2)]), &ty).unwrap();
        assert_eq!(value.into_set().unwrap().len(), 2);

        let err = conform(
            Value::Array(vec![Value::Bool(true)]),
            &TypeDesc::Array(Box::new(TypeDesc::String)),
        )
        .unwrap_err();
        assert_eq!(err, BridgeError::type_mismatch("string_t", "bool"));
    }

    #[test]
    fn test_untyped_items() {
        let string = new_string_handle("tag").unwrap();
        let value = from_boundary_untyped(TypedValue::handle(string)).unwrap();
        assert_eq!(value.into_string().unwrap(), "tag");
        handles().release(string, None).unwrap();

        let err = from_boundary_untyped(TypedValue {
            tag: 42,
            value: Default::default(),
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "InvalidArgument: unknown value tag 42");
    }

    #[test]
    fn test_enum_validation() {
        // Registered globally under a name no other test uses
        let loaded = crate::model::registry()
            .load_json(
                r#"{"enums": [{"name": "MarshalTestLevel", "values": [
                    {"name": "LOW", "value": 0}, {"name": "HIGH", "value": 2}
                ]}]}"#,
            )
            .unwrap();
        let ty = TypeDesc::Enum(loaded.enum_id("MarshalTestLevel").unwrap());

        assert!(matches!(from_boundary(TypedValue::i32(2), &ty).unwrap(), Value::Enum(2)));

        let err = from_boundary(TypedValue::i32(5), &ty).unwrap_err();
        assert_eq!(
            err.to_string(),
            "InvalidEnumValue: 5 is not a declared enumerator of MarshalTestLevel"
        );
        assert!(to_boundary(Value::Enum(1), &ty).is_err());

        // Private registries do not leak into the global one
        assert!(TypeRegistry::new().enum_by_name("MarshalTestLevel").is_none());
    }
}
