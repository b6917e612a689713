//! Invocation layer - descriptor-checked property and method dispatch
//!
//! Each operation resolves the primary handle first, then checks the member
//! against the interface descriptor, then unmarshals arguments, and only
//! then reaches the native implementation. Nothing is mutated before all
//! checks pass. The resolved `ObjRef` keeps the object alive for the whole
//! call even if another thread releases its handle meanwhile.

use smallvec::SmallVec;
use std::sync::Arc;

use crate::error::{BridgeError, BridgeResult};
use crate::ffi::TypedValue;
use crate::handle::{handles, Handle};
use crate::marshal::{from_boundary, to_boundary};
use crate::model::{registry, InterfaceDescriptor, InterfaceId};
use crate::object::{ObjRef, TypeTag};
use crate::value::Args;

/// Scalar types that cross the boundary by value or as a handle
pub trait Scalar: Sized {
    fn into_typed(self) -> TypedValue;
    fn from_typed(value: TypedValue) -> Option<Self>;
}

impl Scalar for bool {
    fn into_typed(self) -> TypedValue {
        TypedValue::bool(self)
    }
    fn from_typed(value: TypedValue) -> Option<Self> {
        value.as_bool()
    }
}

impl Scalar for i32 {
    fn into_typed(self) -> TypedValue {
        TypedValue::i32(self)
    }
    fn from_typed(value: TypedValue) -> Option<Self> {
        value.as_i32()
    }
}

impl Scalar for i64 {
    fn into_typed(self) -> TypedValue {
        TypedValue::i64(self)
    }
    fn from_typed(value: TypedValue) -> Option<Self> {
        value.as_i64()
    }
}

impl Scalar for f32 {
    fn into_typed(self) -> TypedValue {
        TypedValue::f32(self)
    }
    fn from_typed(value: TypedValue) -> Option<Self> {
        value.as_f32()
    }
}

impl Scalar for f64 {
    fn into_typed(self) -> TypedValue {
        TypedValue::f64(self)
    }
    fn from_typed(value: TypedValue) -> Option<Self> {
        value.as_f64()
    }
}

impl Scalar for Handle {
    fn into_typed(self) -> TypedValue {
        TypedValue::handle(self)
    }
    fn from_typed(value: TypedValue) -> Option<Self> {
        value.as_handle()
    }
}

fn target(handle: Handle, iface: InterfaceId) -> BridgeResult<(ObjRef, Arc<InterfaceDescriptor>)> {
    let obj = handles().resolve(handle, Some(TypeTag::Interface(iface)))?;
    let desc = registry()
        .interface(iface)
        .ok_or_else(|| BridgeError::invalid_argument(format!("unregistered {}", iface)))?;
    Ok((obj, desc))
}

fn unknown_member(desc: &InterfaceDescriptor, kind: &str, name: &str) -> BridgeError {
    BridgeError::invalid_argument(format!("{} has no {} '{}'", desc.name, kind, name))
}

/// Interface of the object behind `handle`, whatever it is
pub fn interface_of(handle: Handle) -> BridgeResult<InterfaceId> {
    let obj = handles().resolve(handle, None)?;
    match obj.tag() {
        TypeTag::Interface(id) => Ok(id),
        other => Err(BridgeError::type_mismatch(
            "interface",
            registry().tag_name(other),
        )),
    }
}

pub fn get_property(handle: Handle, iface: InterfaceId, name: &str) -> BridgeResult<TypedValue> {
    let (obj, desc) = target(handle, iface)?;
    let prop = desc
        .property(name)
        .ok_or_else(|| unknown_member(&desc, "property", name))?;

    let value = obj.interface()?.get_property(name)?;
    to_boundary(value, &prop.ty)
}

pub fn set_property(
    handle: Handle,
    iface: InterfaceId,
    name: &str,
    raw: TypedValue,
) -> BridgeResult<()> {
    let (obj, desc) = target(handle, iface)?;
    let prop = desc
        .property(name)
        .ok_or_else(|| unknown_member(&desc, "property", name))?;
    if prop.read_only {
        return Err(BridgeError::invalid_argument(format!(
            "property {}.{} is read-only",
            desc.name, name
        )));
    }

    let value = from_boundary(raw, &prop.ty)?;
    obj.interface()?.set_property(name, value)?;
    Ok(())
}

pub fn call_method(
    handle: Handle,
    iface: InterfaceId,
    name: &str,
    raw_args: &[TypedValue],
) -> BridgeResult<TypedValue> {
    let (obj, desc) = target(handle, iface)?;
    let method = desc
        .method(name)
        .ok_or_else(|| unknown_member(&desc, "method", name))?;

    if raw_args.len() != method.params.len() {
        return Err(BridgeError::invalid_argument(format!(
            "{}.{} expects {} argument(s), got {}",
            desc.name,
            name,
            method.params.len(),
            raw_args.len()
        )));
    }

    let args: Args = raw_args
        .iter()
        .zip(&method.params)
        .map(|(raw, param)| from_boundary(*raw, &param.ty))
        .collect::<BridgeResult<SmallVec<_>>>()?;

    let value = obj.interface()?.invoke(name, args)?;
    to_boundary(value, &method.returns)
}

/// Run the interface's factory and hand the caller a handle to the result
pub fn create(iface: InterfaceId) -> BridgeResult<Handle> {
    handles().issue(registry().create(iface)?)
}

/// Duplicate handle carrying its own reference
pub fn add_ref(handle: Handle, iface: InterfaceId) -> BridgeResult<Handle> {
    handles().duplicate(handle, Some(TypeTag::Interface(iface)))
}

pub fn release(handle: Handle, iface: InterfaceId) -> BridgeResult<()> {
    handles().release(handle, Some(TypeTag::Interface(iface)))?;
    Ok(())
}

fn expect<T: Scalar>(value: TypedValue) -> BridgeResult<T> {
    T::from_typed(value).ok_or_else(|| {
        BridgeError::invalid_argument(format!("unexpected boundary value tag {}", value.tag))
    })
}

/// Typed property read for generated bindings
pub fn get<T: Scalar>(handle: Handle, iface: InterfaceId, name: &str) -> BridgeResult<T> {
    expect(get_property(handle, iface, name)?)
}

/// Typed property write for generated bindings
pub fn set<T: Scalar>(handle: Handle, iface: InterfaceId, name: &str, value: T) -> BridgeResult<()> {
    set_property(handle, iface, name, value.into_typed())
}

/// Typed method call for generated bindings
pub fn call<T: Scalar>(
    handle: Handle,
    iface: InterfaceId,
    name: &str,
    args: &[TypedValue],
) -> BridgeResult<T> {
    expect(call_method(handle, iface, name, args)?)
}

/// Method call whose result is discarded
pub fn call_void(handle: Handle, iface: InterfaceId, name: &str, args: &[TypedValue]) -> BridgeResult<()> {
    call_method(handle, iface, name, args).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::object::BoundaryObject;
    use crate::string::{new_string_handle, read_string};
    use crate::value::{arg, Value};
    use once_cell::sync::Lazy;
    use parking_lot::Mutex;

    const COUNTER_MODEL: &str = r#"{
        "namespace": "InvokeTest",
        "interfaces": [{
            "name": "IInvokeCounter",
            "properties": [
                {"name": "label", "type": "string_t", "writable": true},
                {"name": "total", "type": "int64_t"}
            ],
            "methods": [
                {"name": "Add", "return_type": "int64_t", "parameters": [{"name": "amount", "type": "int32_t"}]},
                {"name": "Fail", "return_type": "void"},
                {"name": "Explode", "return_type": "bool"}
            ]
        }]
    }"#;

    #[derive(Default)]
    struct Counter {
        label: Mutex<String>,
        total: Mutex<i64>,
    }

    impl BoundaryObject for Counter {
        fn get_property(&self, name: &str) -> Result<Value, DomainError> {
            match name {
                "label" => Ok(Value::Str(self.label.lock().clone())),
                "total" => Ok(Value::I64(*self.total.lock())),
                _ => Err(DomainError::unknown_member("IInvokeCounter", name)),
            }
        }

        fn set_property(&self, name: &str, value: Value) -> Result<(), DomainError> {
            match name {
                "label" => {
                    *self.label.lock() = value.into_string()?;
                    Ok(())
                }
                _ => Err(DomainError::unknown_member("IInvokeCounter", name)),
            }
        }

        fn invoke(&self, method: &str, args: Args) -> Result<Value, DomainError> {
            match method {
                "Add" => {
                    let mut total = self.total.lock();
                    *total += arg(&args, 0)?.as_i32()? as i64;
                    Ok(Value::I64(*total))
                }
                "Fail" => Err(DomainError::new("counter refused")),
                "Explode" => panic!("counter exploded"),
                _ => Err(DomainError::unknown_member("IInvokeCounter", method)),
            }
        }
    }

    static COUNTER: Lazy<InterfaceId> = Lazy::new(|| {
        let loaded = registry().load_json(COUNTER_MODEL).unwrap();
        let id = loaded.interface("IInvokeCounter").unwrap();
        registry().register_factory(id, || Ok(Arc::new(Counter::default()) as Arc<dyn BoundaryObject>));
        id
    });

    #[test]
    fn test_property_round_trip_copies_string() {
        let id = *COUNTER;
        let handle = create(id).unwrap();
        let label = new_string_handle("apples").unwrap();

        set_property(handle, id, "label", TypedValue::handle(label)).unwrap();
        let read: Handle = get(handle, id, "label").unwrap();

        assert_ne!(read, label);
        assert_eq!(read_string(read).unwrap(), "apples");

        handles().release(label, None).unwrap();
        handles().release(read, None).unwrap();
        release(handle, id).unwrap();
    }

    #[test]
    fn test_method_call() {
        let id = *COUNTER;
        let handle = create(id).unwrap();

        let total: i64 = call(handle, id, "Add", &[TypedValue::i32(5)]).unwrap();
        assert_eq!(total, 5);
        let total: i64 = call(handle, id, "Add", &[TypedValue::i32(2)]).unwrap();
        assert_eq!(total, 7);
        assert_eq!(get::<i64>(handle, id, "total").unwrap(), 7);

        release(handle, id).unwrap();
    }

    #[test]
    fn test_descriptor_checks() {
        let id = *COUNTER;
        let handle = create(id).unwrap();

        let err = set(handle, id, "total", 1i64).unwrap_err();
        assert_eq!(
            err.to_string(),
            "InvalidArgument: property IInvokeCounter.total is read-only"
        );

        let err = call_void(handle, id, "Add", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "InvalidArgument: IInvokeCounter.Add expects 1 argument(s), got 0"
        );

        let err = call_void(handle, id, "Multiply", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "InvalidArgument: IInvokeCounter has no method 'Multiply'"
        );

        let err = call_void(handle, id, "Add", &[TypedValue::f64(1.0)]).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidArgument);

        release(handle, id).unwrap();
    }

    #[test]
    fn test_domain_failure() {
        let id = *COUNTER;
        let handle = create(id).unwrap();

        let err = call_void(handle, id, "Fail", &[]).unwrap_err();
        assert_eq!(err.to_string(), "DomainFailure: counter refused");

        release(handle, id).unwrap();
    }

    #[test]
    fn test_add_ref_and_release() {
        let id = *COUNTER;
        let handle = create(id).unwrap();
        let copy = add_ref(handle, id).unwrap();

        release(handle, id).unwrap();
        assert_eq!(get::<i64>(copy, id, "total").unwrap(), 0);
        release(copy, id).unwrap();

        assert!(matches!(
            get::<i64>(copy, id, "total").unwrap_err(),
            BridgeError::StaleHandle { .. }
        ));
        assert!(matches!(
            release(copy, id).unwrap_err(),
            BridgeError::DoubleRelease { .. }
        ));
    }

    #[test]
    fn test_wrong_interface_tag() {
        let id = *COUNTER;
        let string = new_string_handle("not a counter").unwrap();

        let err = get::<i64>(string, id, "total").unwrap_err();
        assert_eq!(err, BridgeError::type_mismatch("IInvokeCounter", "string"));
        assert!(matches!(
            interface_of(string).unwrap_err(),
            BridgeError::TypeMismatch { .. }
        ));

        handles().release(string, None).unwrap();
    }
}
