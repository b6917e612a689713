//! Managed objects - reference-counted state behind every handle
//!
//! Design: an explicit atomic count next to the payload.
//! - Every `ObjRef` owns exactly one count; clone adds, drop releases
//! - The handle table holds one `ObjRef` per live handle, native containers
//!   hold `ObjRef`s for the objects they own
//! - The 1 -> 0 transition is the only destruction trigger and is claimed by
//!   a compare-and-swap, so two racing releases can never both destroy
//! - Decrementing an exhausted count is refused instead of wrapping

use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{fence, AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;

use crate::collection::Collection;
use crate::error::{BridgeError, BridgeResult, DomainError};
use crate::logging::{error, log_object_destroyed};
use crate::model::{registry, InterfaceId};
use crate::stats::{bump, COUNTERS};
use crate::string::BoundaryString;
use crate::value::{Args, Value};

/// Kind of object a handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Interface(InterfaceId),
    String,
    Array,
    Dict,
    Set,
}

/// Recover the concrete type behind an `Arc<dyn BoundaryObject>`
pub trait AsAnyArc {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Capability set of a native interface implementation
///
/// Member names are the IDL names. The invocation layer has already checked
/// the member exists, the property is writable, argument count and argument
/// types, so implementations only enforce business rules. Interior
/// mutability is the implementation's business; calls arrive concurrently.
pub trait BoundaryObject: AsAnyArc + Send + Sync + 'static {
    fn get_property(&self, name: &str) -> Result<Value, DomainError>;

    fn set_property(&self, name: &str, value: Value) -> Result<(), DomainError>;

    fn invoke(&self, method: &str, args: Args) -> Result<Value, DomainError>;
}

pub enum Payload {
    Interface(Arc<dyn BoundaryObject>),
    String(BoundaryString),
    Collection(Collection),
}

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

pub struct ManagedObject {
    id: u64,
    tag: TypeTag,
    refcount: AtomicI32,
    payload: RwLock<Option<Payload>>,
}

impl ManagedObject {
    fn add_ref(&self) -> BridgeResult<i32> {
        self.refcount
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                (count > 0).then(|| count + 1)
            })
            .map(|prev| prev + 1)
            .map_err(|_| BridgeError::ObjectDestroyed { object: self.id })
    }

    /// Drop one reference, destroying the payload on the last one
    fn release(&self) -> BridgeResult<i32> {
        let prev = self
            .refcount
            .fetch_update(Ordering::Release, Ordering::Relaxed, |count| {
                (count > 0).then(|| count - 1)
            })
            .map_err(|_| BridgeError::OverRelease { object: self.id })?;

        if prev == 1 {
            // Synchronize with every earlier release before tearing down
            fence(Ordering::Acquire);
            self.destroy();
        }

        Ok(prev - 1)
    }

    #[cold]
    fn destroy(&self) {
        let payload = self.payload.write().take();
        bump(&COUNTERS.objects_destroyed);
        log_object_destroyed(self.id, &registry().tag_name(self.tag));

        // Nested ObjRefs may cascade; run them outside the payload lock
        drop(payload);
    }
}

/// Owned reference to a managed object
pub struct ObjRef(Arc<ManagedObject>);

impl ObjRef {
    /// New object with a count of one, owned by the returned reference
    pub fn new(tag: TypeTag, payload: Payload) -> Self {
        bump(&COUNTERS.objects_created);
        Self(Arc::new(ManagedObject {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            tag,
            refcount: AtomicI32::new(1),
            payload: RwLock::new(Some(payload)),
        }))
    }

    pub fn new_interface(id: InterfaceId, object: Arc<dyn BoundaryObject>) -> Self {
        Self::new(TypeTag::Interface(id), Payload::Interface(object))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn tag(&self) -> TypeTag {
        self.0.tag
    }

    /// Current reference count, including this reference
    pub fn count(&self) -> i32 {
        self.0.refcount.load(Ordering::Acquire)
    }

    pub fn with_payload<R>(&self, f: impl FnOnce(&Payload) -> R) -> BridgeResult<R> {
        let payload = self.0.payload.read();
        payload
            .as_ref()
            .map(f)
            .ok_or(BridgeError::ObjectDestroyed { object: self.0.id })
    }

    /// Interface implementation, cloned out so no lock is held during calls
    pub fn interface(&self) -> BridgeResult<Arc<dyn BoundaryObject>> {
        self.with_payload(|payload| match payload {
            Payload::Interface(object) => Some(Arc::clone(object)),
            _ => None,
        })?
        .ok_or_else(|| {
            BridgeError::type_mismatch("interface", registry().tag_name(self.tag()))
        })
    }

    /// Concrete implementation type, for native code that owns the object
    pub fn downcast<T: BoundaryObject>(&self) -> Option<Arc<T>> {
        self.interface().ok()?.into_any_arc().downcast::<T>().ok()
    }
}

impl Clone for ObjRef {
    fn clone(&self) -> Self {
        // Holding `self` keeps the count positive, so a plain increment is safe
        self.0.refcount.fetch_add(1, Ordering::Relaxed);
        Self(Arc::clone(&self.0))
    }
}

impl Drop for ObjRef {
    fn drop(&mut self) {
        if let Err(err) = self.0.release() {
            error!(target: "idlbridge_runtime::objects", error = %err, "reference release failed");
        }
    }
}

impl PartialEq for ObjRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjRef {}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjRef")
            .field("id", &self.0.id)
            .field("tag", &self.0.tag)
            .field("refcount", &self.count())
            .finish()
    }
}

/// Take an extra reference without going through `Clone`
///
/// Fails once the object has been destroyed.
pub fn try_add_ref(obj: &ObjRef) -> BridgeResult<ObjRef> {
    obj.0.add_ref()?;
    Ok(ObjRef(Arc::clone(&obj.0)))
}
