//! Handle table - generational arena of live references
//!
//! A handle packs `(generation << 32) | (index + 1)`, so zero is never a
//! valid handle. Releasing a handle bumps its slot's generation; any copy of
//! the old value then resolves as stale instead of aliasing whatever object
//! reuses the slot. A slot whose generation would wrap is retired for good.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{BridgeError, BridgeResult};
use crate::logging::{log_handle_issued, log_handle_released};
use crate::model::registry;
use crate::object::{ObjRef, TypeTag};
use crate::options;
use crate::stats::{bump, COUNTERS};

/// Opaque token handed to foreign callers
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Handle(pub u64);

impl Handle {
    pub const NULL: Handle = Handle(0);

    fn from_parts(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64 + 1))
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    fn index(self) -> usize {
        ((self.0 & 0xffff_ffff) as usize).wrapping_sub(1)
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

struct Slot {
    generation: u32,
    entry: Option<ObjRef>,
}

#[derive(Default)]
struct Slots {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

pub struct HandleTable {
    inner: RwLock<Slots>,
    live: AtomicUsize,
}

static HANDLES: Lazy<HandleTable> = Lazy::new(HandleTable::new);

/// Global table shared by every boundary entry point
pub fn handles() -> &'static HandleTable {
    &HANDLES
}

fn mismatch(expected: TypeTag, found: TypeTag) -> BridgeError {
    let registry = registry();
    BridgeError::type_mismatch(registry.tag_name(expected), registry.tag_name(found))
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Slots::default()),
            live: AtomicUsize::new(0),
        }
    }

    /// Bind `obj` to a new handle; the handle owns the reference
    pub fn issue(&self, obj: ObjRef) -> BridgeResult<Handle> {
        let limit = options::max_live_handles();

        let handle = {
            let mut inner = self.inner.write();

            if limit > 0 && self.live.load(Ordering::Relaxed) >= limit {
                return Err(BridgeError::HandleLimit { limit });
            }

            let index = match inner.free.pop() {
                Some(index) => index,
                None => {
                    let index = inner.slots.len();
                    if index >= u32::MAX as usize - 1 {
                        return Err(BridgeError::HandleLimit { limit: index });
                    }
                    inner.slots.push(Slot {
                        generation: 1,
                        entry: None,
                    });
                    index as u32
                }
            };

            let slot = &mut inner.slots[index as usize];
            let handle = Handle::from_parts(index, slot.generation);
            slot.entry = Some(obj.clone());
            self.live.fetch_add(1, Ordering::Relaxed);
            handle
        };

        bump(&COUNTERS.handles_issued);
        log_handle_issued(handle.raw(), &registry().tag_name(obj.tag()), obj.id());
        Ok(handle)
    }

    /// Resolve to a new reference, checking liveness and tag
    pub fn resolve(&self, handle: Handle, expected: Option<TypeTag>) -> BridgeResult<ObjRef> {
        if handle.is_null() {
            return Err(BridgeError::NullHandle);
        }

        let obj = {
            let inner = self.inner.read();
            let slot = inner
                .slots
                .get(handle.index())
                .ok_or(BridgeError::UnknownHandle { handle: handle.raw() })?;

            match &slot.entry {
                Some(obj) if slot.generation == handle.generation() => obj.clone(),
                _ => return Err(Self::dead(slot, handle)),
            }
        };

        match expected {
            Some(tag) if obj.tag() != tag => Err(mismatch(tag, obj.tag())),
            _ => Ok(obj),
        }
    }

    /// Invalidate `handle` and drop its reference; returns the remaining count
    pub fn release(&self, handle: Handle, expected: Option<TypeTag>) -> BridgeResult<i32> {
        if handle.is_null() {
            return Err(BridgeError::NullHandle);
        }

        let obj = {
            let mut inner = self.inner.write();
            let index = handle.index();
            let slot = inner
                .slots
                .get_mut(index)
                .ok_or(BridgeError::UnknownHandle { handle: handle.raw() })?;

            let found = match &slot.entry {
                Some(obj) if slot.generation == handle.generation() => obj.tag(),
                _ => {
                    let err = Self::dead(slot, handle);
                    if matches!(err, BridgeError::StaleHandle { .. }) {
                        bump(&COUNTERS.double_releases);
                        return Err(BridgeError::DoubleRelease { handle: handle.raw() });
                    }
                    return Err(err);
                }
            };

            if let Some(tag) = expected {
                if tag != found {
                    drop(inner);
                    return Err(mismatch(tag, found));
                }
            }

            let obj = slot.entry.take();
            slot.generation += 1;
            if slot.generation < u32::MAX {
                inner.free.push(index as u32);
            }
            self.live.fetch_sub(1, Ordering::Relaxed);
            obj
        };

        let Some(obj) = obj else {
            return Err(BridgeError::UnknownHandle { handle: handle.raw() });
        };

        // Dropped outside the table lock; may destroy the object
        let remaining = obj.count() - 1;
        let object = obj.id();
        drop(obj);

        bump(&COUNTERS.handles_released);
        log_handle_released(handle.raw(), object, remaining);
        Ok(remaining)
    }

    /// New handle bound to the same object, carrying its own reference
    pub fn duplicate(&self, handle: Handle, expected: Option<TypeTag>) -> BridgeResult<Handle> {
        let obj = self.resolve(handle, expected)?;
        self.issue(obj)
    }

    /// Reference count of the object behind `handle`
    pub fn refcount(&self, handle: Handle, expected: Option<TypeTag>) -> BridgeResult<i32> {
        let obj = self.resolve(handle, expected)?;
        // Discount the reference `resolve` just took
        Ok(obj.count() - 1)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    fn dead(slot: &Slot, handle: Handle) -> BridgeError {
        let generation = handle.generation();
        if generation != 0 && generation < slot.generation {
            BridgeError::StaleHandle { handle: handle.raw() }
        } else {
            BridgeError::UnknownHandle { handle: handle.raw() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string::new_string_object;

    #[test]
    fn test_handle_encoding() {
        let handle = Handle::from_parts(0, 1);
        assert_eq!(handle.raw(), 0x1_0000_0001);
        assert_eq!(handle.index(), 0);
        assert_eq!(handle.generation(), 1);
        assert_eq!(handle.to_string(), "0x0000000100000001");
        assert_eq!(Handle::NULL.index(), usize::MAX);
    }

    #[test]
    fn test_issue_resolve_release() {
        let table = HandleTable::new();
        let handle = table.issue(new_string_object("a").unwrap()).unwrap();

        assert_eq!(table.live(), 1);
        assert_eq!(table.refcount(handle, Some(TypeTag::String)).unwrap(), 1);
        assert_eq!(table.release(handle, Some(TypeTag::String)).unwrap(), 0);
        assert_eq!(table.live(), 0);

        assert_eq!(
            table.resolve(handle, None).unwrap_err(),
            BridgeError::StaleHandle { handle: handle.raw() }
        );
        assert_eq!(
            table.release(handle, None).unwrap_err(),
            BridgeError::DoubleRelease { handle: handle.raw() }
        );
    }

    #[test]
    fn test_reused_slot_rejects_old_handle() {
        let table = HandleTable::new();
        let first = table.issue(new_string_object("a").unwrap()).unwrap();
        table.release(first, None).unwrap();

        let second = table.issue(new_string_object("b").unwrap()).unwrap();
        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert!(table.resolve(first, None).is_err());
        assert!(table.resolve(second, None).is_ok());
    }

    #[test]
    fn test_null_and_forged_handles() {
        let table = HandleTable::new();
        assert_eq!(table.resolve(Handle::NULL, None).unwrap_err(), BridgeError::NullHandle);
        assert_eq!(
            table.resolve(Handle(0xdead_beef), None).unwrap_err(),
            BridgeError::UnknownHandle { handle: 0xdead_beef }
        );
    }

    #[test]
    fn test_wrong_tag_is_not_released() {
        let table = HandleTable::new();
        let handle = table.issue(new_string_object("a").unwrap()).unwrap();

        let err = table.release(handle, Some(TypeTag::Array)).unwrap_err();
        assert_eq!(err, BridgeError::type_mismatch("array", "string"));
        assert!(table.resolve(handle, Some(TypeTag::String)).is_ok());
        table.release(handle, None).unwrap();
    }

    #[test]
    fn test_duplicate_shares_object() {
        let table = HandleTable::new();
        let original = table.issue(new_string_object("a").unwrap()).unwrap();
        let copy = table.duplicate(original, None).unwrap();

        assert_ne!(original, copy);
        assert_eq!(table.refcount(original, None).unwrap(), 2);
        assert_eq!(table.release(original, None).unwrap(), 1);
        assert_eq!(table.release(copy, None).unwrap(), 0);
    }
}
