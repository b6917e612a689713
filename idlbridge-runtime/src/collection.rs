//! Boundary collections - arrays, dictionaries and sets behind handles
//!
//! Two flavours share one representation:
//! - snapshots returned from gets and methods are sealed copies typed by the
//!   descriptor; later changes to the source never show through
//! - builders created by the caller are untyped and mutable until they are
//!   handed to a setter or method, which copies them
//!
//! Each collection carries a single enumeration cursor for `Next`/`Reset`.

use parking_lot::{Mutex, RwLock};

use crate::error::{BridgeError, BridgeResult};
use crate::model::TypeDesc;
use crate::object::TypeTag;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Array,
    Dict,
    Set,
}

impl CollectionKind {
    pub const fn tag(self) -> TypeTag {
        match self {
            Self::Array => TypeTag::Array,
            Self::Dict => TypeTag::Dict,
            Self::Set => TypeTag::Set,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Dict => "dict",
            Self::Set => "set",
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: Option<Value>,
    value: Value,
}

#[derive(Debug)]
pub struct Collection {
    kind: CollectionKind,
    key_ty: Option<TypeDesc>,
    elem_ty: Option<TypeDesc>,
    sealed: bool,
    entries: RwLock<Vec<Entry>>,
    cursor: Mutex<usize>,
}

impl Collection {
    /// Mutable, untyped collection built by a foreign caller
    pub fn builder(kind: CollectionKind) -> Self {
        Self {
            kind,
            key_ty: None,
            elem_ty: None,
            sealed: false,
            entries: RwLock::new(Vec::new()),
            cursor: Mutex::new(0),
        }
    }

    /// Sealed copy of a native collection value described by `ty`
    pub fn snapshot(value: Value, ty: &TypeDesc) -> BridgeResult<Self> {
        let (key_ty, elem_ty) = match ty {
            TypeDesc::Array(elem) | TypeDesc::Set(elem) => (None, elem.as_ref().clone()),
            TypeDesc::Dict(key, elem) => (Some(key.as_ref().clone()), elem.as_ref().clone()),
            _ => return Err(BridgeError::domain("declared type is not a collection")),
        };

        let found = value.kind_name();
        let (kind, entries) = entries_of(value).ok_or_else(|| {
            BridgeError::domain(format!(
                "implementation returned {} where a collection was declared",
                found
            ))
        })?;

        let declared = match ty {
            TypeDesc::Array(_) => CollectionKind::Array,
            TypeDesc::Set(_) => CollectionKind::Set,
            _ => CollectionKind::Dict,
        };
        if kind != declared {
            return Err(BridgeError::domain(format!(
                "implementation returned {} where {} was declared",
                kind.name(),
                declared.name()
            )));
        }

        Ok(Self {
            kind,
            key_ty,
            elem_ty: Some(elem_ty),
            sealed: true,
            entries: RwLock::new(entries),
            cursor: Mutex::new(0),
        })
    }

    /// Sealed copy without declared element types
    pub fn untyped_snapshot(value: Value) -> BridgeResult<Self> {
        let found = value.kind_name();
        let (kind, entries) = entries_of(value)
            .ok_or_else(|| BridgeError::type_mismatch("collection", found))?;

        Ok(Self {
            kind,
            key_ty: None,
            elem_ty: None,
            sealed: true,
            entries: RwLock::new(entries),
            cursor: Mutex::new(0),
        })
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Declared element type; `None` for caller-built collections
    pub fn elem_ty(&self) -> Option<&TypeDesc> {
        self.elem_ty.as_ref()
    }

    pub fn key_ty(&self) -> Option<&TypeDesc> {
        self.key_ty.as_ref()
    }

    fn writable(&self, expected: CollectionKind) -> BridgeResult<()> {
        if self.kind != expected {
            return Err(BridgeError::type_mismatch(expected.name(), self.kind.name()));
        }
        if self.sealed {
            return Err(BridgeError::invalid_argument(format!(
                "{} snapshot is read-only",
                self.kind.name()
            )));
        }
        Ok(())
    }

    /// Append to an array builder
    pub fn push(&self, value: Value) -> BridgeResult<usize> {
        self.writable(CollectionKind::Array)?;
        let mut entries = self.entries.write();
        entries.push(Entry { key: None, value });
        Ok(entries.len())
    }

    /// Add to a set builder; false when already present
    pub fn insert(&self, value: Value) -> BridgeResult<bool> {
        self.writable(CollectionKind::Set)?;
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.value.same(&value)) {
            return Ok(false);
        }
        entries.push(Entry { key: None, value });
        Ok(true)
    }

    /// Insert or replace in a dict builder; false when the key was replaced
    pub fn insert_entry(&self, key: Value, value: Value) -> BridgeResult<bool> {
        self.writable(CollectionKind::Dict)?;
        let mut entries = self.entries.write();
        match entries
            .iter_mut()
            .find(|e| e.key.as_ref().is_some_and(|existing| existing.same(&key)))
        {
            Some(existing) => {
                existing.value = value;
                Ok(false)
            }
            None => {
                entries.push(Entry {
                    key: Some(key),
                    value,
                });
                Ok(true)
            }
        }
    }

    pub fn count(&self) -> usize {
        self.entries.read().len()
    }

    pub fn item(&self, index: usize) -> BridgeResult<Value> {
        let entries = self.entries.read();
        entries
            .get(index)
            .map(|e| e.value.clone())
            .ok_or(BridgeError::IndexOutOfBounds {
                index,
                count: entries.len(),
            })
    }

    /// Advance the cursor; `None` once exhausted
    pub fn next(&self) -> Option<(Option<Value>, Value)> {
        self.next_with(|key, value| Ok((key, value))).ok().flatten()
    }

    /// Hand the entry under the cursor to `f` and advance only if it succeeds
    ///
    /// The cursor stays locked for the duration, so a failed `f` leaves the
    /// same entry to be read again.
    pub fn next_with<R>(
        &self,
        f: impl FnOnce(Option<Value>, Value) -> BridgeResult<R>,
    ) -> BridgeResult<Option<R>> {
        let mut cursor = self.cursor.lock();
        let entry = match self.entries.read().get(*cursor) {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };
        let out = f(entry.key, entry.value)?;
        *cursor += 1;
        Ok(Some(out))
    }

    pub fn reset(&self) {
        *self.cursor.lock() = 0;
    }

    /// Native value with the same content
    pub fn to_value(&self) -> Value {
        let entries = self.entries.read();
        match self.kind {
            CollectionKind::Array => Value::Array(entries.iter().map(|e| e.value.clone()).collect()),
            CollectionKind::Set => Value::Set(entries.iter().map(|e| e.value.clone()).collect()),
            CollectionKind::Dict => Value::Dict(
                entries
                    .iter()
                    .filter_map(|e| e.key.clone().map(|k| (k, e.value.clone())))
                    .collect(),
            ),
        }
    }
}

/// Entries of a native collection value, deduplicating sets and dict keys
fn entries_of(value: Value) -> Option<(CollectionKind, Vec<Entry>)> {
    match value {
        Value::Array(items) => Some((
            CollectionKind::Array,
            items
                .into_iter()
                .map(|value| Entry { key: None, value })
                .collect(),
        )),
        Value::Set(items) => {
            let mut entries: Vec<Entry> = Vec::with_capacity(items.len());
            for value in items {
                if !entries.iter().any(|e| e.value.same(&value)) {
                    entries.push(Entry { key: None, value });
                }
            }
            Some((CollectionKind::Set, entries))
        }
        Value::Dict(pairs) => {
            let mut entries: Vec<Entry> = Vec::with_capacity(pairs.len());
            for (key, value) in pairs {
                match entries
                    .iter_mut()
                    .find(|e| e.key.as_ref().is_some_and(|existing| existing.same(&key)))
                {
                    Some(existing) => existing.value = value,
                    None => entries.push(Entry {
                        key: Some(key),
                        value,
                    }),
                }
            }
            Some((CollectionKind::Dict, entries))
        }
        _ => None,
    }
}
