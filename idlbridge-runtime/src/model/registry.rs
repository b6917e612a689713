//! Process-wide registry of interface and enum descriptors
//!
//! Design: append-only tables indexed by id, with a concurrent name index.
//! - Loading a model is two-pass (reserve names, then resolve) so interfaces
//!   may reference each other in any order
//! - Re-registering an identical definition is idempotent
//! - Each interface may carry one factory used by `CreateX` entry points

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::descriptor::{
    EnumDescriptor, InterfaceDescriptor, MethodDescriptor, ParamDescriptor, PropertyDescriptor,
};
use super::document::{EnumDecl, InterfaceDecl, InterfaceModel, ModelError, TypeExpr};
use super::types::{EnumBacking, EnumId, InterfaceId, TypeDesc};
use crate::error::{BridgeError, BridgeResult, DomainError};
use crate::logging::{debug, log_model_loaded};
use crate::object::{BoundaryObject, ObjRef, TypeTag};

static REGISTRY: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::new);

/// Global registry shared by every boundary entry point
pub fn registry() -> &'static TypeRegistry {
    &REGISTRY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKey {
    Interface(InterfaceId),
    Enum(EnumId),
}

/// Produces a fresh implementation object for `CreateX`
pub type Factory = Arc<dyn Fn() -> Result<Arc<dyn BoundaryObject>, DomainError> + Send + Sync>;

/// Ids assigned to the declarations of one loaded model
#[derive(Debug, Clone, Default)]
pub struct LoadedModel {
    pub namespace: String,
    pub interfaces: Vec<(String, InterfaceId)>,
    pub enums: Vec<(String, EnumId)>,
}

impl LoadedModel {
    pub fn interface(&self, name: &str) -> Option<InterfaceId> {
        self.interfaces.iter().find(|(n, _)| n == name).map(|(_, id)| *id)
    }

    pub fn enum_id(&self, name: &str) -> Option<EnumId> {
        self.enums.iter().find(|(n, _)| n == name).map(|(_, id)| *id)
    }
}

pub struct TypeRegistry {
    names: DashMap<String, TypeKey>,
    interfaces: RwLock<Vec<Arc<InterfaceDescriptor>>>,
    enums: RwLock<Vec<Arc<EnumDescriptor>>>,
    factories: DashMap<InterfaceId, Factory>,
    load_lock: Mutex<()>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            names: DashMap::new(),
            interfaces: RwLock::new(Vec::new()),
            enums: RwLock::new(Vec::new()),
            factories: DashMap::new(),
            load_lock: Mutex::new(()),
        }
    }

    pub fn load_json(&self, json: &str) -> Result<LoadedModel, ModelError> {
        self.load(&InterfaceModel::from_json(json)?)
    }

    /// Validate and register every declaration of `model`
    ///
    /// Nothing is committed unless the whole model validates.
    pub fn load(&self, model: &InterfaceModel) -> Result<LoadedModel, ModelError> {
        let _guard = self.load_lock.lock();

        let existing_interfaces = self.interfaces.read().len();
        let existing_enums = self.enums.read().len();

        // Pass 1: reserve ids for every declared name
        let mut local: HashMap<&str, TypeKey> = HashMap::new();
        let mut next_enum = existing_enums as u32;
        let mut next_interface = existing_interfaces as u32;

        for decl in &model.enums {
            let key = match self.lookup(&decl.name) {
                Some(TypeKey::Enum(id)) => TypeKey::Enum(id),
                Some(TypeKey::Interface(_)) => {
                    return Err(ModelError::KindConflict { name: decl.name.clone() })
                }
                None => {
                    next_enum += 1;
                    TypeKey::Enum(EnumId(next_enum - 1))
                }
            };
            if local.insert(decl.name.as_str(), key).is_some() {
                return Err(ModelError::DuplicateType(decl.name.clone()));
            }
        }

        for decl in &model.interfaces {
            let key = match self.lookup(&decl.name) {
                Some(TypeKey::Interface(id)) => TypeKey::Interface(id),
                Some(TypeKey::Enum(_)) => {
                    return Err(ModelError::KindConflict { name: decl.name.clone() })
                }
                None => {
                    next_interface += 1;
                    TypeKey::Interface(InterfaceId(next_interface - 1))
                }
            };
            if local.insert(decl.name.as_str(), key).is_some() {
                return Err(ModelError::DuplicateType(decl.name.clone()));
            }
        }

        // Pass 2: resolve every type reference
        let lookup = |name: &str| local.get(name).copied().or_else(|| self.lookup(name));

        let mut enums = Vec::with_capacity(model.enums.len());
        for decl in &model.enums {
            let Some(TypeKey::Enum(id)) = local.get(decl.name.as_str()).copied() else {
                return Err(ModelError::DuplicateType(decl.name.clone()));
            };
            enums.push(build_enum(decl, id)?);
        }

        let mut interfaces = Vec::with_capacity(model.interfaces.len());
        for decl in &model.interfaces {
            let Some(TypeKey::Interface(id)) = local.get(decl.name.as_str()).copied() else {
                return Err(ModelError::DuplicateType(decl.name.clone()));
            };
            interfaces.push(build_interface(decl, id, &lookup)?);
        }

        // Pass 3: previously registered names must match exactly
        {
            let registered = self.enums.read();
            for desc in enums.iter().filter(|d| d.id.index() < existing_enums) {
                if *registered[desc.id.index()] != *desc {
                    return Err(ModelError::Redefinition { name: desc.name.clone() });
                }
            }
        }
        {
            let registered = self.interfaces.read();
            for desc in interfaces.iter().filter(|d| d.id.index() < existing_interfaces) {
                if *registered[desc.id.index()] != *desc {
                    return Err(ModelError::Redefinition { name: desc.name.clone() });
                }
            }
        }

        let loaded = LoadedModel {
            namespace: model.namespace.clone(),
            interfaces: interfaces.iter().map(|d| (d.name.clone(), d.id)).collect(),
            enums: enums.iter().map(|d| (d.name.clone(), d.id)).collect(),
        };

        // Commit new descriptors in id order
        {
            let mut table = self.enums.write();
            for desc in enums.into_iter().filter(|d| d.id.index() >= existing_enums) {
                debug_assert_eq!(desc.id.index(), table.len());
                self.names.insert(desc.name.clone(), TypeKey::Enum(desc.id));
                table.push(Arc::new(desc));
            }
        }
        {
            let mut table = self.interfaces.write();
            for desc in interfaces.into_iter().filter(|d| d.id.index() >= existing_interfaces) {
                debug_assert_eq!(desc.id.index(), table.len());
                self.names.insert(desc.name.clone(), TypeKey::Interface(desc.id));
                table.push(Arc::new(desc));
            }
        }

        log_model_loaded(&loaded.namespace, loaded.interfaces.len(), loaded.enums.len());
        Ok(loaded)
    }

    pub fn lookup(&self, name: &str) -> Option<TypeKey> {
        self.names.get(name).map(|entry| *entry.value())
    }

    pub fn interface(&self, id: InterfaceId) -> Option<Arc<InterfaceDescriptor>> {
        self.interfaces.read().get(id.index()).cloned()
    }

    pub fn interface_by_name(&self, name: &str) -> Option<Arc<InterfaceDescriptor>> {
        match self.lookup(name)? {
            TypeKey::Interface(id) => self.interface(id),
            TypeKey::Enum(_) => None,
        }
    }

    pub fn enum_desc(&self, id: EnumId) -> Option<Arc<EnumDescriptor>> {
        self.enums.read().get(id.index()).cloned()
    }

    pub fn enum_by_name(&self, name: &str) -> Option<Arc<EnumDescriptor>> {
        match self.lookup(name)? {
            TypeKey::Enum(id) => self.enum_desc(id),
            TypeKey::Interface(_) => None,
        }
    }

    /// Snapshot of every registered interface
    pub fn interfaces(&self) -> Vec<Arc<InterfaceDescriptor>> {
        self.interfaces.read().clone()
    }

    pub fn register_factory<F>(&self, id: InterfaceId, factory: F)
    where
        F: Fn() -> Result<Arc<dyn BoundaryObject>, DomainError> + Send + Sync + 'static,
    {
        debug!(interface = %self.tag_name(TypeTag::Interface(id)), "factory registered");
        self.factories.insert(id, Arc::new(factory));
    }

    pub fn has_factory(&self, id: InterfaceId) -> bool {
        self.factories.contains_key(&id)
    }

    /// Run the interface's factory; the new object starts with one reference
    pub fn create(&self, id: InterfaceId) -> BridgeResult<ObjRef> {
        let factory = self
            .factories
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                BridgeError::invalid_argument(format!(
                    "no factory registered for {}",
                    self.tag_name(TypeTag::Interface(id))
                ))
            })?;

        let object = factory()?;
        Ok(ObjRef::new_interface(id, object))
    }

    /// Display name for a handle tag
    pub fn tag_name(&self, tag: TypeTag) -> String {
        match tag {
            TypeTag::Interface(id) => self
                .interface(id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| id.to_string()),
            TypeTag::String => "string".to_string(),
            TypeTag::Array => "array".to_string(),
            TypeTag::Dict => "dict".to_string(),
            TypeTag::Set => "set".to_string(),
        }
    }

    /// IDL spelling of a resolved type
    pub fn type_name(&self, ty: &TypeDesc) -> String {
        match ty {
            TypeDesc::Void => "void".to_string(),
            TypeDesc::Bool => "bool".to_string(),
            TypeDesc::I32 => "int32_t".to_string(),
            TypeDesc::I64 => "int64_t".to_string(),
            TypeDesc::F32 => "float".to_string(),
            TypeDesc::F64 => "double".to_string(),
            TypeDesc::String => "string_t".to_string(),
            TypeDesc::Enum(id) => self
                .enum_desc(*id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| id.to_string()),
            TypeDesc::Interface(id) => self.tag_name(TypeTag::Interface(*id)),
            TypeDesc::Array(elem) => format!("array<{}>", self.type_name(elem)),
            TypeDesc::Set(elem) => format!("set<{}>", self.type_name(elem)),
            TypeDesc::Dict(key, value) => {
                format!("dict<{},{}>", self.type_name(key), self.type_name(value))
            }
        }
    }
}

fn build_enum(decl: &EnumDecl, id: EnumId) -> Result<EnumDescriptor, ModelError> {
    let backing = EnumBacking::parse(&decl.backing).ok_or_else(|| ModelError::InvalidBacking {
        enum_name: decl.name.clone(),
        backing: decl.backing.clone(),
    })?;

    let mut seen = HashSet::new();
    let mut values = Vec::with_capacity(decl.values.len());
    for value in &decl.values {
        if !seen.insert(value.name.as_str()) {
            return Err(ModelError::DuplicateEnumValue {
                enum_name: decl.name.clone(),
                value: value.name.clone(),
            });
        }
        if !backing.contains(value.value) {
            return Err(ModelError::EnumValueOutOfRange {
                enum_name: decl.name.clone(),
                value: value.name.clone(),
            });
        }
        values.push((value.name.clone(), value.value));
    }

    Ok(EnumDescriptor {
        id,
        name: decl.name.clone(),
        backing,
        values,
    })
}

fn build_interface(
    decl: &InterfaceDecl,
    id: InterfaceId,
    lookup: &impl Fn(&str) -> Option<TypeKey>,
) -> Result<InterfaceDescriptor, ModelError> {
    let mut method_names = HashSet::new();
    let mut methods = Vec::with_capacity(decl.methods.len());

    for method in &decl.methods {
        if !method_names.insert(method.name.as_str()) {
            return Err(ModelError::DuplicateMember {
                interface: decl.name.clone(),
                kind: "method",
                name: method.name.clone(),
            });
        }

        let qualified = format!("{}.{}", decl.name, method.name);
        let returns = resolve_type(
            &TypeExpr::parse(&method.return_type)?,
            lookup,
            &format!("return type of {}", qualified),
        )?;
        if returns != TypeDesc::Void && returns.contains_void() {
            return Err(ModelError::VoidNotAllowed {
                context: format!("return type of {}", qualified),
            });
        }

        let mut param_names = HashSet::new();
        let mut params = Vec::with_capacity(method.parameters.len());
        for param in &method.parameters {
            if !param_names.insert(param.name.as_str()) {
                return Err(ModelError::DuplicateParameter {
                    method: qualified.clone(),
                    name: param.name.clone(),
                });
            }
            let context = format!("parameter '{}' of {}", param.name, qualified);
            let ty = resolve_type(&TypeExpr::parse(&param.ty)?, lookup, &context)?;
            if ty.contains_void() {
                return Err(ModelError::VoidNotAllowed { context });
            }
            params.push(ParamDescriptor {
                name: param.name.clone(),
                ty,
            });
        }

        methods.push(MethodDescriptor {
            name: method.name.clone(),
            params,
            returns,
        });
    }

    let mut property_names = HashSet::new();
    let mut properties = Vec::with_capacity(decl.properties.len());
    for prop in &decl.properties {
        if !property_names.insert(prop.name.as_str()) {
            return Err(ModelError::DuplicateMember {
                interface: decl.name.clone(),
                kind: "property",
                name: prop.name.clone(),
            });
        }
        if method_names.contains(prop.name.as_str()) {
            return Err(ModelError::MemberConflict {
                interface: decl.name.clone(),
                name: prop.name.clone(),
            });
        }

        let context = format!("property {}.{}", decl.name, prop.name);
        let ty = resolve_type(&TypeExpr::parse(&prop.ty)?, lookup, &context)?;
        if ty.contains_void() {
            return Err(ModelError::VoidNotAllowed { context });
        }
        properties.push(PropertyDescriptor {
            name: prop.name.clone(),
            ty,
            read_only: !prop.writable,
        });
    }

    Ok(InterfaceDescriptor {
        id,
        name: decl.name.clone(),
        properties,
        methods,
    })
}

fn resolve_type(
    expr: &TypeExpr,
    lookup: &impl Fn(&str) -> Option<TypeKey>,
    context: &str,
) -> Result<TypeDesc, ModelError> {
    match expr {
        TypeExpr::Named(name) => {
            if let Some(primitive) = TypeDesc::primitive(name) {
                return Ok(primitive);
            }
            match lookup(name) {
                Some(TypeKey::Interface(id)) => Ok(TypeDesc::Interface(id)),
                Some(TypeKey::Enum(id)) => Ok(TypeDesc::Enum(id)),
                None => Err(ModelError::UnknownType {
                    name: name.clone(),
                    context: context.to_string(),
                }),
            }
        }
        TypeExpr::Array(elem) => Ok(TypeDesc::Array(Box::new(resolve_type(elem, lookup, context)?))),
        TypeExpr::Set(elem) => Ok(TypeDesc::Set(Box::new(resolve_type(elem, lookup, context)?))),
        TypeExpr::Dict(key, value) => {
            let key = resolve_type(key, lookup, context)?;
            if !key.is_key() {
                return Err(ModelError::InvalidDictKey {
                    context: context.to_string(),
                });
            }
            let value = resolve_type(value, lookup, context)?;
            Ok(TypeDesc::Dict(Box::new(key), Box::new(value)))
        }
    }
}
