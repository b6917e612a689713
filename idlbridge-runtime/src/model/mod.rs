//! Interface model - descriptors consumed read-only by the boundary
//!
//! Architecture:
//! - `document.rs` - serialized model from the IDL front end (JSON)
//! - `types.rs` - resolved type descriptors and ids
//! - `descriptor.rs` - interface, property, method and enum descriptors
//! - `registry.rs` - process-wide registry with validation and factories

mod descriptor;
mod document;
mod registry;
mod types;

pub use descriptor::{
    EnumDescriptor, InterfaceDescriptor, MethodDescriptor, ParamDescriptor, PropertyDescriptor,
};
pub use document::{
    EnumDecl, EnumValueDecl, InterfaceDecl, InterfaceModel, MethodDecl, ModelError, ParameterDecl,
    PropertyDecl, TypeExpr,
};
pub use registry::{registry, Factory, LoadedModel, TypeKey, TypeRegistry};
pub use types::{EnumBacking, EnumId, InterfaceId, TypeDesc};
