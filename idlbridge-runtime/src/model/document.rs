//! Serialized interface model emitted by the IDL front end
//!
//! The front end hands the runtime a JSON document. Type references are kept
//! in their IDL spelling (`array<string_t>`, `dict<Status,int32_t>`, ...) and
//! are resolved when the document is registered.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceModel {
    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub enums: Vec<EnumDecl>,

    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,

    #[serde(default = "default_backing")]
    pub backing: String,

    #[serde(default)]
    pub values: Vec<EnumValueDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValueDecl {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,

    #[serde(default)]
    pub properties: Vec<PropertyDecl>,

    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default)]
    pub writable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,

    #[serde(default = "default_return")]
    pub return_type: String,

    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,
}

fn default_backing() -> String { "int32_t".to_string() }
fn default_return() -> String { "void".to_string() }

impl InterfaceModel {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::Parse(e.to_string()))
    }
}

/// Unresolved type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(String),
    Array(Box<TypeExpr>),
    Dict(Box<TypeExpr>, Box<TypeExpr>),
    Set(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        let text = text.trim();
        let malformed = || ModelError::MalformedType(text.to_string());

        if let Some(open) = text.find('<') {
            if !text.ends_with('>') {
                return Err(malformed());
            }
            let head = text[..open].trim();
            let body = &text[open + 1..text.len() - 1];
            let args = split_top_level(body).ok_or_else(malformed)?;

            match (head, args.as_slice()) {
                ("array", [elem]) => Ok(Self::Array(Box::new(Self::parse(elem)?))),
                ("set", [elem]) => Ok(Self::Set(Box::new(Self::parse(elem)?))),
                ("dict", [key, value]) => Ok(Self::Dict(
                    Box::new(Self::parse(key)?),
                    Box::new(Self::parse(value)?),
                )),
                _ => Err(malformed()),
            }
        } else if is_identifier(text) {
            Ok(Self::Named(text.to_string()))
        } else {
            Err(malformed())
        }
    }
}

/// Split generic arguments on commas that are not nested in `<...>`
fn split_top_level(body: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return None;
    }
    parts.push(&body[start..]);
    Some(parts)
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Model loading and validation failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    Parse(String),
    MalformedType(String),
    DuplicateType(String),
    KindConflict { name: String },
    Redefinition { name: String },
    InvalidBacking { enum_name: String, backing: String },
    DuplicateEnumValue { enum_name: String, value: String },
    EnumValueOutOfRange { enum_name: String, value: String },
    DuplicateMember { interface: String, kind: &'static str, name: String },
    MemberConflict { interface: String, name: String },
    DuplicateParameter { method: String, name: String },
    UnknownType { name: String, context: String },
    VoidNotAllowed { context: String },
    InvalidDictKey { context: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "Failed to parse interface model: {}", msg),
            Self::MalformedType(text) => write!(f, "Malformed type reference '{}'", text),
            Self::DuplicateType(name) => write!(f, "Duplicate type definition: {}", name),
            Self::KindConflict { name } => {
                write!(f, "Type '{}' is already registered as a different kind", name)
            }
            Self::Redefinition { name } => {
                write!(f, "Type '{}' is already registered with a different definition", name)
            }
            Self::InvalidBacking { enum_name, backing } => {
                write!(f, "Invalid enum backing type '{}' for {}", backing, enum_name)
            }
            Self::DuplicateEnumValue { enum_name, value } => {
                write!(f, "Duplicate enum value '{}' in {}", value, enum_name)
            }
            Self::EnumValueOutOfRange { enum_name, value } => {
                write!(f, "Enum value '{}' does not fit the backing type of {}", value, enum_name)
            }
            Self::DuplicateMember { interface, kind, name } => {
                write!(f, "Duplicate {} name '{}' in interface {}", kind, name, interface)
            }
            Self::MemberConflict { interface, name } => {
                write!(f, "Property '{}' conflicts with method name in interface {}", name, interface)
            }
            Self::DuplicateParameter { method, name } => {
                write!(f, "Duplicate parameter name '{}' in method {}", name, method)
            }
            Self::UnknownType { name, context } => {
                write!(f, "Unknown type '{}' in {}", name, context)
            }
            Self::VoidNotAllowed { context } => write!(f, "void is not allowed in {}", context),
            Self::InvalidDictKey { context } => {
                write!(f, "Dictionary key in {} must be a string, integer or enum", context)
            }
        }
    }
}

impl std::error::Error for ModelError {}
