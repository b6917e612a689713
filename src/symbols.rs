//! Boundary entry points implied by an interface model
//!
//! Lists the C functions a binding for the model exports, with prototypes in
//! the handle typedef spelling used by generated headers.

use std::fmt;

use idlbridge_runtime::model::{InterfaceDescriptor, TypeDesc};
use idlbridge_runtime::registry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundarySymbol {
    pub name: String,
    pub returns: String,
    pub params: Vec<(String, String)>,
}

impl BoundarySymbol {
    fn new(name: String, returns: impl Into<String>) -> Self {
        Self {
            name,
            returns: returns.into(),
            params: Vec::new(),
        }
    }

    fn param(mut self, ty: impl Into<String>, name: impl Into<String>) -> Self {
        self.params.push((ty.into(), name.into()));
        self
    }
}

impl fmt::Display for BoundarySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.returns, self.name)?;
        if self.params.is_empty() {
            write!(f, "void")?;
        }
        for (i, (ty, name)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", ty, name)?;
        }
        write!(f, ");")
    }
}

/// C spelling of a declared type at the boundary
pub fn c_type(namespace: &str, ty: &TypeDesc) -> String {
    match ty {
        TypeDesc::Void => "void".to_string(),
        TypeDesc::Bool => "bool".to_string(),
        TypeDesc::I32 => "int32_t".to_string(),
        TypeDesc::I64 => "int64_t".to_string(),
        TypeDesc::F32 => "float".to_string(),
        TypeDesc::F64 => "double".to_string(),
        TypeDesc::String => "IDynamicString_Handle".to_string(),
        TypeDesc::Enum(_) => registry().type_name(ty),
        TypeDesc::Interface(_) => format!("{}_Handle", registry().type_name(ty)),
        TypeDesc::Array(_) => format!("{}Array_Handle", namespace),
        TypeDesc::Dict(..) => format!("{}Dict_Handle", namespace),
        TypeDesc::Set(_) => format!("{}Set_Handle", namespace),
    }
}

/// Entry points of one interface, in declaration order
pub fn interface_symbols(namespace: &str, desc: &InterfaceDescriptor) -> Vec<BoundarySymbol> {
    let iface = desc.name.as_str();
    let this = format!("{}_Handle", iface);
    let mut out = vec![
        BoundarySymbol::new(format!("{}_Create", iface), this.clone()),
        BoundarySymbol::new(format!("{}_AddRef", iface), this.clone()).param(&this, "handle"),
        BoundarySymbol::new(format!("{}_Release", iface), "bool").param(&this, "handle"),
    ];

    for prop in &desc.properties {
        let ty = c_type(namespace, &prop.ty);
        out.push(
            BoundarySymbol::new(format!("{}_Get{}", iface, prop.name), ty.clone())
                .param(&this, "handle"),
        );
        if !prop.read_only {
            out.push(
                BoundarySymbol::new(format!("{}_Set{}", iface, prop.name), "bool")
                    .param(&this, "handle")
                    .param(ty, "value"),
            );
        }

        if let TypeDesc::Array(elem) = &prop.ty {
            let elem = c_type(namespace, elem);
            out.push(
                BoundarySymbol::new(format!("{}_Get{}_Count", iface, prop.name), "size_t")
                    .param(&this, "handle"),
            );
            out.push(
                BoundarySymbol::new(format!("{}_Get{}_Item", iface, prop.name), elem.clone())
                    .param(&this, "handle")
                    .param("size_t", "index"),
            );
            if !prop.read_only {
                out.push(
                    BoundarySymbol::new(format!("{}_Set{}_Clear", iface, prop.name), "bool")
                        .param(&this, "handle"),
                );
                out.push(
                    BoundarySymbol::new(format!("{}_Set{}_Add", iface, prop.name), "bool")
                        .param(&this, "handle")
                        .param(elem, "value"),
                );
            }
        }
    }

    for method in &desc.methods {
        let returns = match method.returns {
            TypeDesc::Void => "bool".to_string(),
            ref ty => c_type(namespace, ty),
        };
        let symbol = method.params.iter().fold(
            BoundarySymbol::new(format!("{}_{}", iface, method.name), returns)
                .param(&this, "handle"),
            |symbol, p| symbol.param(c_type(namespace, &p.ty), &p.name),
        );
        out.push(symbol);
    }

    out
}

/// Error channel and collection helpers shared by a namespace
pub fn namespace_symbols(namespace: &str) -> Vec<BoundarySymbol> {
    let mut out = vec![
        BoundarySymbol::new(format!("{}_GetLastError", namespace), "const char*"),
        BoundarySymbol::new(format!("{}_ClearError", namespace), "void"),
    ];

    let array = format!("{}Array_Handle", namespace);
    out.push(BoundarySymbol::new(format!("{}Array_Count", namespace), "size_t").param(&array, "handle"));
    out.push(
        BoundarySymbol::new(format!("{}Array_Item", namespace), "bool")
            .param(&array, "handle")
            .param("size_t", "index")
            .param("TypedValue*", "out"),
    );
    out.push(BoundarySymbol::new(format!("{}Array_Release", namespace), "bool").param(&array, "handle"));

    let dict = format!("{}Dict_Handle", namespace);
    out.push(BoundarySymbol::new(format!("{}Dict_Count", namespace), "size_t").param(&dict, "handle"));
    out.push(
        BoundarySymbol::new(format!("{}Dict_Next", namespace), "bool")
            .param(&dict, "handle")
            .param("TypedValue*", "key")
            .param("TypedValue*", "value"),
    );
    out.push(BoundarySymbol::new(format!("{}Dict_Reset", namespace), "bool").param(&dict, "handle"));
    out.push(BoundarySymbol::new(format!("{}Dict_Release", namespace), "bool").param(&dict, "handle"));

    let set = format!("{}Set_Handle", namespace);
    out.push(BoundarySymbol::new(format!("{}Set_Count", namespace), "size_t").param(&set, "handle"));
    out.push(
        BoundarySymbol::new(format!("{}Set_Next", namespace), "bool")
            .param(&set, "handle")
            .param("TypedValue*", "value"),
    );
    out.push(BoundarySymbol::new(format!("{}Set_Reset", namespace), "bool").param(&set, "handle"));
    out.push(BoundarySymbol::new(format!("{}Set_Release", namespace), "bool").param(&set, "handle"));

    out
}
