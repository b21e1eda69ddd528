//! Type Descriptors
//!
//! The type information the parser attaches to leaves and leaf-lists.
//! Descriptors are plain data: resolution of leafrefs, enumerations and
//! unions happens in the codegen passes.

use serde::{Deserialize, Serialize};

// =============================================================================
// Type Kind
// =============================================================================

/// Built-in type a descriptor resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    String,
    Boolean,
    Decimal64,
    Binary,
    Enumeration,
    Identityref,
    Union,
    Leafref,
    Empty,
    InstanceIdentifier,
    Bits,
    /// Anything the parser handed over that we do not know how to map
    #[serde(other)]
    Unknown,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Decimal64 => "decimal64",
            Self::Binary => "binary",
            Self::Enumeration => "enumeration",
            Self::Identityref => "identityref",
            Self::Union => "union",
            Self::Leafref => "leafref",
            Self::Empty => "empty",
            Self::InstanceIdentifier => "instance-identifier",
            Self::Bits => "bits",
            Self::Unknown => "unknown",
        }
    }
}

// =============================================================================
// References
// =============================================================================

/// A single enumeration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

impl EnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// The typedef an enumeration was derived from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedefRef {
    /// Module that defines the typedef
    pub module: String,
    pub name: String,
}

/// Base identity of an identityref
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRef {
    /// Module that defines the base identity
    pub module: String,
    /// Base identity name (empty means the parser could not find one)
    #[serde(default)]
    pub base: String,
    /// Identities derived from the base
    #[serde(default)]
    pub values: Vec<String>,
}

// =============================================================================
// Type Descriptor
// =============================================================================

/// Type attached to a leaf or leaf-list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub kind: TypeKind,

    /// Set when the type is a typedef rather than an inline built-in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typedef: Option<TypedefRef>,

    /// Union members, in declaration order
    #[serde(default, rename = "union", skip_serializing_if = "Vec::is_empty")]
    pub union_types: Vec<TypeDescriptor>,

    /// Leafref target path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<EnumValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl TypeDescriptor {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            typedef: None,
            union_types: Vec::new(),
            path: None,
            enum_values: Vec::new(),
            identity: None,
            default: None,
        }
    }

    /// Inline `enumeration` with the given value names
    pub fn enumeration(values: &[&str]) -> Self {
        Self {
            enum_values: values.iter().map(|v| EnumValue::new(*v)).collect(),
            ..Self::new(TypeKind::Enumeration)
        }
    }

    /// Enumeration derived from a typedef
    pub fn typedef_enum(module: &str, name: &str, values: &[&str]) -> Self {
        Self {
            typedef: Some(TypedefRef {
                module: module.to_string(),
                name: name.to_string(),
            }),
            ..Self::enumeration(values)
        }
    }

    pub fn identityref(module: &str, base: &str, values: &[&str]) -> Self {
        Self {
            identity: Some(IdentityRef {
                module: module.to_string(),
                base: base.to_string(),
                values: values.iter().map(|v| v.to_string()).collect(),
            }),
            ..Self::new(TypeKind::Identityref)
        }
    }

    pub fn union(members: Vec<TypeDescriptor>) -> Self {
        Self {
            union_types: members,
            ..Self::new(TypeKind::Union)
        }
    }

    pub fn leafref(path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            ..Self::new(TypeKind::Leafref)
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Is this an enumeration or identityref itself?
    pub fn is_enumerated(&self) -> bool {
        matches!(self.kind, TypeKind::Enumeration | TypeKind::Identityref)
    }

    pub fn is_union(&self) -> bool {
        self.kind == TypeKind::Union
    }

    /// Inline enumerations are the ones not derived from a typedef
    pub fn is_inline_enum(&self) -> bool {
        self.kind == TypeKind::Enumeration && self.typedef.is_none()
    }

    /// Enumerated, or a union containing an enumerated member at any depth
    pub fn contains_enumerated(&self) -> bool {
        if self.is_enumerated() {
            return true;
        }
        self.is_union() && self.union_types.iter().any(|t| t.contains_enumerated())
    }

    /// All enumeration/identityref members, unions-of-unions flattened in order
    pub fn enumerated_members(&self) -> Vec<&TypeDescriptor> {
        let mut out = Vec::new();
        collect_enumerated(self, &mut out);
        out
    }

    /// Does this union (or any nested union) have no members?
    pub fn has_empty_union(&self) -> bool {
        self.is_union()
            && (self.union_types.is_empty() || self.union_types.iter().any(|t| t.has_empty_union()))
    }
}

fn collect_enumerated<'a>(ty: &'a TypeDescriptor, out: &mut Vec<&'a TypeDescriptor>) {
    if ty.is_enumerated() {
        out.push(ty);
    } else if ty.is_union() {
        for member in &ty.union_types {
            collect_enumerated(member, out);
        }
    }
}
