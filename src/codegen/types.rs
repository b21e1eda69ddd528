//! Type Mapping
//!
//! Maps leaf types to language-agnostic `MappedType`s. Leafrefs are
//! followed through the schema index, enumerations and identityrefs are
//! looked up in the run's `EnumSet`, and unions are flattened into one
//! ordered, deduplicated member table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::enums::EnumSet;
use super::names::camel_case;
use crate::mapping::{DiagnosticCode, Diagnostics};
use crate::schema::index::strip_module_prefix;
use crate::schema::{NodeId, SchemaIndex, SchemaTree, TypeDescriptor, TypeKind};

/// Prefix of native type identifiers naming an enum entity
pub const ENUM_PREFIX: &str = "enum:";
/// Prefix of native type identifiers naming a synthetic union
pub const UNION_PREFIX: &str = "union:";

// =============================================================================
// Mapped Type
// =============================================================================

/// The resolved type of a leaf, leaf-list or list key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedType {
    /// `int32`, `string`, `enum:<Name>`, `union:<Name>`, ...
    pub native_type: String,

    /// Union member identifier -> position of first appearance
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub union_types: BTreeMap<String, usize>,

    /// Member types, in position order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub union_members: Vec<MappedType>,

    #[serde(default)]
    pub is_enumerated_value: bool,

    pub zero_value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl MappedType {
    pub fn scalar(native_type: &str, zero_value: &str) -> Self {
        Self {
            native_type: native_type.to_string(),
            union_types: BTreeMap::new(),
            union_members: Vec::new(),
            is_enumerated_value: false,
            zero_value: zero_value.to_string(),
            default_value: None,
        }
    }

    pub fn enumerated(name: &str) -> Self {
        Self {
            is_enumerated_value: true,
            ..Self::scalar(&format!("{}{}", ENUM_PREFIX, name), &format!("{}_UNSET", name))
        }
    }

    pub fn is_union(&self) -> bool {
        self.native_type.starts_with(UNION_PREFIX)
    }

    /// Entity name when this is an enumerated type
    pub fn enum_name(&self) -> Option<&str> {
        self.native_type.strip_prefix(ENUM_PREFIX)
    }

    /// Union member identifiers in position order
    pub fn union_member_ids(&self) -> Vec<&str> {
        self.union_members.iter().map(|m| m.native_type.as_str()).collect()
    }
}

/// Native type and zero value of a built-in scalar kind
fn scalar_for(kind: TypeKind) -> Option<MappedType> {
    let (native, zero) = match kind {
        TypeKind::Int8
        | TypeKind::Int16
        | TypeKind::Int32
        | TypeKind::Int64
        | TypeKind::Uint8
        | TypeKind::Uint16
        | TypeKind::Uint32
        | TypeKind::Uint64 => (kind.as_str(), "0"),
        TypeKind::String => ("string", "\"\""),
        TypeKind::Boolean => ("bool", "false"),
        TypeKind::Decimal64 => ("decimal64", "0.0"),
        TypeKind::Binary => ("binary", "[]"),
        TypeKind::Empty => ("empty", "false"),
        TypeKind::Bits => ("bits", "[]"),
        TypeKind::InstanceIdentifier => ("instance-identifier", "\"\""),
        _ => return None,
    };
    Some(MappedType::scalar(native, zero))
}

// =============================================================================
// Type Resolver
// =============================================================================

/// Maps leaf types for one generation run
pub struct TypeResolver<'a> {
    tree: &'a SchemaTree,
    index: &'a SchemaIndex,
    enums: &'a EnumSet,
}

impl<'a> TypeResolver<'a> {
    pub fn new(tree: &'a SchemaTree, index: &'a SchemaIndex, enums: &'a EnumSet) -> Self {
        Self { tree, index, enums }
    }

    /// Type of a leaf or leaf-list, with its default value token.
    ///
    /// `owner` is the name of the directory holding the field; synthetic
    /// union names are derived from it.
    pub fn leaf_type(&self, leaf: NodeId, owner: &str) -> Result<MappedType, Diagnostics> {
        let node = self.tree.node(leaf);
        let Some(ty) = node.type_desc.as_ref() else {
            let path = self.tree.path_string(leaf);
            let mut diagnostics = Diagnostics::new();
            diagnostics.error(&path, DiagnosticCode::MissingType, format!("{} {} has no type", node.kind.as_str(), path));
            return Err(diagnostics);
        };

        let mut mapped = if ty.is_union() {
            self.flatten_union(leaf, ty, owner)?
        } else {
            let mut diagnostics = Diagnostics::new();
            let mapped = self.map_type(leaf, ty, owner, &mut diagnostics);
            diagnostics.into_result(mapped)?
        };

        if let Some(default) = node.default.as_ref().or(ty.default.as_ref()) {
            mapped.default_value = Some(default_token(&mapped, default));
        }
        Ok(mapped)
    }

    /// Flatten `ty` (a union) into an ordered member table.
    ///
    /// Nested unions are spliced in place; a member whose native type was
    /// already seen keeps its first position. A single remaining member is
    /// returned as is.
    pub fn flatten_union(
        &self,
        leaf: NodeId,
        ty: &TypeDescriptor,
        owner: &str,
    ) -> Result<MappedType, Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        let mapped = self.map_union(leaf, ty, owner, &mut diagnostics);
        diagnostics.into_result(mapped)
    }

    fn map_type(&self, leaf: NodeId, ty: &TypeDescriptor, owner: &str, diagnostics: &mut Diagnostics) -> MappedType {
        match ty.kind {
            TypeKind::Leafref => self.map_leafref(leaf, ty, owner, diagnostics),
            TypeKind::Enumeration | TypeKind::Identityref => match self.enums.name_for(self.tree, leaf, ty) {
                Some(name) => MappedType::enumerated(name),
                None => {
                    let path = self.tree.path_string(leaf);
                    diagnostics.error(
                        &path,
                        DiagnosticCode::EnumWithoutContext,
                        format!("no enumeration found for {} leaf {}", ty.kind.as_str(), path),
                    );
                    unresolved()
                }
            },
            TypeKind::Union => self.map_union(leaf, ty, owner, diagnostics),
            kind => scalar_for(kind).unwrap_or_else(|| {
                let path = self.tree.path_string(leaf);
                diagnostics.error(
                    &path,
                    DiagnosticCode::UnsupportedType,
                    format!("unsupported type {} at {}", kind.as_str(), path),
                );
                unresolved()
            }),
        }
    }

    /// The target leaf's type, mapped in the target's own context
    fn map_leafref(&self, leaf: NodeId, ty: &TypeDescriptor, owner: &str, diagnostics: &mut Diagnostics) -> MappedType {
        let path = ty.path.as_deref().unwrap_or_default();
        let target = self.index.resolve_leafref_chain(self.tree, leaf, path);
        let target_ty = target.and_then(|t| self.tree.node(t).type_desc.as_ref().map(|ty| (t, ty)));
        match target_ty {
            Some((target, target_ty)) => self.map_type(target, target_ty, owner, diagnostics),
            None => {
                diagnostics.unresolved_leafref(self.tree.path_string(leaf), path);
                unresolved()
            }
        }
    }

    fn map_union(&self, leaf: NodeId, ty: &TypeDescriptor, owner: &str, diagnostics: &mut Diagnostics) -> MappedType {
        let mut members: Vec<MappedType> = Vec::new();
        let mut positions: BTreeMap<String, usize> = BTreeMap::new();
        self.collect_members(leaf, ty, owner, &mut members, &mut positions, diagnostics);

        match members.len() {
            0 => {
                // members that failed to map have already reported why
                if ty.has_empty_union() {
                    let path = self.tree.path_string(leaf);
                    diagnostics.error(&path, DiagnosticCode::EmptyUnion, format!("empty union in type of {}", path));
                }
                unresolved()
            }
            1 => members.remove(0),
            _ => {
                let name = format!("{}_{}_Union", owner, camel_case(&self.tree.node(leaf).name));
                MappedType {
                    union_types: positions,
                    union_members: members,
                    ..MappedType::scalar(&format!("{}{}", UNION_PREFIX, name), "null")
                }
            }
        }
    }

    fn collect_members(
        &self,
        leaf: NodeId,
        ty: &TypeDescriptor,
        owner: &str,
        members: &mut Vec<MappedType>,
        positions: &mut BTreeMap<String, usize>,
        diagnostics: &mut Diagnostics,
    ) {
        for member in &ty.union_types {
            if member.is_union() {
                self.collect_members(leaf, member, owner, members, positions, diagnostics);
                continue;
            }
            let mapped = self.map_type(leaf, member, owner, diagnostics);
            if mapped.native_type.is_empty() || positions.contains_key(&mapped.native_type) {
                continue;
            }
            positions.insert(mapped.native_type.clone(), members.len());
            members.push(mapped);
        }
    }
}

/// Placeholder for a type that failed to map; never escapes a failed run
fn unresolved() -> MappedType {
    MappedType::scalar("", "")
}

/// Render a schema default for the mapped type
fn default_token(mapped: &MappedType, default: &str) -> String {
    if let Some(name) = mapped.enum_name() {
        return format!("{}_{}", name, camel_case(strip_module_prefix(default)));
    }
    match mapped.native_type.as_str() {
        "string" | "instance-identifier" => format!("{:?}", default),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::enums::find_enum_set;
    use crate::codegen::names::NameRegistry;
    use crate::mapping::find_mappable_entities;
    use crate::schema::SchemaTreeBuilder;

    fn string() -> TypeDescriptor {
        TypeDescriptor::new(TypeKind::String)
    }

    fn int32() -> TypeDescriptor {
        TypeDescriptor::new(TypeKind::Int32)
    }

    fn boolean() -> TypeDescriptor {
        TypeDescriptor::new(TypeKind::Boolean)
    }

    struct Fixture {
        tree: SchemaTree,
        index: SchemaIndex,
        enums: EnumSet,
    }

    impl Fixture {
        fn new(tree: SchemaTree) -> Self {
            let index = SchemaIndex::build(&tree);
            let found = find_mappable_entities(&tree, &tree.generation_roots(), &[], false).unwrap();
            let mut registry = NameRegistry::new();
            let enums = find_enum_set(&tree, &found.enum_leaves, false, false, &mut registry).unwrap();
            Self { tree, index, enums }
        }

        fn resolver(&self) -> TypeResolver<'_> {
            TypeResolver::new(&self.tree, &self.index, &self.enums)
        }

        fn leaf(&self, path: &str) -> NodeId {
            self.index.leaf(path).unwrap()
        }
    }

    fn single_leaf(ty: TypeDescriptor) -> Fixture {
        let mut b = SchemaTreeBuilder::new();
        let m = b.module("mod", "urn:mod", None);
        let c = b.container(m, "c");
        b.leaf(c, "value", ty);
        Fixture::new(b.build())
    }

    #[test]
    fn test_union_flattening_is_associative() {
        let nested = single_leaf(TypeDescriptor::union(vec![
            TypeDescriptor::union(vec![string(), int32()]),
            TypeDescriptor::union(vec![boolean(), string()]),
        ]));
        let flat = single_leaf(TypeDescriptor::union(vec![string(), int32(), boolean(), string()]));

        let a = nested.resolver().leaf_type(nested.leaf("/mod/c/value"), "C").unwrap();
        let b = flat.resolver().leaf_type(flat.leaf("/mod/c/value"), "C").unwrap();

        assert_eq!(a, b);
        assert_eq!(a.union_member_ids(), vec!["string", "int32", "bool"]);
        assert_eq!(a.union_types["string"], 0);
        assert_eq!(a.union_types["int32"], 1);
        assert_eq!(a.union_types["bool"], 2);
        assert_eq!(a.native_type, "union:C_Value_Union");
    }

    #[test]
    fn test_single_member_union_promoted() {
        let f = single_leaf(TypeDescriptor::union(vec![string(), string()]));
        let mapped = f.resolver().leaf_type(f.leaf("/mod/c/value"), "C").unwrap();
        assert_eq!(mapped.native_type, "string");
        assert!(mapped.union_types.is_empty());
        assert!(!mapped.is_union());
    }

    #[test]
    fn test_identityref_member_uses_own_base() {
        let f = single_leaf(TypeDescriptor::union(vec![
            TypeDescriptor::identityref("mod", "shape", &["circle"]),
            string(),
        ]));
        let mapped = f.resolver().leaf_type(f.leaf("/mod/c/value"), "C").unwrap();
        assert_eq!(mapped.union_member_ids(), vec!["enum:Mod_Shape", "string"]);
        assert!(mapped.union_members[0].is_enumerated_value);
        assert_eq!(mapped.union_members[0].zero_value, "Mod_Shape_UNSET");
    }

    #[test]
    fn test_leafref_follows_target() {
        let mut b = SchemaTreeBuilder::new();
        let m = b.module("mod", "urn:mod", None);
        let c = b.container(m, "c");
        b.leaf(c, "target", TypeDescriptor::enumeration(&["a", "b"]));
        b.leaf(c, "pointer", TypeDescriptor::leafref("../target"));
        b.leaf(c, "dangling", TypeDescriptor::leafref("../missing"));
        let f = Fixture::new(b.build());

        let mapped = f.resolver().leaf_type(f.leaf("/mod/c/pointer"), "C").unwrap();
        assert_eq!(mapped.native_type, "enum:Mod_C_Target");

        let err = f.resolver().leaf_type(f.leaf("/mod/c/dangling"), "C").unwrap_err();
        assert!(err.contains(DiagnosticCode::UnresolvedLeafref));
    }

    #[test]
    fn test_default_tokens() {
        let mut b = SchemaTreeBuilder::new();
        let m = b.module("mod", "urn:mod", None);
        let c = b.container(m, "c");
        let e = b.leaf(c, "mode", TypeDescriptor::enumeration(&["fast-path", "slow"]));
        b.set_default(e, "fast-path");
        b.leaf(c, "label", string().with_default("eth0"));
        b.leaf(c, "mtu", TypeDescriptor::new(TypeKind::Uint16).with_default("1500"));
        let f = Fixture::new(b.build());
        let r = f.resolver();

        let mode = r.leaf_type(f.leaf("/mod/c/mode"), "C").unwrap();
        assert_eq!(mode.default_value.as_deref(), Some("Mod_C_Mode_FastPath"));
        let label = r.leaf_type(f.leaf("/mod/c/label"), "C").unwrap();
        assert_eq!(label.default_value.as_deref(), Some("\"eth0\""));
        let mtu = r.leaf_type(f.leaf("/mod/c/mtu"), "C").unwrap();
        assert_eq!(mtu.native_type, "uint16");
        assert_eq!(mtu.default_value.as_deref(), Some("1500"));
    }

    #[test]
    fn test_flatten_union_splices_leafref_members() {
        let mut b = SchemaTreeBuilder::new();
        let m = b.module("mod", "urn:mod", None);
        let c = b.container(m, "c");
        b.leaf(c, "count", TypeDescriptor::new(TypeKind::Uint8));
        let ty = TypeDescriptor::union(vec![
            TypeDescriptor::leafref("../count"),
            TypeDescriptor::union(vec![string(), TypeDescriptor::new(TypeKind::Uint8)]),
        ]);
        b.leaf(c, "either", ty.clone());
        let f = Fixture::new(b.build());

        let mapped = f.resolver().flatten_union(f.leaf("/mod/c/either"), &ty, "C").unwrap();
        assert_eq!(mapped.native_type, "union:C_Either_Union");
        assert_eq!(mapped.union_member_ids(), vec!["uint8", "string"]);
        assert_eq!(mapped.zero_value, "null");
    }

    #[test]
    fn test_union_of_failing_members_reports_only_members() {
        let f = single_leaf(TypeDescriptor::union(vec![
            TypeDescriptor::leafref("../nowhere"),
            TypeDescriptor::leafref("../elsewhere"),
        ]));
        let err = f.resolver().leaf_type(f.leaf("/mod/c/value"), "C").unwrap_err();
        assert_eq!(err.error_count(), 2);
        assert!(err.all().iter().all(|d| d.code == DiagnosticCode::UnresolvedLeafref));

        let empty = single_leaf(TypeDescriptor::union(Vec::new()));
        let err = empty.resolver().leaf_type(empty.leaf("/mod/c/value"), "C").unwrap_err();
        assert!(err.contains(DiagnosticCode::EmptyUnion));
    }

    #[test]
    fn test_unsupported_type() {
        let f = single_leaf(TypeDescriptor::new(TypeKind::Unknown));
        let err = f.resolver().leaf_type(f.leaf("/mod/c/value"), "C").unwrap_err();
        assert!(err.contains(DiagnosticCode::UnsupportedType));
    }
}
