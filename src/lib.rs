//! Familiar Ygen
//!
//! Schema compression and structural mapping engine. Takes a parsed schema
//! tree (modules, containers, lists, leaves, choices, enumerations,
//! identities, unions) and produces a normalized IR of uniquely named
//! directories and enumerations for per-language emitters.
//!
//! ## Pipeline
//!
//! ```text
//! JSON modules ──load──▶ SchemaTree ──index──▶ SchemaIndex
//!                             │
//!                             ▼
//!            find_mappable_entities (directories, enum leaves)
//!                             │
//!               create_fake_root (optional)
//!                             │
//!               find_enum_set (group + name enums)
//!                             │
//!      build_ir (find_all_children, TypeResolver, resolve_list_key)
//!                             │
//!                             ▼
//!                            Ir
//! ```
//!
//! Every run owns its own name registries and maps; output is ordered by
//! path or name so identical input gives byte-identical IR.

pub mod checksum;
pub mod codegen;
pub mod config;
pub mod error;
pub mod mapping;
pub mod schema;

pub use checksum::IrChecksum;
pub use codegen::{
    generate_from_files, Directory, EnumEntity, EnumKind, Field, FieldKind, Ir, IrGenerator,
    ListKeyInfo, MappedType, NameRegistry,
};
pub use config::{CompressBehaviour, GenerateConfig, OutputFormat, YgenConfig};
pub use error::{ErrorCategory, Result, YgenError};
pub use mapping::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use schema::{load_modules, NodeId, NodeKind, SchemaTree, SchemaTreeBuilder, TypeDescriptor, TypeKind};
