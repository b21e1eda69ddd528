//! IR Generation
//!
//! Runs the mapping passes over a loaded schema tree and assembles the IR
//! handed to per-language emitters.
//!
//! Architecture:
//! - `IrGenerator`: owns one run's configuration; `generate()` is the whole
//!   pipeline and allocates every piece of mutable state itself
//! - `names`: per-run name registries (one for enums, one for directories)
//! - `enums` / `types` / `keys`: enumeration naming, type mapping, list keys
//! - `ir`: the directory/field IR and its builder
//!
//! Each phase collects all of its errors and the run stops at the first
//! phase that reports any; the sorted batch is returned.

pub mod enums;
pub mod ir;
pub mod keys;
pub mod names;
pub mod types;

pub use enums::{find_enum_set, EnumEntity, EnumKind, EnumSet};
pub use ir::{build_ir, Directory, Field, FieldKind, Ir, IrContext};
pub use keys::{resolve_list_key, ListKeyInfo};
pub use names::{camel_case, NameRegistry};
pub use types::{MappedType, TypeResolver};

use std::path::Path;

use crate::config::{GenerateConfig, YgenConfig};
use crate::error::Result;
use crate::mapping::{
    add_leafref_enum_targets, create_fake_root, find_mappable_entities, root_leaves, Diagnostics,
};
use crate::schema::{load_modules, SchemaIndex, SchemaTree};

// =============================================================================
// IrGenerator
// =============================================================================

/// One generation run over a schema tree
pub struct IrGenerator<'a> {
    tree: &'a SchemaTree,
    config: GenerateConfig,
}

impl<'a> IrGenerator<'a> {
    pub fn new(tree: &'a SchemaTree, config: GenerateConfig) -> Self {
        Self { tree, config }
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    /// Run the whole pipeline.
    ///
    /// Every call starts from fresh registries and maps, so repeated calls
    /// (or calls on other threads) produce identical output.
    pub fn generate(&self) -> std::result::Result<Ir, Diagnostics> {
        let tree = self.tree;
        let config = &self.config;
        let behaviour = config.compress_behaviour;
        let compress = behaviour.compress_enabled();

        tracing::info!(
            modules = tree.modules().count(),
            nodes = tree.node_count(),
            compress_behaviour = %behaviour,
            "generating IR"
        );

        // Phase 1: index every leaf for leafref resolution
        let index = SchemaIndex::build(tree);

        // Phase 2: discover directories and enum-bearing leaves
        let roots = tree.generation_roots();
        let mut entities = find_mappable_entities(tree, &roots, &config.exclude_modules, compress)?;
        add_leafref_enum_targets(tree, &index, &roots, &config.exclude_modules, &mut entities.enum_leaves);

        // Phase 3: synthesize the fake root
        if config.generate_fake_root {
            let root_elems = root_leaves(tree, &roots, &config.exclude_modules);
            create_fake_root(tree, &mut entities.directories, &root_elems, config.root_name(), compress)?;
        }

        // Phase 4: group and name enumerations
        let mut enum_names = NameRegistry::new();
        let enums = find_enum_set(
            tree,
            &entities.enum_leaves,
            compress,
            config.skip_enum_dedup,
            &mut enum_names,
        )?;

        // Phase 5: name directories, map fields and keys
        let mut directory_names = NameRegistry::new();
        let ctx = IrContext {
            tree,
            index: &index,
            entities: &entities,
            enums: &enums,
            config,
        };
        let ir = build_ir(&ctx, &mut directory_names)?;

        let dir_stats = directory_names.stats();
        tracing::info!(
            directories = ir.directories.len(),
            enums = ir.enums.len(),
            disambiguated = dir_stats.disambiguated + enum_names.stats().disambiguated,
            notes = ir.diagnostics.len(),
            "IR generated"
        );
        Ok(ir)
    }
}

/// Load `files` and generate their IR with `config`
pub fn generate_from_files<P: AsRef<Path>>(files: &[P], config: &YgenConfig) -> Result<Ir> {
    let tree = load_modules(files, &config.parser.search_paths)?;
    let ir = IrGenerator::new(&tree, config.generate.clone()).generate()?;
    Ok(ir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressBehaviour;
    use crate::mapping::{DiagnosticCode, FAKE_ROOT_PATH};
    use crate::schema::{ModuleInfo, SchemaTreeBuilder, TypeDescriptor, TypeKind};

    fn two_modules() -> SchemaTree {
        let mut b = SchemaTreeBuilder::new();
        let sys = b.module("system", "urn:system", None);
        let c = b.container(sys, "system");
        b.leaf(c, "hostname", TypeDescriptor::new(TypeKind::String));
        b.leaf(sys, "version", TypeDescriptor::new(TypeKind::String));
        let ifs = b.module("interfaces", "urn:interfaces", None);
        let wrapper = b.container(ifs, "interfaces");
        let list = b.list(wrapper, "interface", Some("name"));
        b.leaf(list, "name", TypeDescriptor::new(TypeKind::String));
        b.build()
    }

    #[test]
    fn test_fake_root_in_pipeline() {
        let tree = two_modules();
        let config = GenerateConfig {
            compress_behaviour: CompressBehaviour::PreferIntendedConfig,
            generate_fake_root: true,
            ..GenerateConfig::default()
        };
        let ir = IrGenerator::new(&tree, config).generate().unwrap();

        let root = ir.directory(FAKE_ROOT_PATH).unwrap();
        assert!(root.is_fake_root);
        assert_eq!(root.name, "Device");
        assert_eq!(root.field_names(), vec!["interface", "system", "version"]);
        assert_eq!(root.field("interface").unwrap().schema_path, "/interfaces/interface");
        assert_eq!(root.field("interface").unwrap().directory.as_deref(), Some("Interface"));
        assert_eq!(root.field("version").unwrap().mapped_type.as_ref().unwrap().native_type, "string");
    }

    #[test]
    fn test_excluded_module_dropped() {
        let tree = two_modules();
        let config = GenerateConfig {
            exclude_modules: vec!["interfaces".to_string()],
            ..GenerateConfig::default()
        };
        let ir = IrGenerator::new(&tree, config).generate().unwrap();
        assert_eq!(ir.directory_names(), vec!["System_System"]);
    }

    #[test]
    fn test_phase_errors_stop_the_run() {
        let mut b = SchemaTreeBuilder::new();
        let one = b.module("one", "urn:one", None);
        b.container(one, "foo");
        let two = b.module("two", "urn:two", None);
        b.container(two, "foo");
        let tree = b.build();

        let config = GenerateConfig {
            generate_fake_root: true,
            ..GenerateConfig::default()
        };
        let err = IrGenerator::new(&tree, config).generate().unwrap_err();
        assert_eq!(err.error_count(), 1);
        assert!(err.contains(DiagnosticCode::DuplicateRootEntry));
    }

    #[test]
    fn test_leafref_into_imported_enum() {
        let mut b = SchemaTreeBuilder::new();
        let types = b.add_module(ModuleInfo {
            name: "types".to_string(),
            namespace: "urn:types".to_string(),
            prefix: Some("t".to_string()),
            imported_only: true,
        });
        let defaults = b.container(types, "defaults");
        b.leaf(defaults, "mode", TypeDescriptor::enumeration(&["auto", "manual"]));
        let main = b.module("main", "urn:main", None);
        let top = b.container(main, "top");
        b.leaf(top, "mode", TypeDescriptor::leafref("/t:defaults/t:mode"));
        let tree = b.build();

        let ir = IrGenerator::new(&tree, GenerateConfig::default()).generate().unwrap();
        assert_eq!(ir.enum_names(), vec!["Types_Defaults_Mode"]);
        assert_eq!(ir.directory_names(), vec!["Main_Top"]);
        let mode = ir.directory("/main/top").unwrap().field("mode").unwrap();
        assert_eq!(mode.mapped_type.as_ref().unwrap().native_type, "enum:Types_Defaults_Mode");
    }

    #[test]
    fn test_repeated_runs_identical() {
        let tree = two_modules();
        let generator = IrGenerator::new(&tree, GenerateConfig::default());
        let first = serde_json::to_string(&generator.generate().unwrap()).unwrap();
        let second = serde_json::to_string(&generator.generate().unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
