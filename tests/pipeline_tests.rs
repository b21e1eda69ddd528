//! End-to-end tests for the mapping pipeline
//!
//! Each test loads JSON module documents from `tests/fixtures`, runs a full
//! generation and checks the resulting IR.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use familiar_ygen::{
    generate_from_files, load_modules, CompressBehaviour, DiagnosticCode, ErrorCategory, GenerateConfig, Ir,
    IrChecksum, IrGenerator, YgenConfig,
};

fn fixtures_path() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").leak()
}

fn fixture(name: &str) -> PathBuf {
    fixtures_path().join(name)
}

fn generate(files: &[&str], config: GenerateConfig) -> Ir {
    let paths: Vec<PathBuf> = files.iter().map(|f| fixture(f)).collect();
    let tree = load_modules(&paths, &[fixtures_path().join("deps")]).unwrap();
    IrGenerator::new(&tree, config).generate().unwrap()
}

fn with(behaviour: CompressBehaviour) -> GenerateConfig {
    GenerateConfig {
        compress_behaviour: behaviour,
        ..GenerateConfig::default()
    }
}

// =============================================================================
// Compression
// =============================================================================

#[test]
fn test_config_state_uncompressed() {
    let ir = generate(&["config_state.json"], with(CompressBehaviour::Uncompressed));
    assert_eq!(ir.directory_names(), vec!["Mod_Base", "Mod_Base_Config", "Mod_Base_State"]);

    let base = ir.directory("/mod/base").unwrap();
    assert_eq!(base.field_names(), vec!["config", "state"]);
    assert_eq!(base.field("state").unwrap().directory.as_deref(), Some("Mod_Base_State"));
}

#[test]
fn test_config_state_compressed() {
    let ir = generate(&["config_state.json"], with(CompressBehaviour::PreferIntendedConfig));
    assert_eq!(ir.directories.keys().collect::<Vec<_>>(), vec!["/mod/base"]);
    assert_eq!(ir.directory_names(), vec!["Base"]);
    assert!(ir.directory("/mod/base").unwrap().fields.is_empty());
}

#[test]
fn test_config_state_uncompressed_without_state() {
    let ir = generate(&["config_state.json"], with(CompressBehaviour::UncompressedExcludeDerivedState));
    assert_eq!(ir.directory_names(), vec!["Mod_Base", "Mod_Base_Config"]);
    assert_eq!(ir.directory("/mod/base").unwrap().field_names(), vec!["config"]);
}

#[test]
fn test_surrounding_container_elided() {
    let ir = generate(&["surrounding.json"], with(CompressBehaviour::Uncompressed));
    assert_eq!(
        ir.directory_names(),
        vec!["Mod_SurroundingContainer", "Mod_SurroundingContainer_ChildList"]
    );

    let ir = generate(&["surrounding.json"], with(CompressBehaviour::PreferIntendedConfig));
    assert_eq!(ir.directory_names(), vec!["ChildList"]);
    let list = ir.directory("/mod/surrounding-container/child-list").unwrap();
    assert_eq!(list.list_keys.as_ref().unwrap().keys, vec!["k"]);
}

#[test]
fn test_compression_without_wrappers_keeps_fields() {
    let plain = generate(&["unions.json"], with(CompressBehaviour::Uncompressed));
    let compressed = generate(&["unions.json"], with(CompressBehaviour::PreferIntendedConfig));

    assert_eq!(
        plain.directories.keys().collect::<Vec<_>>(),
        compressed.directories.keys().collect::<Vec<_>>()
    );
    for (path, dir) in &plain.directories {
        assert_eq!(dir.field_names(), compressed.directory(path).unwrap().field_names(), "{}", path);
    }
}

// =============================================================================
// Enumerations
// =============================================================================

#[test]
fn test_config_state_enums_split_when_uncompressed() {
    let ir = generate(&["enum_config_state.json"], with(CompressBehaviour::Uncompressed));
    assert_eq!(ir.enum_names(), vec!["Mod_Config_EnumerationLeaf", "Mod_State_EnumerationLeaf"]);

    let config = ir.directory("/mod/container/config").unwrap();
    let mapped = config.field("enumeration-leaf").unwrap().mapped_type.as_ref().unwrap();
    assert_eq!(mapped.native_type, "enum:Mod_Config_EnumerationLeaf");
    assert_eq!(mapped.zero_value, "Mod_Config_EnumerationLeaf_UNSET");
    assert!(mapped.is_enumerated_value);
}

#[test]
fn test_config_state_enums_merged_when_compressed() {
    let ir = generate(&["enum_config_state.json"], with(CompressBehaviour::PreferIntendedConfig));
    assert_eq!(ir.enum_names(), vec!["Mod_Container_EnumerationLeaf"]);

    let entity = &ir.enums["Mod_Container_EnumerationLeaf"];
    assert_eq!(entity.values, vec!["one", "two"]);
    assert_eq!(
        entity.leaf_paths,
        vec![
            "/mod/container/config/enumeration-leaf",
            "/mod/container/state/enumeration-leaf",
        ]
    );

    let field = ir.directory("/mod/container").unwrap().field("enumeration-leaf").unwrap();
    assert_eq!(field.schema_path, "config/enumeration-leaf");
    assert_eq!(field.shadow_path.as_deref(), Some("state/enumeration-leaf"));
}

#[test]
fn test_typedef_and_identity_naming() {
    let ir = generate(&["interfaces.json"], with(CompressBehaviour::PreferIntendedConfig));
    assert_eq!(
        ir.enum_names(),
        vec![
            "NetIf_Interface_OperStatus",
            "NetIf_Subinterface_OperStatus",
            "NetTypes_AdminStatus",
            "NetTypes_InterfaceType",
        ]
    );

    let admin = &ir.enums["NetTypes_AdminStatus"];
    assert_eq!(admin.module, "net-types");
    assert_eq!(admin.leaf_paths.len(), 2);

    let identity = &ir.enums["NetTypes_InterfaceType"];
    assert_eq!(identity.values, vec!["ethernet", "loopback"]);
}

#[test]
fn test_leafrefs_into_imported_module_enums() {
    for behaviour in CompressBehaviour::ALL {
        let ir = generate(&["leafref_enum.json"], with(behaviour));
        assert_eq!(
            ir.enum_names(),
            vec!["RefTypes_Defaults_Mode", "RefTypes_DuplexMode", "RefTypes_LinkKind"],
            "{}",
            behaviour
        );
        assert!(ir.directory("/ref-types/defaults").is_none());

        let link = ir.directory("/ref-user/link").unwrap();
        let native = |name: &str| link.field(name).unwrap().mapped_type.as_ref().unwrap().native_type.clone();
        assert_eq!(native("mode"), "enum:RefTypes_Defaults_Mode");
        assert_eq!(native("duplex"), "enum:RefTypes_DuplexMode");

        let kind = link.field("kind").unwrap().mapped_type.as_ref().unwrap();
        assert_eq!(kind.union_member_ids(), vec!["enum:RefTypes_LinkKind", "string"]);
    }
}

// =============================================================================
// List Keys
// =============================================================================

#[test]
fn test_leafref_key_redirected_when_compressed() {
    let ir = generate(&["leafref_key.json"], with(CompressBehaviour::PreferIntendedConfig));
    let list = ir.directory("/mod/foos/foo").unwrap();
    assert_eq!(list.name, "Foo");
    assert_eq!(list.field_names(), vec!["baz", "hits"]);

    let keys = list.list_keys.as_ref().unwrap();
    assert_eq!(keys.keys, vec!["bar"]);
    assert_eq!(keys.key_paths["bar"], "/mod/foos/foo/config/baz");
    assert_eq!(keys.key_types["bar"].native_type, "uint32");
}

#[test]
fn test_leafref_key_literal_when_uncompressed() {
    let ir = generate(&["leafref_key.json"], with(CompressBehaviour::Uncompressed));
    let list = ir.directory("/mod/foos/foo").unwrap();
    assert_eq!(list.field_names(), vec!["bar", "config", "state"]);

    let keys = list.list_keys.as_ref().unwrap();
    assert_eq!(keys.key_paths["bar"], "/mod/foos/foo/bar");
    assert_eq!(keys.key_types["bar"].native_type, "uint32");
}

#[test]
fn test_state_excluded_drops_state_leaves() {
    let ir = generate(&["leafref_key.json"], with(CompressBehaviour::ExcludeDerivedState));
    let list = ir.directory("/mod/foos/foo").unwrap();
    assert_eq!(list.field_names(), vec!["baz"]);
    assert_eq!(list.field("baz").unwrap().shadow_path, None);
}

// =============================================================================
// Unions
// =============================================================================

#[test]
fn test_nested_unions_flatten_like_flat_ones() {
    let ir = generate(&["unions.json"], with(CompressBehaviour::Uncompressed));
    let dir = ir.directory("/mod/c").unwrap();

    let nested = dir.field("nested").unwrap().mapped_type.as_ref().unwrap();
    let flat = dir.field("flat").unwrap().mapped_type.as_ref().unwrap();

    assert_eq!(nested.native_type, "union:Mod_C_Nested_Union");
    assert_eq!(nested.zero_value, "null");
    assert_eq!(nested.union_member_ids(), vec!["string", "int32", "bool"]);
    assert_eq!(nested.union_types, flat.union_types);
    assert_eq!(nested.union_types["bool"], 2);
}

#[test]
fn test_single_member_union_promoted() {
    let ir = generate(&["unions.json"], with(CompressBehaviour::Uncompressed));
    let patterns = ir.directory("/mod/c").unwrap().field("patterns").unwrap();
    let mapped = patterns.mapped_type.as_ref().unwrap();

    assert_eq!(mapped.native_type, "string");
    assert!(!mapped.is_union());
    assert!(ir.diagnostics.contains(DiagnosticCode::UnionSimplified));
}

// =============================================================================
// Fake Root
// =============================================================================

#[test]
fn test_fake_root_over_interfaces() {
    let config = GenerateConfig {
        compress_behaviour: CompressBehaviour::PreferIntendedConfig,
        generate_fake_root: true,
        ..GenerateConfig::default()
    };
    let ir = generate(&["interfaces.json"], config);

    let root = ir.directory("/").unwrap();
    assert!(root.is_fake_root);
    assert_eq!(root.name, "Device");
    assert_eq!(root.field_names(), vec!["hostname", "interface"]);
    assert_eq!(root.field("interface").unwrap().directory.as_deref(), Some("Interface"));

    let interface = ir.directory_by_name("Interface").unwrap();
    assert_eq!(
        interface.field_names(),
        vec!["admin-status", "counters", "mtu", "name", "oper-status", "subinterface", "type"]
    );
    assert_eq!(
        interface.field("type").unwrap().mapped_type.as_ref().unwrap().native_type,
        "enum:NetTypes_InterfaceType"
    );

    let sub = ir.directory_by_name("Interface_Subinterface").unwrap();
    assert_eq!(sub.field_names(), vec!["index", "ipv4", "ipv6", "oper-status"]);
    assert_eq!(sub.field("ipv4").unwrap().schema_path, "config/ipv4");
    assert_eq!(sub.list_keys.as_ref().unwrap().key_types["index"].native_type, "uint32");
}

#[test]
fn test_fake_root_duplicate_entries() {
    let config = GenerateConfig {
        generate_fake_root: true,
        ..GenerateConfig::default()
    };
    let paths = [fixture("foo_one.json"), fixture("foo_two.json")];
    let tree = load_modules(&paths, &[]).unwrap();
    let err = IrGenerator::new(&tree, config).generate().unwrap_err();

    assert!(err.contains(DiagnosticCode::DuplicateRootEntry));
    assert!(err.all()[0].message.contains("duplicate entry foo at the root"));
}

#[test]
fn test_fake_root_name_configurable() {
    let config = GenerateConfig {
        generate_fake_root: true,
        fake_root_name: "network-device".to_string(),
        ..GenerateConfig::default()
    };
    let ir = generate(&["foo_one.json"], config);
    assert_eq!(ir.directory("/").unwrap().name, "NetworkDevice");
}

// =============================================================================
// Determinism and Uniqueness
// =============================================================================

#[test]
fn test_repeated_runs_have_equal_checksums() {
    for behaviour in CompressBehaviour::ALL {
        let config = GenerateConfig {
            compress_behaviour: behaviour,
            generate_fake_root: true,
            ..GenerateConfig::default()
        };
        let first = IrChecksum::of(&generate(&["interfaces.json"], config.clone())).unwrap();
        let second = generate(&["interfaces.json"], config);
        assert!(first.verify(&second), "{} is not deterministic", behaviour);
    }
}

#[test]
fn test_names_unique_for_every_behaviour() {
    for behaviour in CompressBehaviour::ALL {
        for skip_enum_dedup in [false, true] {
            let config = GenerateConfig {
                compress_behaviour: behaviour,
                skip_enum_dedup,
                ..GenerateConfig::default()
            };
            let ir = generate(&["interfaces.json"], config);

            let dirs: BTreeSet<&str> = ir.directory_names().into_iter().collect();
            assert_eq!(dirs.len(), ir.directories.len(), "{}", behaviour);

            for (name, entity) in &ir.enums {
                assert_eq!(name, &entity.name);
            }
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_imports_found_on_search_path() {
    let mut config = YgenConfig::default();
    config.parser.search_paths.push(fixtures_path().join("deps"));
    let ir = generate_from_files(&[fixture("interfaces.json")], &config).unwrap();
    assert!(ir.directory("/net-if/interfaces/interface").is_some());

    let err = generate_from_files(&[fixture("interfaces.json")], &YgenConfig::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnresolvedReference);
}

#[test]
fn test_loader_error_categories() {
    let config = YgenConfig::default();

    let err = generate_from_files(&[fixture("absent.json")], &config).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::FileNotFound);

    let err = generate_from_files(&[fixture("broken.json")], &config).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Syntax);

    let err = generate_from_files(&[fixture("missing_import.json")], &config).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnresolvedReference);
    assert!(err.to_string().contains("does-not-exist"));
}

#[test]
fn test_generation_errors_surface_as_generation_category() {
    let mut config = YgenConfig::default();
    config.generate.generate_fake_root = true;
    let err = generate_from_files(&[fixture("foo_one.json"), fixture("foo_two.json")], &config).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Generation);
    assert!(err.diagnostics().unwrap().contains(DiagnosticCode::DuplicateRootEntry));
}
