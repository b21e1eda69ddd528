//! Configuration management for the IR generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (ygen.toml)
//! - Environment variables (YGEN_*)
//!
//! ## Example config file (ygen.toml):
//! ```toml
//! [generate]
//! compress_behaviour = "prefer-intended-config"
//! generate_fake_root = true
//! fake_root_name = "device"
//! skip_enum_dedup = false
//! exclude_modules = ["ietf-interfaces"]
//!
//! [parser]
//! search_paths = ["./yang/deps"]
//!
//! [output]
//! format = "pretty"
//! include_checksum = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// =============================================================================
// Compression Behaviour
// =============================================================================

/// How wrapper nodes are treated when mapping the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressBehaviour {
    /// Every container and list maps one to one
    #[default]
    Uncompressed,
    /// Uncompressed, read-only nodes dropped
    UncompressedExcludeDerivedState,
    /// Compressed; config leaves win over state duplicates
    PreferIntendedConfig,
    /// Compressed; state leaves win over config duplicates
    PreferOperationalState,
    /// Compressed, read-only nodes dropped
    ExcludeDerivedState,
}

impl CompressBehaviour {
    pub const ALL: [CompressBehaviour; 5] = [
        Self::Uncompressed,
        Self::UncompressedExcludeDerivedState,
        Self::PreferIntendedConfig,
        Self::PreferOperationalState,
        Self::ExcludeDerivedState,
    ];

    pub fn compress_enabled(&self) -> bool {
        matches!(
            self,
            Self::PreferIntendedConfig | Self::PreferOperationalState | Self::ExcludeDerivedState
        )
    }

    pub fn state_excluded(&self) -> bool {
        matches!(self, Self::ExcludeDerivedState | Self::UncompressedExcludeDerivedState)
    }

    /// Name of the wrapper whose leaves win under compression
    pub fn preferred_wrapper(&self) -> &'static str {
        match self {
            Self::PreferOperationalState => "state",
            _ => "config",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uncompressed => "uncompressed",
            Self::UncompressedExcludeDerivedState => "uncompressed-exclude-derived-state",
            Self::PreferIntendedConfig => "prefer-intended-config",
            Self::PreferOperationalState => "prefer-operational-state",
            Self::ExcludeDerivedState => "exclude-derived-state",
        }
    }
}

impl fmt::Display for CompressBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CompressBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|b| b.as_str() == s)
            .copied()
            .ok_or_else(|| {
                let valid: Vec<_> = Self::ALL.iter().map(|b| b.as_str()).collect();
                format!("unknown compress behaviour '{}', expected one of: {}", s, valid.join(", "))
            })
    }
}

// =============================================================================
// Configuration Sections
// =============================================================================

/// Main configuration for the generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YgenConfig {
    /// Mapping settings consumed by the generation run
    #[serde(default)]
    pub generate: GenerateConfig,

    /// Schema loading settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// IR output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Settings that shape the IR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateConfig {
    #[serde(default)]
    pub compress_behaviour: CompressBehaviour,

    /// Synthesize a single root directory over all top-level entities
    #[serde(default)]
    pub generate_fake_root: bool,

    /// Name of the synthesized root; empty means the default
    #[serde(default = "default_fake_root_name")]
    pub fake_root_name: String,

    /// Keep inline enumerations at distinct paths apart
    #[serde(default)]
    pub skip_enum_dedup: bool,

    /// Modules whose subtrees are skipped
    #[serde(default)]
    pub exclude_modules: Vec<String>,
}

/// Schema loading configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Directories searched for imported modules
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Attach the IR checksum to the written output
    #[serde(default = "default_true")]
    pub include_checksum: bool,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

// Default value functions
pub const DEFAULT_FAKE_ROOT_NAME: &str = "device";

fn default_fake_root_name() -> String {
    DEFAULT_FAKE_ROOT_NAME.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            compress_behaviour: CompressBehaviour::default(),
            generate_fake_root: false,
            fake_root_name: default_fake_root_name(),
            skip_enum_dedup: false,
            exclude_modules: Vec::new(),
        }
    }
}

impl GenerateConfig {
    /// The fake root name with the default applied
    pub fn root_name(&self) -> &str {
        if self.fake_root_name.trim().is_empty() {
            DEFAULT_FAKE_ROOT_NAME
        } else {
            &self.fake_root_name
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Pretty,
            include_checksum: true,
        }
    }
}

impl YgenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None::<&Path>)
    }

    /// Load configuration, layering a specific file over the default locations
    pub fn load_from(config_path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["ygen.toml", ".ygen.toml", "config/ygen.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "ygen") {
            let xdg_config = config_dir.config_dir().join("ygen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.as_ref()).required(true));
        }

        // Load from environment variables (YGEN_GENERATE__SKIP_ENUM_DEDUP=true)
        builder = builder.add_source(
            Environment::with_prefix("YGEN")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("generate.exclude_modules")
                .with_list_parse_key("parser.search_paths")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
