//! Configuration management for the schema compiler
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schemac.toml)
//! - Environment variables (SCHEMAC__*)
//!
//! ## Example config file (schemac.toml):
//! ```toml
//! [imports]
//! search_paths = ["schemas", "../shared/schemas"]
//! builtin_library = true
//!
//! [output]
//! json = "compact"
//!
//! [validation]
//! validate_formats = true
//!
//! [codegen.types]
//! integer = "i64"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::codegen::RenderProfile;
use crate::imports::{BuiltinLibrary, ChainLoader, FsImportLoader};

/// Main configuration for the compiler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Import resolution settings
    #[serde(default)]
    pub imports: ImportsConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Rust source rendering
    #[serde(default)]
    pub codegen: RenderProfile,
}

/// Import resolution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportsConfig {
    /// Directories searched for `<name>.yaml` imports, in order
    #[serde(default = "default_search_paths")]
    pub search_paths: Vec<PathBuf>,

    /// Resolve `linkml:types` from the embedded library
    #[serde(default = "default_true")]
    pub builtin_library: bool,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON layout (pretty or compact)
    #[serde(default = "default_output_format")]
    pub json: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Check `format` keywords (dates) in addition to types and patterns
    #[serde(default = "default_true")]
    pub validate_formats: bool,
}

// Default value functions
fn default_search_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_true() -> bool {
    true
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Pretty
}

impl Default for ImportsConfig {
    fn default() -> Self {
        Self {
            search_paths: default_search_paths(),
            builtin_library: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: default_output_format(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { validate_formats: true }
    }
}

impl CompilerConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["schemac.toml", ".schemac.toml", "config/schemac.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("org", "schemac", "schemac") {
            let xdg_config = config_dir.config_dir().join("schemac.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Load from environment variables (SCHEMAC__*)
        builder = builder.add_source(
            Environment::with_prefix("SCHEMAC")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Search paths made absolute against `base` (usually the schema's directory)
    pub fn search_paths_from(&self, base: &Path) -> Vec<PathBuf> {
        self.imports
            .search_paths
            .iter()
            .map(|p| if p.is_absolute() { p.clone() } else { base.join(p) })
            .collect()
    }

    /// Import loader for a schema located in `base`
    pub fn import_loader(&self, base: &Path) -> ChainLoader {
        let mut loader = ChainLoader::new();
        if self.imports.builtin_library {
            loader = loader.with(BuiltinLibrary);
        }
        loader.with(FsImportLoader::new(self.search_paths_from(base)))
    }

    pub fn pretty_json(&self) -> bool {
        self.output.json == OutputFormat::Pretty
    }
}
