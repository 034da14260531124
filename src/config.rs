//! Configuration management for the schema visitor
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-visitor.toml)
//! - Environment variables (SCHEMA_VISITOR__*)
//!
//! ## Example config file (schema-visitor.toml):
//! ```toml
//! [parse]
//! recursion_limit = 64
//!
//! [loader]
//! extensions = ["json", "yml", "yaml"]
//! skip_prefixes = ["node_modules/", "target/"]
//!
//! [output]
//! format = "compact"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::schema::ParseOptions;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitorConfig {
    #[serde(default)]
    pub parse: ParseConfig,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Normalization limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Maximum schema nesting depth; 0 disables the limit
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: usize,
}

/// Which files count as schema documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// File extensions to pick up when walking a directory
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Skip files whose path relative to the walked directory starts with one of these
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_recursion_limit() -> usize {
    128
}

fn default_extensions() -> Vec<String> {
    vec!["json".to_string(), "yml".to_string(), "yaml".to_string()]
}

fn default_skip_prefixes() -> Vec<String> {
    vec![
        "target/".to_string(),
        ".git/".to_string(),
        "node_modules/".to_string(),
    ]
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            recursion_limit: default_recursion_limit(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            skip_prefixes: default_skip_prefixes(),
        }
    }
}

impl ParseConfig {
    pub fn options(&self) -> ParseOptions {
        match self.recursion_limit {
            0 => ParseOptions::default().without_recursion_limit(),
            limit => ParseOptions::default().with_recursion_limit(limit),
        }
    }
}

impl VisitorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering `config_path` over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "schema-visitor.toml",
            ".schema-visitor.toml",
            "config/schema-visitor.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "schema-visitor", "schema-visitor") {
            let xdg_config = dirs.config_dir().join("schema-visitor.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMA_VISITOR__PARSE__RECURSION_LIMIT=64
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_VISITOR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VisitorConfig::default();
        assert_eq!(config.parse.recursion_limit, 128);
        assert_eq!(config.output.format, OutputFormat::Pretty);
        assert!(config.loader.extensions.contains(&"yaml".to_string()));
    }

    #[test]
    fn test_zero_recursion_limit_disables_guard() {
        let parse = ParseConfig { recursion_limit: 0 };
        assert_eq!(parse.options().recursion_limit, None);
    }

    #[test]
    fn test_serialize_config() {
        let config = VisitorConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[parse]"));
        assert!(toml_str.contains("[output]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[parse]\nrecursion_limit = 7\n\n[output]\nformat = \"compact\"\n").unwrap();

        let config = VisitorConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.parse.recursion_limit, 7);
        assert_eq!(config.output.format, OutputFormat::Compact);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = VisitorConfig::default();
        config.parse.recursion_limit = 32;
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = VisitorConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.parse.recursion_limit, 32);
    }
}
