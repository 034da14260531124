//! Schema Document Loading
//!
//! Reads schema documents from disk as raw values. JSON and YAML are only
//! deserialized here; classification happens in [`crate::schema::classify`].

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::LoaderConfig;
use crate::error::{Result, SchemaError};

/// One schema document read from disk
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Path relative to the walked directory (or as given for single files)
    pub path: PathBuf,
    pub value: Value,
}

/// Read a single `.json`, `.yml` or `.yaml` document
pub fn load_document(path: &Path) -> Result<Value> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let content = match extension.as_deref() {
        Some("json") | Some("yml") | Some("yaml") => fs::read_to_string(path)?,
        _ => return Err(SchemaError::UnsupportedFormat(path.to_path_buf())),
    };

    let value = if extension.as_deref() == Some("json") {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(value)
}

/// Load every schema document below `dir`, sorted by path
pub fn load_directory(dir: &Path, config: &LoaderConfig) -> Result<Vec<SchemaDocument>> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let wanted = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| config.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);
        if !wanted {
            continue;
        }

        let relative_path = path.strip_prefix(dir).unwrap_or(path).to_path_buf();
        let relative_str = relative_path.to_string_lossy().replace('\\', "/");
        if config.skip_prefixes.iter().any(|p| relative_str.starts_with(p)) {
            debug!(path = %relative_str, "skipping schema document");
            continue;
        }

        debug!(path = %relative_str, "loading schema document");
        documents.push(SchemaDocument {
            value: load_document(path)?,
            path: relative_path,
        });
    }

    documents.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(documents)
}

/// Load `path` as a single document, or every document below it when it is a directory
pub fn load_path(path: &Path, config: &LoaderConfig) -> Result<Vec<SchemaDocument>> {
    if path.is_dir() {
        load_directory(path, config)
    } else {
        Ok(vec![SchemaDocument {
            value: load_document(path)?,
            path: path.to_path_buf(),
        }])
    }
}
