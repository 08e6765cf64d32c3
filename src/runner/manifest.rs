//! JSON version manifests
//!
//! Manifests are read once per run and kept in a cache keyed by path, so
//! a bump step sees what the driver already loaded and later steps see
//! the bumped content.

use crate::error::{ConfigError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Parsed manifests by path
#[derive(Debug, Default)]
pub struct ManifestCache {
    entries: HashMap<PathBuf, Value>,
}

impl ManifestCache {
    /// Return the cached manifest, loading it first if needed
    pub fn get(&mut self, path: &Path, reload: bool) -> Result<&mut Value> {
        let key = cache_key(path);
        if reload || !self.entries.contains_key(&key) {
            let manifest = read_manifest(path)?;
            self.entries.insert(key.clone(), manifest);
        }
        self.entries.get_mut(&key).ok_or_else(|| {
            ConfigError::InvalidManifest {
                path: path.to_path_buf(),
                error: "not cached".to_string(),
            }
            .into()
        })
    }

    #[cfg(test)]
    fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(&cache_key(path))
    }

    /// Replace a cached manifest
    pub fn insert(&mut self, path: &Path, manifest: Value) {
        self.entries.insert(cache_key(path), manifest);
    }
}

/// `./package.json` and `package.json` share one entry
fn cache_key(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Read a manifest; it must be a JSON object
pub fn read_manifest(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::InvalidManifest {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| ConfigError::InvalidManifest {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(ConfigError::InvalidManifest {
            path: path.to_path_buf(),
            error: "expected a JSON object".to_string(),
        }
        .into());
    }
    Ok(value)
}

/// Pretty-print a manifest with `space` spaces of indentation
pub fn to_pretty_json(manifest: &Value, space: usize) -> Result<String> {
    let indent = vec![b' '; space];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    manifest.serialize(&mut serializer)?;
    let mut text = String::from_utf8_lossy(&buf).into_owned();
    text.push('\n');
    Ok(text)
}

/// Write a manifest back to disk
pub fn write_manifest(path: &Path, manifest: &Value, space: usize) -> Result<()> {
    fs::write(path, to_pretty_json(manifest, space)?)?;
    Ok(())
}

/// The `version` string of a manifest, if present
pub fn manifest_version(manifest: &Value) -> Option<&str> {
    manifest.get("version").and_then(Value::as_str)
}
