//! Host configuration values that steps may write into

use crate::error::{ConfigError, ConfigResult};
use serde_yaml::{Mapping, Value};

/// A place a bump step can publish the new version to
pub trait ConfigSink {
    /// Set `<key>.version`; fails if `key` does not exist
    fn update_version(&mut self, key: &str, version: &str) -> ConfigResult<()>;
}

/// In-memory store backed by the `config:` section of tagflow.yml
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    values: Mapping,
}

impl ConfigStore {
    pub fn new(values: Mapping) -> Self {
        ConfigStore { values }
    }

    /// Read a value by dotted path, e.g. `pkg.version`
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.values.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }
}

impl ConfigSink for ConfigStore {
    fn update_version(&mut self, key: &str, version: &str) -> ConfigResult<()> {
        match self.values.get_mut(key) {
            Some(Value::Mapping(entry)) => {
                entry.insert(Value::from("version"), Value::from(version));
                Ok(())
            }
            _ => Err(ConfigError::MissingConfigEntry(key.to_string())),
        }
    }
}
