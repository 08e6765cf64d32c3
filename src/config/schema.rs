//! Configuration validation
//!
//! Everything here runs before the first step, so a bad configuration
//! never leaves a half-finished release behind.

use crate::config::types::{Config, ToolType, COMMON_KEY};
use crate::error::{ConfigError, ConfigResult};
use serde_yaml::Value;

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    validate_global_options(config)?;

    for name in config.workflows.keys() {
        validate_workflow(config, name)?;
    }

    Ok(())
}

/// Validate a single workflow: every step must name a known tool
pub fn validate_workflow(config: &Config, name: &str) -> ConfigResult<()> {
    let workflow = config.workflow(name)?;

    if let Some(common) = workflow.common() {
        ensure_block(&format!("{}.{}", name, COMMON_KEY), common)?;
    }

    for step_name in workflow.step_names() {
        ToolType::classify(step_name)?;
        if let Some(block) = workflow.step(step_name) {
            ensure_block(&format!("{}.{}", name, step_name), block)?;
        }
    }

    Ok(())
}

/// Global options are keyed by `common` or a tool type (no suffixes)
fn validate_global_options(config: &Config) -> ConfigResult<()> {
    for (key, block) in &config.options {
        if key != COMMON_KEY && !ToolType::ALL.iter().any(|t| t.as_str() == key) {
            return Err(ConfigError::Invalid(format!(
                "Unknown global option block '{}' (expected common or one of: {})",
                key,
                ToolType::known_list()
            )));
        }
        ensure_block(&format!("options.{}", key), block)?;
    }
    Ok(())
}

/// Option blocks must be mappings; null counts as an empty block
fn ensure_block(path: &str, value: &Value) -> ConfigResult<()> {
    match value {
        Value::Mapping(_) | Value::Null => Ok(()),
        _ => Err(ConfigError::Invalid(format!(
            "'{}' must be a mapping of options",
            path
        ))),
    }
}
