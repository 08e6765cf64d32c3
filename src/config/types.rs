//! Core configuration types
//!
//! This module defines the data structures that represent a tagflow.yml configuration file.

use crate::error::{ConfigError, ConfigResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;

/// Reserved step name holding workflow-wide defaults
pub const COMMON_KEY: &str = "common";

/// Default task name used in the `<task>:<workflow>:<mode>` selector
pub const DEFAULT_TASK_NAME: &str = "tagflow";

/// Ordered map of step name to raw (unmerged) step options
pub type StepMap = IndexMap<String, Value>;

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Task name (optional, defaults to "tagflow")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Application usage description (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Global options, keyed by tool type (or `common` for every tool)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, Value>,

    /// Host configuration values that `bump.updateConfig` may write into
    #[serde(default, skip_serializing_if = "serde_yaml::Mapping::is_empty")]
    pub config: serde_yaml::Mapping,

    /// Workflows in declaration order
    #[serde(default)]
    pub workflows: IndexMap<String, StepMap>,
}

impl Config {
    /// Task name used as the first part of the command-line selector
    pub fn task_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_TASK_NAME)
    }

    /// Look up a workflow by name
    pub fn workflow(&self, name: &str) -> ConfigResult<Workflow<'_>> {
        let (name, steps) = self
            .workflows
            .get_key_value(name)
            .ok_or_else(|| ConfigError::WorkflowNotFound(name.to_string()))?;
        Ok(Workflow {
            name: name.as_str(),
            steps,
        })
    }
}

/// A borrowed view of one named workflow
#[derive(Debug, Clone, Copy)]
pub struct Workflow<'a> {
    pub name: &'a str,
    pub steps: &'a StepMap,
}

impl<'a> Workflow<'a> {
    /// The workflow's `common` block, if any
    pub fn common(&self) -> Option<&'a Value> {
        self.steps.get(COMMON_KEY)
    }

    /// Raw options for a step
    pub fn step(&self, step_name: &str) -> Option<&'a Value> {
        self.steps.get(step_name)
    }

    /// Step names in declaration order, skipping `common`
    pub fn step_names(&self) -> impl Iterator<Item = &'a String> {
        self.steps.keys().filter(|k| k.as_str() != COMMON_KEY)
    }
}

/// The closed catalog of tool types a step can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolType {
    Check,
    Replace,
    Bump,
    Run,
    Exec,
    Commit,
    Tag,
    Push,
    NpmPublish,
    GithubRelease,
}

impl ToolType {
    pub const ALL: [ToolType; 10] = [
        ToolType::Check,
        ToolType::Replace,
        ToolType::Bump,
        ToolType::Run,
        ToolType::Exec,
        ToolType::Commit,
        ToolType::Tag,
        ToolType::Push,
        ToolType::NpmPublish,
        ToolType::GithubRelease,
    ];

    /// The configuration key for this tool type
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::Check => "check",
            ToolType::Replace => "replace",
            ToolType::Bump => "bump",
            ToolType::Run => "run",
            ToolType::Exec => "exec",
            ToolType::Commit => "commit",
            ToolType::Tag => "tag",
            ToolType::Push => "push",
            ToolType::NpmPublish => "npmPublish",
            ToolType::GithubRelease => "githubRelease",
        }
    }

    /// Classify a step name such as `bump` or `bump_develop`
    ///
    /// Everything before the first `_` must name a tool type exactly.
    pub fn classify(step_name: &str) -> ConfigResult<ToolType> {
        let prefix = step_name
            .split_once('_')
            .map(|(prefix, _)| prefix)
            .unwrap_or(step_name);

        ToolType::ALL
            .into_iter()
            .find(|tool| tool.as_str() == prefix)
            .ok_or_else(|| ConfigError::UnknownTool(step_name.to_string(), Self::known_list()))
    }

    /// Comma separated list of every tool type
    pub fn known_list() -> String {
        ToolType::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom deserializer for lists that also accept a single string
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;

    match value {
        // Single value
        Value::String(s) => Ok(vec![s]),
        Value::Bool(b) => Ok(vec![b.to_string()]),
        Value::Number(n) => Ok(vec![n.to_string()]),
        // Array of values
        Value::Sequence(seq) => {
            let mut items = Vec::new();
            for item in seq {
                match item {
                    Value::String(s) => items.push(s),
                    Value::Number(n) => items.push(n.to_string()),
                    _ => return Err(D::Error::custom("list entries must be strings")),
                }
            }
            Ok(items)
        }
        // Null or not present
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("expected a string or a list of strings")),
    }
}
