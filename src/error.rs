//! Error types for Tagflow

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Tagflow operations
pub type Result<T> = std::result::Result<T, TagflowError>;

/// Main error type for Tagflow
#[derive(Error, Debug)]
pub enum TagflowError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Step execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON manifest errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A workflow step failed; the remaining steps were not started
    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<TagflowError>,
    },
}

/// Configuration parsing, validation and usage errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Usage: {task}:<workflow>:<mode> (got '{got}')")]
    Usage { task: String, got: String },

    #[error("Workflow '{0}' is not defined")]
    WorkflowNotFound(String),

    #[error("Unsupported tool '{0}' (expected one of: {1})")]
    UnknownTool(String, String),

    #[error("Invalid options for step '{step}': {error}")]
    InvalidOptions { step: String, error: String },

    #[error("Invalid version \"{version}\" in {path}")]
    InvalidVersion { path: PathBuf, version: String },

    #[error("Invalid manifest {path}: {error}")]
    InvalidManifest { path: PathBuf, error: String },

    #[error("Please specify a bump mode ({0})")]
    MissingBumpMode(String),

    #[error("Unsupported bump mode \"{mode}\" (expected {expected})")]
    InvalidBumpMode { mode: String, expected: String },

    #[error("Use \"bump.syncVersion: true\" instead of listing \"version\" in bump.syncFields")]
    SyncVersionField,

    #[error("Cannot update config.{0} (does not exist)")]
    MissingConfigEntry(String),
}

/// Step execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command `{command}` failed with exit code {code:?}: {output}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Failed to start `{command}`: {error}")]
    Spawn { command: String, error: String },

    #[error("{0} check(s) failed")]
    ChecksFailed(usize),

    #[error("Missing required value: {0}")]
    MissingValue(String),

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Release request failed with HTTP {status}: {body}")]
    ReleaseFailed { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Replace error: {0}")]
    Replace(String),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

impl TagflowError {
    /// Wrap an error with the name of the step that produced it
    pub fn in_step(self, step: &str) -> Self {
        TagflowError::StepFailed {
            step: step.to_string(),
            source: Box::new(self),
        }
    }
}
