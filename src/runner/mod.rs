//! Workflow execution engine
//!
//! This module handles running a workflow: external commands, git,
//! manifests, version arithmetic, templates and the step driver.

pub mod command;
pub mod context;
pub mod git;
pub mod manifest;
pub mod pipeline;
pub mod template;
pub mod version;

// Re-export main types
pub use command::{CommandOutput, CommandRequest, ExecMode, Shell, SystemShell};
pub use context::*;
pub use manifest::ManifestCache;
pub use pipeline::*;
pub use version::*;
