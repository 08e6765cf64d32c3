//! Tagflow - release workflows driven by a YAML file
//!
//! A workflow is an ordered list of steps (check, bump, commit, tag, push,
//! publish, ...) run one at a time against a project's version manifests
//! and git repository.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod tools;

// Re-export commonly used types
pub use error::{Result, TagflowError};

/// Current version of Tagflow
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
