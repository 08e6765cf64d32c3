//! CLI interface and argument parsing
//!
//! This module handles command-line parsing, the `<task>:<workflow>:<mode>`
//! selector and the final report.

pub mod app;

// Re-export main types
pub use app::*;
