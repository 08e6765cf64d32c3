//! Configuration parsing and validation
//!
//! This module handles parsing of tagflow.yml configuration files,
//! validation of workflow structure and layered step options.

pub mod merge;
pub mod options;
pub mod parse;
pub mod schema;
pub mod store;
pub mod types;

// Re-export main types
pub use merge::*;
pub use options::*;
pub use parse::*;
pub use schema::*;
pub use store::*;
pub use types::*;
