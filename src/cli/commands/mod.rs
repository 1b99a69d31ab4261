//! CLI command implementations

pub mod completions;
pub mod derive;
pub mod init;
pub mod label;
pub mod workflow;
