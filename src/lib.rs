//! tagflow: labels and review workflows for any entity
//!
//! Attaches label entities (tags, colours, fonts, hashtags) to arbitrary
//! targets through one polymorphic association store, and tracks records
//! through review and progress lifecycles.

pub mod cli;
pub mod core;
