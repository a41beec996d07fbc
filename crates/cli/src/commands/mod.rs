//! Subcommand implementations

pub mod analytics;
pub mod models;
pub mod predict;
