//! HTTP shell around the prediction engine
//!
//! Owns configuration, request validation, health tracking and the axum
//! router. The binary in `main.rs` wires these together.

pub mod api;
pub mod config;
pub mod health;
pub mod validation;

pub use api::{create_router, AppState};
pub use config::ServiceConfig;
