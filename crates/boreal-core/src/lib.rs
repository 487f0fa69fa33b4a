//! # boreal-core
//!
//! Core types, traits, and abstractions for the boreal device platform.
//!
//! This crate provides the domain entities (devices, users, placements,
//! detection events), the shared error type, runtime configuration, and the
//! factory-token derivation used by both the provisioning CLI and the server.

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod token;

// Re-export commonly used types at crate root
pub use config::Settings;
pub use error::{Error, Result};
pub use models::*;
pub use token::{
    derive_factory_token, derive_factory_token_hash, generate_api_token, setup_url,
    verify_factory_token_hash,
};
