//! Common types and utilities shared across all crates

pub mod types;
pub mod config;
pub mod error;
pub mod tracing_setup;

pub use types::*;
pub use config::*;
pub use error::{CatalogError, Result};
pub use tracing_setup::init_tracing_with_level;
