//! # Core Library
//!
//! Configuration and the application-wide error taxonomy shared by the vault client crates.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{Config, ContractsConfig, NetworkConfig, TimingConfig};
pub use error::{AppError, Result};
