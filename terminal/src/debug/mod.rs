//! # Logging
//!
//! Human-readable logs go to stderr so that stdout stays clean for command
//! output (`status --json` in particular). A daily-rotated file log is added
//! when `VAULT_LOG_DIR` is set.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (e.g., `vault_terminal=debug,lib_evm=debug`)
//! - `VAULT_LOG_DIR`: Directory for `vault-terminal.log` (unset = no file log)

pub mod config;
pub mod logger;

pub use config::LogConfig;
pub use logger::init as init_logger;
