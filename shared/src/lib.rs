//! # Shared Data Transfer Objects Library
//!
//! Serializable views of the wallet session for front ends, plus address
//! formatting helpers. Nothing here depends on the chain libraries: values
//! arrive already rendered as strings so any front end can print or ship
//! them as JSON.
//!
//! ## Structure
//!
//! - **[`dto`]**: Data Transfer Objects
//!   - **[`dto::session`]**: Session, balance and contract status views
//! - **[`utils`]**: Shared utility functions
//!   - **[`utils::format_address`]**: Format wallet addresses for display
//!   - **[`utils::truncate_address`]**: `0x1234...abcd` style truncation
//!
//! ## Wire Format
//!
//! - Field names are **snake_case** in JSON
//! - Optional fields are omitted from JSON when `None`
//!
//! ```rust
//! use shared::dto::session::SessionView;
//!
//! let view = SessionView::disconnected(31337);
//! let json = serde_json::to_string(&view).unwrap();
//! assert!(json.contains("\"connected\":false"));
//! ```

pub mod dto;
pub mod utils;

// Re-export commonly used types for convenience
pub use dto::*;
pub use utils::*;
