//! Command execution on top of the `lib-evm` controller

pub mod commands;
pub mod view;

pub use commands::App;
pub use view::{content_changed, session_view, vault_view};
