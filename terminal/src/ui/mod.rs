//! Plain-text rendering for terminal output

pub mod render;

pub use render::{render_notification, render_session, render_summary_line, render_tx_state};
