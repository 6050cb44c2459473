//! # Vault Terminal - Library Root
//!
//! Command line front end for the stablecoin vault. The binary (`main.rs`)
//! only parses arguments, initializes logging and wires the pieces; all
//! behavior lives here so it can be tested.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │              vault-terminal (this crate)               │
//! │  cli (clap)  ->  app::App  ->  ui::render (stdout)     │
//! └────────────────────────────────────────────────────────┘
//!          │
//!          ▼
//! ┌────────────────────────────────────────────────────────┐
//! │  lib-evm: WalletController, VaultActions, Notifier     │
//! └────────────────────────────────────────────────────────┘
//!          │ JSON-RPC
//!          ▼
//! ┌─────────────────┐
//! │   EVM node      │
//! └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - **cli**: clap argument definitions
//! - **app**: command execution and session view building
//! - **ui**: plain-text rendering
//! - **debug**: logging setup
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin vault-terminal -- status
//! cargo run --bin vault-terminal -- deposit 100
//! ```

pub mod app;
pub mod cli;
pub mod debug;
pub mod ui;

pub use app::App;
pub use cli::{Cli, Command};
