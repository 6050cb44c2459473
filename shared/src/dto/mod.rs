//! Data Transfer Objects.

pub mod session;

pub use session::{BalanceView, ContractView, SessionView};
