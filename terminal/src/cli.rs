//! Command line interface

use clap::{Parser, Subcommand};

/// Wallet session, balances and vault transactions against an EVM node.
///
/// Network and contract addresses come from `VAULT_*` environment variables
/// (a `.env` file is loaded first). The wallet is the node itself: its
/// unlocked accounts sign transactions.
#[derive(Parser, Debug)]
#[command(name = "vault-terminal", author, version, about)]
pub struct Cli {
    /// Index of the node account to act as.
    #[arg(long, short = 'a', env = "VAULT_ACCOUNT_INDEX", default_value_t = 0, global = true)]
    pub account: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the connected account, balances and contract deployment status.
    ///
    /// Uses only already-authorized accounts; never prompts.
    Status {
        /// Print the status as JSON on stdout.
        #[arg(long)]
        json: bool,
    },

    /// Move the wallet to the configured network and request account access.
    Connect,

    /// Deposit stablecoin into the vault (approve, then deposit).
    Deposit {
        /// Amount in stablecoin units, e.g. `100` or `12.5`.
        amount: String,
    },

    /// Withdraw stablecoin from the vault (approve shares, then withdraw).
    Withdraw {
        /// Amount in stablecoin units, e.g. `10`.
        amount: String,
    },

    /// Mint test stablecoin to the connected account.
    Mint {
        /// Amount in stablecoin units.
        amount: String,
    },

    /// Poll balances and follow account changes until Ctrl-C.
    ///
    /// Typing an account index on stdin switches the active node account.
    Watch,
}

impl Command {
    /// Whether the command needs an account before it can do anything.
    pub fn requires_connection(&self) -> bool {
        matches!(
            self,
            Command::Deposit { .. } | Command::Withdraw { .. } | Command::Mint { .. }
        )
    }
}
