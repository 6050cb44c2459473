use anyhow::Context;
use clap::Parser;
use lib_core::Config;
use lib_evm::{EvmClient, HttpTransport, NodeWallet, RpcTransport};
use std::process::ExitCode;
use std::sync::Arc;
use vault_terminal::debug::{self, LogConfig};
use vault_terminal::{App, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _log_guard = debug::init_logger(&LogConfig::from_env())?;

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    tracing::info!(
        chain_id = config.network.chain_id,
        rpc_url = %config.network.rpc_url,
        stablecoin = ?config.contracts.stablecoin,
        vault = ?config.contracts.vault,
        "Configuration loaded"
    );

    let transport: Arc<dyn RpcTransport> = Arc::new(
        HttpTransport::new(&config.network.rpc_url).context("Failed to create RPC client")?,
    );
    let client = EvmClient::new(transport.clone());
    let wallet = Arc::new(NodeWallet::new(transport).with_account_index(cli.account));

    let app = App::new(Arc::new(config), client, wallet.clone()).with_account_switcher(wallet);
    app.run(cli.command).await
}
