//! Wallet session CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐     ┌──────────────────┐     ┌──────────────────┐
//!   │ WalletBridge │────▶│   SessionStore   │◀────│   ChainClient    │
//!   │ (extension / │     │ (state machine,  │     │ (JSON-RPC with   │
//!   │  watch-only) │     │  watch snapshots)│     │  failover)       │
//!   └──────────────┘     └────────┬─────────┘     └──────────────────┘
//!                                 │
//!                  ┌──────────────┼──────────────┐
//!                  ▼              ▼              ▼
//!            ┌──────────┐  ┌────────────┐  ┌───────────────┐
//!            │  config  │  │ observa-   │  │ counter       │
//!            │  (TOML)  │  │ bility     │  │ (cached count)│
//!            └──────────┘  └────────────┘  └───────────────┘
//! ```
//!
//! Subcommands cover one-shot chain lookups and a `watch` mode that runs a
//! read-only session and prints every published snapshot as a JSON line.

use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use wallet_session::chain::{Account, ChainClient, RpcChainClient, SignatureId};
use wallet_session::config::{load_config, SessionConfig};
use wallet_session::counter::{ContractCountSource, CountCache, TransactionCountSource, TransactionCounter};
use wallet_session::observability::{init_logging, metrics::init_metrics};
use wallet_session::session::SessionStore;
use wallet_session::wallet::WatchOnlyWallet;

#[derive(Parser)]
#[command(name = "wallet-session")]
#[command(about = "Wallet session and Solana RPC utility", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the primary RPC endpoint
    #[arg(long)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an account's balance in SOL
    Balance { account: String },
    /// List an account's recent transactions
    History { account: String },
    /// Wait for a signature to reach the configured commitment
    Confirm { signature: String },
    /// Check the transaction count and update the local cache
    Count,
    /// Follow an account read-only and print session snapshots
    Watch { account: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };
    if let Some(url) = cli.rpc_url {
        config.chain.rpc_url = url;
    }

    init_logging(&config.observability);
    tracing::info!(
        rpc_url = %config.chain.rpc_url,
        failovers = config.chain.failover_urls.len(),
        commitment = %config.chain.commitment,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let client = RpcChainClient::new(config.chain.clone())?;

    match cli.command {
        Commands::Balance { account } => {
            let balance = client.get_balance(&Account::new(account)).await?;
            println!("{} SOL", balance);
        }
        Commands::History { account } => {
            let records = client.list_transactions(&Account::new(account)).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Confirm { signature } => {
            let signature = SignatureId::new(signature);
            client.confirm_submission(&signature).await?;
            println!("{} confirmed ({})", signature, client.config().commitment);
        }
        Commands::Count => {
            let counter = build_counter(&config)?;
            match counter.sync().await {
                Some(count) => println!("{}", count),
                None => println!("unknown"),
            }
        }
        Commands::Watch { account } => {
            watch(&config, client, Account::new(account)).await?;
        }
    }

    Ok(())
}

async fn watch(
    config: &SessionConfig,
    client: RpcChainClient,
    account: Account,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(
        SessionStore::new(
            Arc::new(WatchOnlyWallet::new(account)),
            Arc::new(client),
            config.transfer.demo_lamports,
        )
        .with_counter(build_counter(config)?),
    );
    let period = Duration::from_secs(config.observability.refresh_interval_secs);
    run_watch(store, period, tokio::signal::ctrl_c()).await?;
    Ok(())
}

/// Print snapshots until `shutdown` resolves, then disconnect.
///
/// Session work runs on its own task so shutdown is never stuck behind a
/// slow RPC call.
async fn run_watch<S: Future>(
    store: Arc<SessionStore>,
    period: Duration,
    shutdown: S,
) -> Result<(), serde_json::Error> {
    let mut snapshots = store.subscribe();
    print_snapshot(&snapshots.borrow_and_update().clone())?;

    let session = tokio::spawn({
        let store = store.clone();
        async move {
            store.initialize().await;
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.refresh().await;
            }
        }
    });

    tokio::pin!(shutdown);
    let result = loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if let Err(e) = print_snapshot(&snapshot) {
                    break Err(e);
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Interrupted, disconnecting");
                break Ok(());
            }
        }
    };

    session.abort();
    store.disconnect();
    result
}

fn build_counter(config: &SessionConfig) -> Result<TransactionCounter, Box<dyn std::error::Error>> {
    let cache = match &config.storage.path {
        Some(path) => CountCache::load_from_file(path),
        None => CountCache::new(None),
    };

    let source: Option<Arc<dyn TransactionCountSource>> = if config.counter.enabled {
        Some(Arc::new(ContractCountSource::new(&config.counter)?))
    } else {
        None
    };

    Ok(TransactionCounter::new(cache, source))
}

fn print_snapshot(state: &wallet_session::SessionState) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(state)?);
    Ok(())
}
