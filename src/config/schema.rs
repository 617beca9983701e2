//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a wallet
//! session. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::chain::types::Commitment;

/// Root configuration for a wallet session.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// Chain RPC settings.
    pub chain: ChainConfig,

    /// Transfer construction settings.
    pub transfer: TransferConfig,

    /// Where the cached transaction count lives.
    pub storage: StorageConfig,

    /// Transaction-count data source.
    pub counter: CounterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Chain RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, tried in order.
    pub failover_urls: Vec<String>,

    /// Commitment for both history listing and confirmation.
    pub commitment: Commitment,

    /// Per-request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// How long `confirm_submission` waits before giving up.
    pub confirmation_timeout_secs: u64,

    /// Delay between signature status polls.
    pub poll_interval_ms: u64,

    /// Consecutive network failures tolerated while polling.
    pub max_poll_failures: u32,

    /// Maximum signatures to list; node default when unset.
    pub history_limit: Option<usize>,

    /// Concurrent transaction detail fetches.
    pub detail_concurrency: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            failover_urls: Vec::new(),
            commitment: Commitment::Confirmed,
            rpc_timeout_secs: 10,
            confirmation_timeout_secs: 60,
            poll_interval_ms: 500,
            max_poll_failures: 3,
            history_limit: None,
            detail_concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Amount sent by the send-to-self demo transfer.
    pub demo_lamports: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            demo_lamports: 100_000_000, // 0.1 SOL
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding the cached transaction count.
    pub path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: Some("wallet-session.json".to_string()),
        }
    }
}

/// Transaction-count contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Enable the transaction-count check.
    pub enabled: bool,

    /// EVM JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Address of the contract exposing `getTransactionCount()`.
    pub contract_address: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rpc_url: "http://localhost:8545".to_string(),
            contract_address: String::new(),
            rpc_timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Refresh period of the `watch` command.
    pub refresh_interval_secs: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
            refresh_interval_secs: 30,
        }
    }
}
