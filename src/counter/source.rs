//! Transaction-count data source backed by an EVM contract.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

use crate::config::CounterConfig;

sol! {
    /// Number of transfers recorded by the transactions contract.
    function getTransactionCount() external view returns (uint256);
}

/// Errors from a transaction-count source.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("Invalid counter configuration: {0}")]
    Config(String),

    #[error("Counter RPC error: {0}")]
    Rpc(String),

    #[error("Counter RPC timeout after {0} seconds")]
    Timeout(u64),

    #[error("Undecodable counter response: {0}")]
    Decode(String),
}

pub type CounterResult<T> = Result<T, CounterError>;

/// Somewhere the current transaction count can be read from.
#[async_trait]
pub trait TransactionCountSource: Send + Sync {
    async fn transaction_count(&self) -> CounterResult<u64>;
}

/// Reads `getTransactionCount()` from a contract with an `eth_call`.
pub struct ContractCountSource {
    provider: Arc<dyn Provider + Send + Sync>,
    contract: Address,
    timeout_secs: u64,
}

impl ContractCountSource {
    pub fn new(config: &CounterConfig) -> CounterResult<Self> {
        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            CounterError::Config(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let contract: Address = config.contract_address.parse().map_err(|e| {
            CounterError::Config(format!(
                "Invalid contract address '{}': {}",
                config.contract_address, e
            ))
        })?;

        Ok(Self {
            provider: Arc::new(ProviderBuilder::new().connect_http(url)),
            contract,
            timeout_secs: config.rpc_timeout_secs,
        })
    }
}

#[async_trait]
impl TransactionCountSource for ContractCountSource {
    async fn transaction_count(&self) -> CounterResult<u64> {
        let tx = TransactionRequest::default()
            .with_to(self.contract)
            .with_input(getTransactionCountCall {}.abi_encode());

        let raw = match timeout(Duration::from_secs(self.timeout_secs), self.provider.call(tx)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => return Err(CounterError::Rpc(e.to_string())),
            Err(_) => return Err(CounterError::Timeout(self.timeout_secs)),
        };

        let count: U256 = getTransactionCountCall::abi_decode_returns(&raw)
            .map_err(|e| CounterError::Decode(e.to_string()))?;
        u64::try_from(count).map_err(|_| CounterError::Decode(format!("count {} overflows u64", count)))
    }
}

impl std::fmt::Debug for ContractCountSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractCountSource")
            .field("contract", &self.contract)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
