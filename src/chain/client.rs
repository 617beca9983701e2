//! Chain RPC client.
//!
//! # Responsibilities
//! - Balance lookup, converted from lamports to SOL
//! - Transaction history: signature listing plus best-effort detail fetch
//! - Confirmation polling at the configured commitment
//!
//! No operation here mutates node state; every call is safe to repeat.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::chain::confirm::{wait_for_confirmation, PollSettings};
use crate::chain::rpc::RpcTransport;
use crate::chain::types::{
    Account, Amount, ChainConfig, ChainError, ChainResult, Commitment, ConfirmationStatus,
    SignatureId, TransactionRecord,
};
use crate::observability::metrics;

/// Read-only and confirmation operations against the network.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current balance of `account`. A failure means unknown, not zero.
    async fn get_balance(&self, account: &Account) -> ChainResult<Amount>;

    /// Recent transactions, most recent first. Entries whose details cannot
    /// be fetched are left out; only the signature listing itself can fail.
    async fn list_transactions(&self, account: &Account) -> ChainResult<Vec<TransactionRecord>>;

    /// Suspend until `signature` reaches the configured commitment.
    async fn confirm_submission(&self, signature: &SignatureId) -> ChainResult<()>;
}

#[derive(Debug, Deserialize)]
struct ContextValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureInfo {
    signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    slot: u64,
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    confirmation_status: Option<Commitment>,
}

/// ChainClient over Solana-style JSON-RPC.
#[derive(Clone)]
pub struct RpcChainClient {
    transport: RpcTransport,
    config: ChainConfig,
}

impl RpcChainClient {
    /// Create a new chain client. No request is made until first use.
    pub fn new(config: ChainConfig) -> ChainResult<Self> {
        let transport = RpcTransport::new(
            &config.rpc_url,
            &config.failover_urls,
            Duration::from_secs(config.rpc_timeout_secs),
        )?;

        tracing::info!(
            rpc_url = %config.rpc_url,
            endpoints = transport.endpoint_count(),
            commitment = %config.commitment,
            "Chain client initialized"
        );

        Ok(Self { transport, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Balance in lamports.
    pub async fn get_lamports(&self, account: &Account) -> ChainResult<u64> {
        let response: ContextValue<u64> = self
            .transport
            .call(
                "getBalance",
                json!([account.as_str(), { "commitment": self.config.commitment }]),
            )
            .await?;
        Ok(response.value)
    }

    /// Signatures touching `account`, most recent first.
    pub async fn get_signatures(&self, account: &Account) -> ChainResult<Vec<SignatureId>> {
        let mut options = json!({ "commitment": self.config.commitment });
        if let Some(limit) = self.config.history_limit {
            options["limit"] = json!(limit);
        }

        let infos: Vec<SignatureInfo> = self
            .transport
            .call("getSignaturesForAddress", json!([account.as_str(), options]))
            .await?;
        Ok(infos.into_iter().map(|i| SignatureId::new(i.signature)).collect())
    }

    /// Parsed transaction, or `None` if the node no longer has it.
    pub async fn get_transaction(
        &self,
        signature: &SignatureId,
    ) -> ChainResult<Option<TransactionRecord>> {
        let tx: Option<Value> = self
            .transport
            .call(
                "getTransaction",
                json!([
                    signature.as_str(),
                    {
                        "encoding": "jsonParsed",
                        "commitment": self.config.commitment,
                        "maxSupportedTransactionVersion": 0
                    }
                ]),
            )
            .await?;

        match tx {
            Some(details) => parse_record(signature, details).map(Some),
            None => Ok(None),
        }
    }

    /// One status poll for `signature`.
    pub async fn signature_status(&self, signature: &SignatureId) -> ChainResult<ConfirmationStatus> {
        let response: ContextValue<Vec<Option<SignatureStatus>>> = self
            .transport
            .call(
                "getSignatureStatuses",
                json!([[signature.as_str()], { "searchTransactionHistory": false }]),
            )
            .await?;

        let status = response.value.into_iter().next().flatten();
        Ok(classify_status(status, self.config.commitment))
    }

    fn poll_settings(&self) -> PollSettings {
        PollSettings {
            commitment: self.config.commitment,
            poll_interval: Duration::from_millis(self.config.poll_interval_ms),
            timeout: Duration::from_secs(self.config.confirmation_timeout_secs),
            max_failures: self.config.max_poll_failures.max(1),
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn get_balance(&self, account: &Account) -> ChainResult<Amount> {
        let lamports = self.get_lamports(account).await?;
        Ok(Amount::from_lamports(lamports))
    }

    async fn list_transactions(&self, account: &Account) -> ChainResult<Vec<TransactionRecord>> {
        let signatures = self.get_signatures(account).await?;
        let total = signatures.len();

        let fetched: Vec<Option<TransactionRecord>> = stream::iter(signatures)
            .map(|signature| async move {
                match self.get_transaction(&signature).await {
                    Ok(Some(record)) => Some(record),
                    Ok(None) => {
                        tracing::debug!(signature = %signature, "Transaction details unavailable");
                        None
                    }
                    Err(e) => {
                        tracing::warn!(signature = %signature, error = %e, "Dropping transaction");
                        None
                    }
                }
            })
            .buffered(self.config.detail_concurrency.max(1))
            .collect()
            .await;

        let records: Vec<TransactionRecord> = fetched.into_iter().flatten().collect();
        metrics::record_history_dropped(total - records.len());
        Ok(records)
    }

    async fn confirm_submission(&self, signature: &SignatureId) -> ChainResult<()> {
        let slot = wait_for_confirmation(signature, &self.poll_settings(), || {
            self.signature_status(signature)
        })
        .await?;

        tracing::info!(
            signature = %signature,
            slot,
            commitment = %self.config.commitment,
            "Transaction confirmed"
        );
        Ok(())
    }
}

impl std::fmt::Debug for RpcChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("commitment", &self.config.commitment)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

fn parse_record(signature: &SignatureId, details: Value) -> ChainResult<TransactionRecord> {
    let slot = details
        .get("slot")
        .and_then(Value::as_u64)
        .ok_or_else(|| ChainError::InvalidResponse(format!("transaction {} has no slot", signature)))?;
    let block_time = details.get("blockTime").and_then(Value::as_i64);
    let failed = details
        .get("meta")
        .and_then(|meta| meta.get("err"))
        .is_some_and(|err| !err.is_null());

    Ok(TransactionRecord {
        signature: signature.clone(),
        slot,
        block_time,
        failed,
        details,
    })
}

fn classify_status(status: Option<SignatureStatus>, required: Commitment) -> ConfirmationStatus {
    let Some(status) = status else {
        return ConfirmationStatus::Pending;
    };
    if let Some(err) = status.err {
        return ConfirmationStatus::Failed(err.to_string());
    }
    // Rooted statuses may omit the level.
    let reached = status.confirmation_status.unwrap_or(Commitment::Finalized);
    if required.is_satisfied_by(reached) {
        ConfirmationStatus::Confirmed { slot: status.slot }
    } else {
        ConfirmationStatus::Confirming { reached }
    }
}
