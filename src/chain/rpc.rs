//! JSON-RPC 2.0 transport with per-request timeouts and endpoint failover.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::timeout;

use crate::chain::types::{ChainError, ChainResult};
use crate::observability::metrics;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Why a single endpoint attempt failed.
enum Attempt {
    /// Try the next endpoint.
    Transport(String),
    /// The node answered; do not fail over.
    Final(ChainError),
}

/// Sends JSON-RPC calls to a primary endpoint and its failovers.
#[derive(Debug, Clone)]
pub struct RpcTransport {
    http: reqwest::Client,
    endpoints: Vec<url::Url>,
    timeout_duration: Duration,
    next_id: std::sync::Arc<AtomicU64>,
}

impl RpcTransport {
    /// Create a transport. The primary URL must parse; invalid failover
    /// URLs are skipped with a warning.
    pub fn new(
        primary: &str,
        failovers: &[String],
        timeout_duration: Duration,
    ) -> ChainResult<Self> {
        let primary_url: url::Url = primary.parse().map_err(|e| {
            ChainError::NetworkUnavailable(format!("Invalid RPC URL '{}': {}", primary, e))
        })?;
        let mut endpoints = vec![primary_url];

        for url_str in failovers {
            match url_str.parse() {
                Ok(url) => endpoints.push(url),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        Ok(Self {
            http: reqwest::Client::new(),
            endpoints,
            timeout_duration,
            next_id: std::sync::Arc::new(AtomicU64::new(1)),
        })
    }

    /// Call `method` and decode its `result` field.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> ChainResult<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        for (i, endpoint) in self.endpoints.iter().enumerate() {
            match self.attempt(endpoint, &request).await {
                Ok(result) => {
                    metrics::record_rpc_request(method, "ok");
                    return serde_json::from_value(result).map_err(|e| {
                        ChainError::InvalidResponse(format!("{}: {}", method, e))
                    });
                }
                Err(Attempt::Final(err)) => {
                    metrics::record_rpc_request(method, "error");
                    return Err(err);
                }
                Err(Attempt::Transport(reason)) => {
                    tracing::warn!(
                        provider_idx = i,
                        method,
                        error = %reason,
                        "RPC transport failure, trying next provider"
                    );
                }
            }
        }

        metrics::record_rpc_request(method, "unavailable");
        Err(ChainError::NetworkUnavailable(format!(
            "All RPC providers failed for {}",
            method
        )))
    }

    async fn attempt(&self, endpoint: &url::Url, request: &RpcRequest<'_>) -> Result<Value, Attempt> {
        let body = match timeout(self.timeout_duration, self.exchange(endpoint, request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Attempt::Transport(format!(
                    "timed out after {:?}",
                    self.timeout_duration
                )))
            }
        };

        if let Some(err) = body.error {
            return Err(Attempt::Final(ChainError::Rpc {
                code: err.code,
                message: err.message,
            }));
        }
        // A missing result means JSON null, e.g. an unknown transaction.
        Ok(body.result.unwrap_or(Value::Null))
    }

    async fn exchange(
        &self,
        endpoint: &url::Url,
        request: &RpcRequest<'_>,
    ) -> Result<RpcResponse, Attempt> {
        let response = self
            .http
            .post(endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| Attempt::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Attempt::Transport(format!("HTTP {}", status)));
        }

        response
            .json::<RpcResponse>()
            .await
            .map_err(|e| Attempt::Final(ChainError::InvalidResponse(e.to_string())))
    }

    /// Number of configured endpoints, primary included.
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_primary_url() {
        let err = RpcTransport::new("not a url", &[], Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ChainError::NetworkUnavailable(_)));
    }

    #[test]
    fn test_invalid_failover_skipped() {
        let transport = RpcTransport::new(
            "http://127.0.0.1:8899",
            &["::bad::".to_string(), "http://127.0.0.1:8900".to_string()],
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(transport.endpoint_count(), 2);
    }

    #[test]
    fn test_request_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "getBalance",
            params: serde_json::json!(["Acc1"]),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"jsonrpc": "2.0", "id": 7, "method": "getBalance", "params": ["Acc1"]})
        );
    }
}
