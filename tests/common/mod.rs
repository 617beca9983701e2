//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Notify};

use wallet_session::chain::{
    Account, Amount, ChainClient, ChainError, ChainResult, SignatureId, TransactionRecord,
};
use wallet_session::session::SessionState;
use wallet_session::wallet::{TransferIntent, WalletBridge, WalletError, WalletResult};

/// Reply to one JSON-RPC call: a `result` value or an `(code, message)` error.
pub type RpcReply = Result<Value, (i64, String)>;

/// Start a mock JSON-RPC node on an ephemeral port. `handler` sees the
/// method name and params of every request.
pub async fn start_mock_rpc<F>(handler: F) -> SocketAddr
where
    F: Fn(&str, &Value) -> RpcReply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let _ = serve_rpc(socket, handler.as_ref()).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that answers every request with a fixed HTTP status.
pub async fn start_status_backend(status_line: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = read_request(&mut socket).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                            status_line
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn serve_rpc(
    mut socket: TcpStream,
    handler: &(dyn Fn(&str, &Value) -> RpcReply + Send + Sync),
) -> std::io::Result<()> {
    let body = read_request(&mut socket).await?;
    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");
    let params = request.get("params").cloned().unwrap_or(Value::Null);

    let payload = match handler(method, &params) {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err((code, message)) => {
            json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
        }
    };
    let payload = payload.to_string();

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        payload.len(),
        payload
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

/// Read one HTTP request and return its body.
async fn read_request(socket: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(Vec::new());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Ok(buf[header_end..].to_vec())
}

/// Wait until a snapshot satisfies `predicate`, or panic after two seconds.
pub async fn wait_for<P>(rx: &mut watch::Receiver<SessionState>, predicate: P) -> SessionState
where
    P: FnMut(&SessionState) -> bool,
{
    let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for session state")
        .expect("session store dropped");
    state.clone()
}

pub fn record(signature: &str, slot: u64) -> TransactionRecord {
    TransactionRecord {
        signature: SignatureId::new(signature),
        slot,
        block_time: Some(1_700_000_000),
        failed: false,
        details: json!({"slot": slot}),
    }
}

/// A gate a mock call can be held at until the test releases it.
#[derive(Default)]
pub struct Gate {
    closed: Mutex<bool>,
    notify: Notify,
}

impl Gate {
    pub fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }

    pub fn open(&self) {
        *self.closed.lock().unwrap() = false;
        self.notify.notify_waiters();
    }

    pub async fn pass(&self) {
        loop {
            let notified = self.notify.notified();
            if !*self.closed.lock().unwrap() {
                return;
            }
            notified.await;
        }
    }
}

/// Scripted wallet bridge.
pub struct MockWallet {
    pub trusted: Mutex<Option<Account>>,
    pub connect_results: Mutex<VecDeque<WalletResult<Account>>>,
    pub send_result: Mutex<WalletResult<SignatureId>>,
    pub connect_gate: Gate,
    pub reconnect_calls: AtomicU32,
    pub connect_calls: AtomicU32,
    pub send_calls: AtomicU32,
    pub sent: Mutex<Vec<TransferIntent>>,
}

impl MockWallet {
    pub fn new() -> Self {
        Self {
            trusted: Mutex::new(None),
            connect_results: Mutex::new(VecDeque::new()),
            send_result: Mutex::new(Ok(SignatureId::new("sig-1"))),
            connect_gate: Gate::default(),
            reconnect_calls: AtomicU32::new(0),
            connect_calls: AtomicU32::new(0),
            send_calls: AtomicU32::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn trusting(account: &str) -> Self {
        let wallet = Self::new();
        *wallet.trusted.lock().unwrap() = Some(Account::from(account));
        wallet
    }

    pub fn push_connect(&self, result: WalletResult<Account>) {
        self.connect_results.lock().unwrap().push_back(result);
    }

    pub fn set_send_result(&self, result: WalletResult<SignatureId>) {
        *self.send_result.lock().unwrap() = result;
    }
}

#[async_trait]
impl WalletBridge for MockWallet {
    async fn try_reconnect(&self) -> Option<Account> {
        self.reconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.trusted.lock().unwrap().clone()
    }

    async fn connect_interactive(&self) -> WalletResult<Account> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .connect_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(WalletError::Unavailable));
        self.connect_gate.pass().await;
        result
    }

    async fn sign_and_send(&self, intent: &TransferIntent) -> WalletResult<SignatureId> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(intent.clone());
        self.send_result.lock().unwrap().clone()
    }
}

/// What a [`MockChain`] confirmation should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    Timeout,
    Failed,
}

/// Scripted chain client with per-account balances and history.
pub struct MockChain {
    pub balances: Mutex<Vec<(Account, u64)>>,
    pub history: Mutex<Vec<(Account, Vec<TransactionRecord>)>>,
    pub balance_fails: Mutex<bool>,
    pub history_fails: Mutex<bool>,
    pub confirm_outcome: Mutex<ConfirmOutcome>,
    pub balance_gate: Gate,
    pub history_gate: Gate,
    pub confirm_gate: Gate,
    pub balance_calls: AtomicU32,
    pub history_calls: AtomicU32,
    pub confirm_calls: AtomicU32,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            balance_fails: Mutex::new(false),
            history_fails: Mutex::new(false),
            confirm_outcome: Mutex::new(ConfirmOutcome::Confirmed),
            balance_gate: Gate::default(),
            history_gate: Gate::default(),
            confirm_gate: Gate::default(),
            balance_calls: AtomicU32::new(0),
            history_calls: AtomicU32::new(0),
            confirm_calls: AtomicU32::new(0),
        }
    }

    pub fn set_balance(&self, account: &str, lamports: u64) {
        let mut balances = self.balances.lock().unwrap();
        balances.retain(|(a, _)| a.as_str() != account);
        balances.push((Account::from(account), lamports));
    }

    pub fn set_history(&self, account: &str, records: Vec<TransactionRecord>) {
        let mut history = self.history.lock().unwrap();
        history.retain(|(a, _)| a.as_str() != account);
        history.push((Account::from(account), records));
    }

    pub fn fail_balance(&self, fail: bool) {
        *self.balance_fails.lock().unwrap() = fail;
    }

    pub fn fail_history(&self, fail: bool) {
        *self.history_fails.lock().unwrap() = fail;
    }

    pub fn set_confirm_outcome(&self, outcome: ConfirmOutcome) {
        *self.confirm_outcome.lock().unwrap() = outcome;
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_balance(&self, account: &Account) -> ChainResult<Amount> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.balance_gate.pass().await;
        if *self.balance_fails.lock().unwrap() {
            return Err(ChainError::NetworkUnavailable("balance down".into()));
        }
        let balances = self.balances.lock().unwrap();
        let lamports = balances
            .iter()
            .find(|(a, _)| a == account)
            .map(|(_, l)| *l)
            .unwrap_or(0);
        Ok(Amount::from_lamports(lamports))
    }

    async fn list_transactions(&self, account: &Account) -> ChainResult<Vec<TransactionRecord>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.history_gate.pass().await;
        if *self.history_fails.lock().unwrap() {
            return Err(ChainError::NetworkUnavailable("history down".into()));
        }
        let history = self.history.lock().unwrap();
        Ok(history
            .iter()
            .find(|(a, _)| a == account)
            .map(|(_, r)| r.clone())
            .unwrap_or_default())
    }

    async fn confirm_submission(&self, signature: &SignatureId) -> ChainResult<()> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        self.confirm_gate.pass().await;
        let outcome = *self.confirm_outcome.lock().unwrap();
        match outcome {
            ConfirmOutcome::Confirmed => Ok(()),
            ConfirmOutcome::Timeout => Err(ChainError::ConfirmationTimeout {
                signature: signature.clone(),
                waited_secs: 1,
            }),
            ConfirmOutcome::Failed => Err(ChainError::TransactionFailed {
                signature: signature.clone(),
                reason: "InstructionError".into(),
            }),
        }
    }
}

/// Poll `condition` until it holds, or panic after two seconds.
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
