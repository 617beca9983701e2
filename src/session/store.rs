//! The session state machine.
//!
//! # Responsibilities
//! - Connect (silent on startup, prompted on command) and disconnect
//! - Refresh balance and history as an independent pair
//! - Submit a transfer: sign-and-send, confirm, then refresh
//! - Publish an immutable snapshot after every transition
//!
//! # Design Decisions
//! - All writes go through one `watch` sender and replace whole field values
//! - Each connect/disconnect/submit takes a command ticket; a result whose
//!   ticket is no longer current is dropped instead of applied
//! - Refresh results are tagged with the identity epoch they were fetched
//!   for and dropped once the identity has changed
//! - Failures end in `Disconnected` or `Connected`, never mid-command

use std::sync::Arc;
use tokio::sync::watch;

use crate::chain::{Account, ChainClient, SignatureId};
use crate::counter::TransactionCounter;
use crate::observability::metrics;
use crate::session::draft::{build_transfer, DraftField};
use crate::session::error::SessionError;
use crate::session::state::{ErrorKind, Notice, Phase, SessionState};
use crate::wallet::{TransferIntent, WalletBridge};

/// Identifies the command a result belongs to.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    command: u64,
}

/// Holds the session and drives it from UI commands.
pub struct SessionStore {
    wallet: Arc<dyn WalletBridge>,
    chain: Arc<dyn ChainClient>,
    counter: Option<TransactionCounter>,
    demo_lamports: u64,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Create a disconnected session.
    pub fn new(wallet: Arc<dyn WalletBridge>, chain: Arc<dyn ChainClient>, demo_lamports: u64) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            wallet,
            chain,
            counter: None,
            demo_lamports,
            state,
        }
    }

    /// Attach the cached transaction count; its stored value is published
    /// immediately.
    pub fn with_counter(mut self, counter: TransactionCounter) -> Self {
        let cached = counter.cached();
        self.state.send_modify(|s| s.transaction_count = cached);
        self.counter = Some(counter);
        self
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Startup: re-check the transaction count and try a silent reconnect,
    /// concurrently. Staying disconnected is the normal first-visit outcome.
    pub async fn initialize(&self) {
        tokio::join!(self.sync_transaction_count(), self.silent_reconnect());
    }

    async fn silent_reconnect(&self) {
        let ticket = self.begin(Phase::Connecting);
        match self.wallet.try_reconnect().await {
            Some(account) => self.establish(ticket, account).await,
            None => {
                tracing::debug!("No trusted wallet, staying disconnected");
                self.settle(ticket, |s| {
                    s.phase = Phase::Disconnected;
                    s.clear_account();
                });
            }
        }
    }

    /// Prompted connect. Ignored while already connected.
    pub async fn connect(&self) {
        let phase = self.state.borrow().phase;
        if matches!(phase, Phase::Connected | Phase::Submitting) {
            tracing::debug!(?phase, "Connect ignored, already connected");
            return;
        }

        let ticket = self.begin(Phase::Connecting);
        match self.wallet.connect_interactive().await {
            Ok(account) => self.establish(ticket, account).await,
            Err(e) => {
                let err = SessionError::from(e);
                let kind = err.kind();
                match kind {
                    ErrorKind::UserRejected => tracing::info!("User declined wallet connection"),
                    _ => tracing::warn!(error = %err, "Wallet connection failed"),
                }
                self.settle(ticket, |s| {
                    s.phase = Phase::Disconnected;
                    s.clear_account();
                    s.last_error = Some(kind);
                    if kind == ErrorKind::WalletUnavailable {
                        s.notice = Some(Notice::InstallWallet);
                    }
                });
            }
        }
    }

    /// Explicit disconnect. Supersedes any command in flight.
    pub fn disconnect(&self) {
        self.state.send_modify(|s| {
            s.command += 1;
            s.phase = Phase::Disconnected;
            s.busy = false;
            s.clear_account();
        });
        metrics::record_connected(false);
        tracing::info!("Wallet disconnected");
    }

    /// Set one draft field. Nothing else changes.
    pub fn edit_draft_field(&self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        self.state.send_modify(|s| s.draft.set(field, value));
    }

    /// Submit the draft (or the demo transfer to self). Without an account
    /// this is a no-op; a submission already in flight is not duplicated.
    pub async fn submit_transfer(&self) {
        let (account, draft, phase) = {
            let s = self.state.borrow();
            (s.account.clone(), s.draft.clone(), s.phase)
        };
        let Some(account) = account else {
            tracing::debug!("Submit ignored, no account connected");
            return;
        };
        if phase != Phase::Connected {
            tracing::debug!(?phase, "Submit ignored, session busy");
            return;
        }

        let intent = match build_transfer(&draft, &account, self.demo_lamports) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::info!(error = %e, "Draft rejected");
                self.state.send_modify(|s| {
                    s.last_error = Some(ErrorKind::InvalidDraft);
                    s.notice = Some(Notice::InvalidDraft { reason: e.to_string() });
                });
                return;
            }
        };

        let ticket = self.begin(Phase::Submitting);
        let (signature, result) = self.sign_and_confirm(&intent).await;

        match result {
            Ok(()) => {
                metrics::record_submission("confirmed");
                let applied = self.settle(ticket, |s| {
                    s.phase = Phase::Connected;
                    s.notice = signature.clone().map(|signature| Notice::Submitted { signature });
                    s.last_signature = signature;
                });
                if applied {
                    self.refresh().await;
                    self.sync_transaction_count().await;
                }
            }
            Err(err) => {
                let kind = err.kind();
                metrics::record_submission(match kind {
                    ErrorKind::ConfirmationTimeout => "timeout",
                    ErrorKind::SubmissionRejected => "rejected",
                    _ => "error",
                });
                tracing::warn!(error = %err, kind = ?kind, "Transfer submission failed");

                self.settle(ticket, |s| {
                    s.phase = Phase::Connected;
                    s.last_error = Some(kind);
                    s.notice = Some(match (kind, signature.clone()) {
                        (ErrorKind::WalletUnavailable, _) => Notice::InstallWallet,
                        (ErrorKind::ConfirmationTimeout, Some(signature)) => {
                            Notice::ConfirmationPending { signature }
                        }
                        _ => Notice::SubmissionFailed { reason: err.to_string() },
                    });
                    if signature.is_some() {
                        s.last_signature = signature.clone();
                    }
                });
            }
        }
    }

    /// Fetch balance and history for the current account, concurrently.
    /// Each result is published on its own; a failure keeps the prior value.
    pub async fn refresh(&self) {
        let (account, epoch) = {
            let s = self.state.borrow();
            match &s.account {
                Some(account) => (account.clone(), s.epoch),
                None => return,
            }
        };

        tokio::join!(
            self.refresh_balance(&account, epoch),
            self.refresh_history(&account, epoch)
        );
    }

    async fn refresh_balance(&self, account: &Account, epoch: u64) {
        match self.chain.get_balance(account).await {
            Ok(balance) => {
                metrics::record_refresh("balance", true);
                if !self.apply_for_epoch(epoch, |s| s.balance = Some(balance)) {
                    tracing::debug!(account = %account, "Discarding balance for previous identity");
                }
            }
            Err(e) => {
                metrics::record_refresh("balance", false);
                tracing::warn!(account = %account, error = %e, "Balance refresh failed");
            }
        }
    }

    async fn refresh_history(&self, account: &Account, epoch: u64) {
        match self.chain.list_transactions(account).await {
            Ok(transactions) => {
                metrics::record_refresh("history", true);
                let count = transactions.len();
                if self.apply_for_epoch(epoch, |s| s.transactions = transactions) {
                    tracing::debug!(account = %account, count, "History refreshed");
                } else {
                    tracing::debug!(account = %account, "Discarding history for previous identity");
                }
            }
            Err(e) => {
                metrics::record_refresh("history", false);
                tracing::warn!(account = %account, error = %e, "History refresh failed");
            }
        }
    }

    async fn sign_and_confirm(
        &self,
        intent: &TransferIntent,
    ) -> (Option<SignatureId>, Result<(), SessionError>) {
        tracing::info!(
            to = %intent.to,
            amount = %intent.amount(),
            to_self = intent.is_to_self(),
            "Submitting transfer"
        );

        let signature = match self.wallet.sign_and_send(intent).await {
            Ok(signature) => signature,
            Err(e) => return (None, Err(e.into())),
        };
        tracing::info!(signature = %signature, "Transfer sent, awaiting confirmation");

        let result = self
            .chain
            .confirm_submission(&signature)
            .await
            .map_err(SessionError::from);
        (Some(signature), result)
    }

    async fn sync_transaction_count(&self) {
        let Some(counter) = &self.counter else {
            return;
        };
        let count = counter.sync().await;
        self.state.send_if_modified(|s| {
            if s.transaction_count == count {
                return false;
            }
            s.transaction_count = count;
            true
        });
    }

    /// Record a successful connect, refresh, then settle in `Connected`.
    async fn establish(&self, ticket: Ticket, account: Account) {
        let applied = self.state.send_if_modified(|s| {
            if s.command != ticket.command {
                return false;
            }
            s.set_account(account.clone());
            true
        });
        if !applied {
            tracing::debug!(account = %account, "Stale connect result ignored");
            return;
        }
        metrics::record_connected(true);

        self.refresh().await;
        self.settle(ticket, |s| s.phase = Phase::Connected);
    }

    /// Start a command: supersede whatever is in flight.
    fn begin(&self, phase: Phase) -> Ticket {
        let mut ticket = Ticket { command: 0 };
        self.state.send_modify(|s| {
            s.command += 1;
            s.phase = phase;
            s.busy = phase.is_busy();
            s.notice = None;
            s.last_error = None;
            ticket.command = s.command;
        });
        ticket
    }

    /// Finish a command if it is still current. Returns whether it was.
    fn settle(&self, ticket: Ticket, f: impl FnOnce(&mut SessionState)) -> bool {
        let applied = self.state.send_if_modified(|s| {
            if s.command != ticket.command {
                return false;
            }
            f(s);
            s.busy = s.phase.is_busy();
            true
        });
        if !applied {
            tracing::debug!(command = ticket.command, "Superseded command result ignored");
        }
        applied
    }

    fn apply_for_epoch(&self, epoch: u64, f: impl FnOnce(&mut SessionState)) -> bool {
        self.state.send_if_modified(|s| {
            if s.epoch != epoch || s.account.is_none() {
                return false;
            }
            f(s);
            true
        })
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.state.borrow();
        f.debug_struct("SessionStore")
            .field("phase", &s.phase)
            .field("account", &s.account)
            .field("demo_lamports", &self.demo_lamports)
            .finish()
    }
}
