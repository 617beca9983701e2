//! Published session state.
//!
//! # States
//! ```text
//! Disconnected → Connecting → Connected ⇄ Submitting
//!                    │            │
//!                    └────────────┴──→ Disconnected
//! ```
//! `Connecting` and `Submitting` are always left for a stable phase.

use serde::Serialize;

use crate::chain::types::{Account, Amount, SignatureId, TransactionRecord};
use crate::session::draft::DraftTransfer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Phase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Submitting,
}

impl Phase {
    /// Whether this phase has a command in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Connecting | Phase::Submitting)
    }
}

/// Failure categories a session records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// No extension; the user must install or enable one.
    WalletUnavailable,
    /// The user declined; not alarming.
    UserRejected,
    /// Transient; any later refresh may succeed.
    NetworkUnavailable,
    /// The transfer may still land; the user should re-check the balance.
    ConfirmationTimeout,
    /// Terminal for that attempt.
    SubmissionRejected,
    /// The draft could not be turned into a transfer.
    InvalidDraft,
}

/// User-facing notice for the UI to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Notice {
    InstallWallet,
    Submitted { signature: SignatureId },
    ConfirmationPending { signature: SignatureId },
    SubmissionFailed { reason: String },
    InvalidDraft { reason: String },
}

/// Immutable snapshot of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub phase: Phase,
    pub account: Option<Account>,
    /// `None` until the first successful lookup for the current account.
    pub balance: Option<Amount>,
    pub transactions: Vec<TransactionRecord>,
    pub draft: DraftTransfer,
    pub busy: bool,
    pub notice: Option<Notice>,
    pub last_error: Option<ErrorKind>,
    pub last_signature: Option<SignatureId>,
    /// Advisory cached count; never a source of truth.
    pub transaction_count: Option<u64>,
    /// Bumped whenever the connected identity changes.
    pub epoch: u64,
    #[serde(skip)]
    pub(crate) command: u64,
}

impl SessionState {
    /// Drop the identity and everything derived from it in one step.
    pub(crate) fn clear_account(&mut self) {
        if self.account.take().is_some() {
            self.epoch += 1;
        }
        self.balance = None;
        self.transactions = Vec::new();
    }

    /// Switch to `account`, discarding data that belonged to another one.
    pub(crate) fn set_account(&mut self, account: Account) {
        if self.account.as_ref() == Some(&account) {
            return;
        }
        self.clear_account();
        self.account = Some(account);
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_account_clears_derived_data() {
        let mut state = SessionState::default();
        state.set_account(Account::from("Acc1"));
        state.balance = Some(Amount::from_lamports(5));
        let epoch = state.epoch;

        state.clear_account();
        assert_eq!(state.account, None);
        assert_eq!(state.balance, None);
        assert!(state.transactions.is_empty());
        assert!(state.epoch > epoch);
    }

    #[test]
    fn test_same_account_keeps_data() {
        let mut state = SessionState::default();
        state.set_account(Account::from("Acc1"));
        state.balance = Some(Amount::from_lamports(5));
        let epoch = state.epoch;

        state.set_account(Account::from("Acc1"));
        assert_eq!(state.balance, Some(Amount::from_lamports(5)));
        assert_eq!(state.epoch, epoch);

        state.set_account(Account::from("Acc2"));
        assert_eq!(state.balance, None);
        assert!(state.epoch > epoch);
    }

    #[test]
    fn test_busy_phases() {
        assert!(Phase::Connecting.is_busy());
        assert!(Phase::Submitting.is_busy());
        assert!(!Phase::Connected.is_busy());
        assert!(!Phase::Disconnected.is_busy());
    }
}
