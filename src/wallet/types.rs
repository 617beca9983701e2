//! Wallet-side types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::types::{Account, Amount};

/// A native transfer handed to the wallet for signing and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    pub from: Account,
    pub to: Account,
    pub lamports: u64,
    /// Optional memo carried with the transfer.
    pub memo: Option<String>,
}

impl TransferIntent {
    pub fn amount(&self) -> Amount {
        Amount::from_lamports(self.lamports)
    }

    pub fn is_to_self(&self) -> bool {
        self.from == self.to
    }
}

/// Error reported by an injected extension, following the provider's
/// numeric code convention.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("extension error {code}: {message}")]
pub struct ExtensionError {
    pub code: i64,
    pub message: String,
}

impl ExtensionError {
    /// The user declined the request.
    pub const USER_REJECTED: i64 = 4001;
    /// The site is not trusted / not authorized yet.
    pub const UNAUTHORIZED: i64 = 4100;
    /// The extension lost its connection.
    pub const DISCONNECTED: i64 = 4900;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(Self::USER_REJECTED, "User rejected the request.")
    }
}

/// Errors surfaced by a [`WalletBridge`](crate::wallet::WalletBridge).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No extension detected, or it went away.
    #[error("Wallet extension not available")]
    Unavailable,

    /// The user declined to connect.
    #[error("User rejected the connection request")]
    UserRejected,

    /// Signing or broadcast was refused by the user or the node.
    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_to_self() {
        let intent = TransferIntent {
            from: Account::from("Acc1"),
            to: Account::from("Acc1"),
            lamports: 100_000_000,
            memo: None,
        };
        assert!(intent.is_to_self());
        assert_eq!(intent.amount().to_string(), "0.1");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ExtensionError::user_rejected().to_string(),
            "extension error 4001: User rejected the request."
        );
        assert_eq!(
            WalletError::SubmissionRejected("blockhash not found".into()).to_string(),
            "Submission rejected: blockhash not found"
        );
    }
}
