use thiserror::Error;

use crate::chain::ChainError;
use crate::session::draft::DraftError;
use crate::session::state::ErrorKind;
use crate::wallet::WalletError;

/// Any failure a session command can run into.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Invalid draft: {0}")]
    Draft(#[from] DraftError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Wallet(WalletError::Unavailable) => ErrorKind::WalletUnavailable,
            SessionError::Wallet(WalletError::UserRejected) => ErrorKind::UserRejected,
            SessionError::Wallet(WalletError::SubmissionRejected(_)) => ErrorKind::SubmissionRejected,
            SessionError::Chain(ChainError::ConfirmationTimeout { .. }) => ErrorKind::ConfirmationTimeout,
            SessionError::Chain(ChainError::TransactionFailed { .. }) => ErrorKind::SubmissionRejected,
            SessionError::Chain(
                ChainError::NetworkUnavailable(_)
                | ChainError::Rpc { .. }
                | ChainError::InvalidResponse(_),
            ) => ErrorKind::NetworkUnavailable,
            SessionError::Draft(_) => ErrorKind::InvalidDraft,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::SignatureId;

    #[test]
    fn test_kinds() {
        assert_eq!(
            SessionError::from(WalletError::UserRejected).kind(),
            ErrorKind::UserRejected
        );
        assert_eq!(
            SessionError::from(ChainError::ConfirmationTimeout {
                signature: SignatureId::new("s"),
                waited_secs: 1,
            })
            .kind(),
            ErrorKind::ConfirmationTimeout
        );
        assert_eq!(
            SessionError::from(ChainError::TransactionFailed {
                signature: SignatureId::new("s"),
                reason: "x".into(),
            })
            .kind(),
            ErrorKind::SubmissionRejected
        );
        assert_eq!(
            SessionError::from(ChainError::Rpc { code: -32005, message: "behind".into() }).kind(),
            ErrorKind::NetworkUnavailable
        );
        assert_eq!(
            SessionError::from(DraftError::ZeroAmount).kind(),
            ErrorKind::InvalidDraft
        );
    }
}
