//! A read-only wallet bound to one public key.

use async_trait::async_trait;

use crate::chain::types::{Account, SignatureId};
use crate::wallet::bridge::WalletBridge;
use crate::wallet::types::{TransferIntent, WalletError, WalletResult};

/// Connects to a fixed account and refuses to sign anything.
#[derive(Debug, Clone)]
pub struct WatchOnlyWallet {
    account: Account,
}

impl WatchOnlyWallet {
    pub fn new(account: Account) -> Self {
        Self { account }
    }
}

#[async_trait]
impl WalletBridge for WatchOnlyWallet {
    async fn try_reconnect(&self) -> Option<Account> {
        Some(self.account.clone())
    }

    async fn connect_interactive(&self) -> WalletResult<Account> {
        Ok(self.account.clone())
    }

    async fn sign_and_send(&self, _intent: &TransferIntent) -> WalletResult<SignatureId> {
        Err(WalletError::SubmissionRejected(
            "watch-only wallet cannot sign".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_watch_only() {
        let wallet = WatchOnlyWallet::new(Account::from("Acc1"));
        assert_eq!(wallet.try_reconnect().await, Some(Account::from("Acc1")));

        let intent = TransferIntent {
            from: Account::from("Acc1"),
            to: Account::from("Acc1"),
            lamports: 1,
            memo: None,
        };
        assert!(matches!(
            wallet.sign_and_send(&intent).await,
            Err(WalletError::SubmissionRejected(_))
        ));
    }
}
