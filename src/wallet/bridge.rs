//! Gateway to an injected wallet extension.
//!
//! The extension is never reached through global state: the host installs
//! it into an [`ExtensionSlot`] and the bridge looks it up on every call, so
//! an extension that disappears between connect and send is noticed.

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use std::sync::Arc;

use crate::chain::types::{Account, SignatureId};
use crate::wallet::types::{ExtensionError, TransferIntent, WalletError, WalletResult};

/// Connect and sign capability used by the session.
#[async_trait]
pub trait WalletBridge: Send + Sync {
    /// Connect without prompting. `None` when there is no extension or the
    /// site is not trusted yet; that is the normal first-visit case.
    async fn try_reconnect(&self) -> Option<Account>;

    /// Prompt the user to connect.
    async fn connect_interactive(&self) -> WalletResult<Account>;

    /// Have the extension sign and broadcast `intent`.
    async fn sign_and_send(&self, intent: &TransferIntent) -> WalletResult<SignatureId>;
}

/// The provider object a wallet extension injects into the host.
#[async_trait]
pub trait WalletExtension: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Connect; with `only_if_trusted` the extension must not prompt.
    async fn connect(&self, only_if_trusted: bool) -> Result<Account, ExtensionError>;

    async fn sign_and_send_transaction(
        &self,
        intent: &TransferIntent,
    ) -> Result<SignatureId, ExtensionError>;
}

/// Where the host places (or removes) the injected extension.
#[derive(Default)]
pub struct ExtensionSlot {
    current: ArcSwapOption<Box<dyn WalletExtension>>,
}

impl ExtensionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(extension: impl WalletExtension + 'static) -> Self {
        let slot = Self::new();
        slot.install(extension);
        slot
    }

    pub fn install(&self, extension: impl WalletExtension + 'static) {
        tracing::debug!(extension = extension.name(), "Wallet extension installed");
        let boxed: Box<dyn WalletExtension> = Box::new(extension);
        self.current.store(Some(Arc::new(boxed)));
    }

    pub fn remove(&self) {
        self.current.store(None);
    }

    /// The extension present right now, if any.
    pub fn detect(&self) -> Option<Arc<Box<dyn WalletExtension>>> {
        self.current.load_full()
    }
}

impl std::fmt::Debug for ExtensionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.detect();
        f.debug_struct("ExtensionSlot")
            .field("extension", &current.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}

/// Stateless [`WalletBridge`] over whatever extension the slot holds.
#[derive(Debug, Clone)]
pub struct ExtensionBridge {
    slot: Arc<ExtensionSlot>,
}

impl ExtensionBridge {
    pub fn new(slot: Arc<ExtensionSlot>) -> Self {
        Self { slot }
    }
}

#[async_trait]
impl WalletBridge for ExtensionBridge {
    async fn try_reconnect(&self) -> Option<Account> {
        let Some(extension) = self.slot.detect() else {
            tracing::debug!("No wallet extension detected");
            return None;
        };

        match extension.connect(true).await {
            Ok(account) => {
                tracing::info!(
                    extension = extension.name(),
                    account = %account,
                    "Reconnected to trusted wallet"
                );
                Some(account)
            }
            Err(e) => {
                tracing::debug!(extension = extension.name(), error = %e, "Silent reconnect declined");
                None
            }
        }
    }

    async fn connect_interactive(&self) -> WalletResult<Account> {
        let extension = self.slot.detect().ok_or(WalletError::Unavailable)?;

        match extension.connect(false).await {
            Ok(account) => {
                tracing::info!(extension = extension.name(), account = %account, "Wallet connected");
                Ok(account)
            }
            Err(e) if e.code == ExtensionError::USER_REJECTED => Err(WalletError::UserRejected),
            Err(e) => {
                tracing::warn!(extension = extension.name(), error = %e, "Wallet connect failed");
                Err(WalletError::Unavailable)
            }
        }
    }

    async fn sign_and_send(&self, intent: &TransferIntent) -> WalletResult<SignatureId> {
        let extension = self.slot.detect().ok_or(WalletError::Unavailable)?;

        match extension.sign_and_send_transaction(intent).await {
            Ok(signature) => Ok(signature),
            Err(e) if e.code == ExtensionError::DISCONNECTED => Err(WalletError::Unavailable),
            Err(e) => Err(WalletError::SubmissionRejected(e.message)),
        }
    }
}
