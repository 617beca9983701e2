//! Wallet extension integration.
//!
//! # Data Flow
//! ```text
//! host injects extension → ExtensionSlot
//!     → bridge.rs (ExtensionBridge: detect per call, map provider errors)
//!     → SessionStore (connect, sign-and-send)
//! ```
//!
//! # Security Constraints
//! - No keys live here; signing is the extension's job
//! - The bridge keeps no state of its own

pub mod bridge;
pub mod types;
pub mod watch_only;

pub use bridge::{ExtensionBridge, ExtensionSlot, WalletBridge, WalletExtension};
pub use types::{ExtensionError, TransferIntent, WalletError, WalletResult};
pub use watch_only::WatchOnlyWallet;
