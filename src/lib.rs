//! Wallet session library: connect a browser-style wallet extension, track
//! balance and history over Solana JSON-RPC, and submit transfers.

pub mod chain;
pub mod config;
pub mod counter;
pub mod observability;
pub mod resilience;
pub mod session;
pub mod wallet;

pub use chain::{ChainClient, RpcChainClient};
pub use config::schema::SessionConfig;
pub use session::{SessionState, SessionStore};
pub use wallet::{ExtensionBridge, ExtensionSlot, WalletBridge};
