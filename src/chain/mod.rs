//! Chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! ChainConfig (endpoint URLs, commitment)
//!     → rpc.rs (JSON-RPC with timeouts and failover)
//!     → client.rs (balance, history, status lookups)
//!     → confirm.rs (poll until the commitment is reached)
//! ```
//!
//! # Constraints
//! - Read-only: nothing here changes node state
//! - Every RPC call has a deadline; confirmation has its own overall deadline
//! - A single commitment level governs both history and confirmation

pub mod client;
pub mod confirm;
pub mod rpc;
pub mod types;

pub use client::{ChainClient, RpcChainClient};
pub use types::{
    Account, Amount, ChainConfig, ChainError, ChainResult, Commitment, SignatureId,
    TransactionRecord, LAMPORTS_PER_SOL,
};
