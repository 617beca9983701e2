//! Wallet session.
//!
//! # Data Flow
//! ```text
//! UI command (connect / edit / submit / disconnect / refresh)
//!     → store.rs (SessionStore: one command at a time per phase)
//!     → WalletBridge + ChainClient
//!     → state.rs (SessionState snapshot published on a watch channel)
//!     → UI renders the latest snapshot
//! ```
//!
//! # Invariants
//! - `balance` and `transactions` always belong to the current `account`
//! - `busy` is set exactly while `Connecting` or `Submitting`
//! - Draft edits touch the draft and nothing else

pub mod draft;
pub mod error;
pub mod state;
pub mod store;

pub use draft::{build_transfer, Destination, DraftError, DraftField, DraftTransfer};
pub use error::SessionError;
pub use state::{ErrorKind, Notice, Phase, SessionState};
pub use store::SessionStore;
