//! Chain-specific types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Re-export ChainConfig from config module to avoid duplication
pub use crate::config::schema::ChainConfig;

/// Lamports per SOL, the fixed smallest-unit conversion factor.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

const DECIMALS: usize = 9;

/// Public key of a connected account, in its base58 string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Account {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Transaction signature returned by the wallet and used for lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureId(String);

impl SignatureId {
    pub fn new(sig: impl Into<String>) -> Self {
        Self(sig.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A native-token amount, held exactly in lamports and displayed in SOL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_lamports(lamports: u64) -> Self {
        Self(lamports)
    }

    pub const fn lamports(&self) -> u64 {
        self.0
    }

    /// Display-unit value. Lossy above 2^53 lamports.
    pub fn to_sol(&self) -> f64 {
        self.0 as f64 / LAMPORTS_PER_SOL as f64
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / LAMPORTS_PER_SOL;
        let frac = self.0 % LAMPORTS_PER_SOL;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:0width$}", frac, width = DECIMALS);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

/// Error returned when a decimal SOL string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount '{0}'")]
pub struct ParseAmountError(pub String);

impl FromStr for Amount {
    type Err = ParseAmountError;

    /// Parse a decimal SOL value such as `"0.1"` into exact lamports.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseAmountError(s.to_string());
        let trimmed = s.trim();
        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > DECIMALS
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac: u64 = if frac.is_empty() {
            0
        } else {
            format!("{:0<width$}", frac, width = DECIMALS)
                .parse()
                .map_err(|_| invalid())?
        };

        whole
            .checked_mul(LAMPORTS_PER_SOL)
            .and_then(|l| l.checked_add(frac))
            .map(Amount)
            .ok_or_else(invalid)
    }
}

/// Commitment level used both for listing history and for confirmation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }

    /// Whether a status reported at `reached` satisfies this level.
    pub fn is_satisfied_by(&self, reached: Commitment) -> bool {
        reached >= *self
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized transaction touching the session's account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub signature: SignatureId,
    pub slot: u64,
    /// Unix seconds; `None` when the node does not know the block time.
    pub block_time: Option<i64>,
    /// Whether the transaction executed with an error.
    pub failed: bool,
    /// The parsed transaction as returned by the node.
    pub details: serde_json::Value,
}

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Every endpoint failed at the transport level or timed out.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node answered with something we could not decode.
    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    /// Transaction was not observed at the required commitment in time.
    #[error("Transaction {signature} not confirmed after {waited_secs} seconds")]
    ConfirmationTimeout { signature: SignatureId, waited_secs: u64 },

    /// The node reports the transaction executed with an error.
    #[error("Transaction {signature} failed: {reason}")]
    TransactionFailed { signature: SignatureId, reason: String },
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Status of a submitted signature as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Node has not seen the signature yet.
    Pending,
    /// Seen, but below the required commitment.
    Confirming { reached: Commitment },
    /// Reached the required commitment.
    Confirmed { slot: u64 },
    /// Executed with an error.
    Failed(String),
}
