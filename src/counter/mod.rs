//! Cached transaction count.
//!
//! # Data Flow
//! ```text
//! startup: cache.rs reads the stored count once
//! initialize / after submit:
//!     source.rs (contract getTransactionCount)
//!     → compare with cached value
//!     → cache.rs writes only on change
//!     → SessionState.transaction_count
//! ```
//!
//! The count is advisory. Failures here are logged and never touch balance
//! or history.

pub mod cache;
pub mod source;

use std::sync::Arc;

pub use cache::{CountCache, TRANSACTION_COUNT_KEY};
pub use source::{ContractCountSource, CounterError, CounterResult, TransactionCountSource};

/// Cache plus optional source.
pub struct TransactionCounter {
    cache: CountCache,
    source: Option<Arc<dyn TransactionCountSource>>,
}

impl TransactionCounter {
    pub fn new(cache: CountCache, source: Option<Arc<dyn TransactionCountSource>>) -> Self {
        Self { cache, source }
    }

    /// Last known count without contacting the source.
    pub fn cached(&self) -> Option<u64> {
        self.cache.get()
    }

    /// Re-check the source and persist a changed value. Returns the best
    /// known count: the fresh one, or the cached one when the source is
    /// missing or failing.
    pub async fn sync(&self) -> Option<u64> {
        let Some(source) = &self.source else {
            return self.cache.get();
        };

        match source.transaction_count().await {
            Ok(count) => {
                match self.cache.set(count) {
                    Ok(true) => tracing::info!(count, "Transaction count changed"),
                    Ok(false) => {}
                    Err(e) => tracing::warn!(error = %e, "Failed to persist transaction count"),
                }
                Some(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Transaction count check failed");
                self.cache.get()
            }
        }
    }
}

impl std::fmt::Debug for TransactionCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionCounter")
            .field("cached", &self.cache.get())
            .field("has_source", &self.source.is_some())
            .finish()
    }
}
