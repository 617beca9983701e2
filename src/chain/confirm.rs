//! Confirmation polling for submitted signatures.

use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};

use crate::chain::types::{ChainError, ChainResult, Commitment, ConfirmationStatus, SignatureId};
use crate::resilience::calculate_backoff;

/// Upper bound on the extra delay after repeated poll failures.
const MAX_FAILURE_BACKOFF: Duration = Duration::from_secs(5);

/// How a confirmation wait behaves.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub commitment: Commitment,
    pub poll_interval: Duration,
    /// Overall deadline, distinct from per-request RPC timeouts.
    pub timeout: Duration,
    /// Consecutive network failures tolerated before giving up.
    pub max_failures: u32,
}

/// Poll `status` until the signature reaches the configured commitment.
///
/// Returns the slot the transaction landed in. Fails with
/// `ConfirmationTimeout` when the deadline passes, `TransactionFailed` when
/// the node reports an execution error, and the last network error once
/// `max_failures` consecutive polls have failed.
pub async fn wait_for_confirmation<F, Fut>(
    signature: &SignatureId,
    settings: &PollSettings,
    mut status: F,
) -> ChainResult<u64>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ChainResult<ConfirmationStatus>>,
{
    let result = timeout(settings.timeout, async {
        let mut ticker = interval(settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failures = 0u32;

        loop {
            ticker.tick().await;

            match status().await {
                Ok(ConfirmationStatus::Confirmed { slot }) => return Ok(slot),
                Ok(ConfirmationStatus::Failed(reason)) => {
                    return Err(ChainError::TransactionFailed {
                        signature: signature.clone(),
                        reason,
                    })
                }
                Ok(ConfirmationStatus::Confirming { reached }) => {
                    failures = 0;
                    tracing::debug!(
                        signature = %signature,
                        reached = %reached,
                        required = %settings.commitment,
                        "Waiting for commitment"
                    );
                }
                Ok(ConfirmationStatus::Pending) => {
                    failures = 0;
                    tracing::debug!(signature = %signature, "Transaction pending");
                }
                Err(e @ (ChainError::NetworkUnavailable(_) | ChainError::Rpc { .. })) => {
                    failures += 1;
                    if failures >= settings.max_failures {
                        return Err(e);
                    }
                    tracing::warn!(
                        signature = %signature,
                        failures,
                        error = %e,
                        "Signature status poll failed"
                    );
                    sleep(calculate_backoff(
                        failures,
                        settings.poll_interval,
                        MAX_FAILURE_BACKOFF,
                    ))
                    .await;
                }
                Err(e) => return Err(e),
            }
        }
    })
    .await;

    match result {
        Ok(outcome) => outcome,
        Err(_) => Err(ChainError::ConfirmationTimeout {
            signature: signature.clone(),
            waited_secs: settings.timeout.as_secs(),
        }),
    }
}
