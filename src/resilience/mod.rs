//! Resilience helpers.
//!
//! Every RPC call already carries a deadline (see `chain::rpc`); this module
//! holds the backoff used between confirmation polls after network errors.

pub mod backoff;

pub use backoff::calculate_backoff;
