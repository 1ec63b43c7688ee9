//! The pluggable external call-placement client.
//!
//! Grounded in `fourthplaces-mntogether`'s `twilio-rs` crate (a
//! `reqwest::Client` wrapped behind a small options struct, basic auth,
//! form-encoded POST) but abstracted behind a [`Placer`] trait, per
//! spec.md §1's explicit non-goal of real telephony integration: the
//! core only ever talks to the trait, and [`MockPlacer`] is what every
//! test and the default binary wiring use.

mod http;
mod mock;

pub use http::{HttpPlacer, HttpPlacerConfig};
pub use mock::MockPlacer;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single attempt's shape, independent of how the real store
/// represents a call log row — keeps this crate free of any dependency
/// on `dialer_core`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAttempt {
    pub external_call_id: String,
    pub dialed_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceOutcome {
    Succeeded,
    Failed,
}

#[derive(Error, Debug)]
pub enum PlacerError {
    #[error("placer request failed: {0}")]
    Request(String),

    #[error("placer timed out")]
    Timeout,
}

/// `place(call_log) -> result`, per spec.md §6's external placer
/// contract: emits a terminal result eventually, is safe to invoke once
/// per call-log row, and populates `external_call_id` for audit (the
/// caller supplies it up front here since the id is generated before
/// the row is written).
#[async_trait::async_trait]
pub trait Placer: Send + Sync {
    async fn place(&self, attempt: &CallAttempt) -> Result<PlaceOutcome, PlacerError>;
}
