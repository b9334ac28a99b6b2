//! # Error Types Module
//!
//! Errors surfaced by kitchen workflows and external services. Pure
//! reconciliation functions never fail; these cover configuration gaps,
//! failed calls to the store, inference or billing services, interrupted
//! batches and tier gating.

use thiserror::Error;

use crate::subscription::{Feature, SubscriptionTier};

#[derive(Debug, Error)]
pub enum KitchenError {
    /// A required credential or identifier is not configured. Not retried.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The item store could not complete a request
    #[error("Store error: {0}")]
    Store(String),
    /// The inference service failed or returned an unusable payload
    #[error("Inference error: {0}")]
    Inference(String),
    /// The billing service rejected or failed a request
    #[error("Billing error: {0}")]
    Billing(String),
    /// A sequential batch stopped part way. Completed operations are not rolled back.
    #[error("Batch interrupted after {completed} of {total} operations: {reason}")]
    PartialBatch {
        completed: usize,
        total: usize,
        /// Names of the items the batch finished, in order
        applied: Vec<String>,
        reason: String,
    },
    /// The Free tier's daily recipe discovery allowance is used up
    #[error("Daily explore limit of {limit} reached")]
    QuotaExceeded { limit: u32 },
    #[error("{feature} requires the {required} plan")]
    FeatureLocked {
        feature: Feature,
        required: SubscriptionTier,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl KitchenError {
    /// Whether the store may have been left with some but not all changes applied
    pub fn is_partial(&self) -> bool {
        matches!(self, KitchenError::PartialBatch { completed, .. } if *completed > 0)
    }
}

impl From<anyhow::Error> for KitchenError {
    fn from(err: anyhow::Error) -> Self {
        KitchenError::Store(format!("{err:#}"))
    }
}
