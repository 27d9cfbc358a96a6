//! Error taxonomy shared by the service layer.

use thiserror::Error;

use crate::domain::aggregates::order::OrderStatus;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum CommerceError {
    /// Caller-supplied data failed a precondition. Never retried; the
    /// `field` names the first input that failed.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Requested status change violates the order state machine.
    #[error("cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("{0} not found")]
    NotFound(String),

    /// Persistence collaborator unreachable or timed out. Reads are safe
    /// to retry with backoff; writes only if the caller can rule out a
    /// partial write.
    #[error("temporarily unavailable: {0}")]
    Transient(StoreError),
}

impl CommerceError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CommerceError>;
