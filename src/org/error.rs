use thiserror::Error;

use crate::store::StoreError;

/// Simplified failure surfaced to the UI layer. Store-level detail is logged
/// at the operation boundary; callers only need to know whether to show a
/// not-found, a rejection message, or a retry affordance.
#[derive(Debug, Error)]
pub enum OrgError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Business rejection (precondition or conflict); retrying unchanged
    /// input will fail again.
    #[error("{0}")]
    Rejected(String),

    /// Transient connectivity failure; retry is a user decision.
    #[error("service unavailable, please try again")]
    Unavailable,

    /// No persisted organization is loaded; mutations against the temporary
    /// client-only organization are refused.
    #[error("organization is not ready")]
    NotReady,
}

impl From<StoreError> for OrgError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} {id}")),
            StoreError::Precondition(msg) | StoreError::Conflict(msg) => Self::Rejected(msg),
            StoreError::Unavailable(_) => Self::Unavailable,
        }
    }
}
