use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{ReviewId, ScoreSheet};

/// Persistence boundary for item scores so the manager can be exercised in isolation.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Fetch everything persisted for a review.
    async fn load(&self, review_id: &ReviewId) -> Result<ScoreSheet, StoreError>;
    /// Persist a partial update. Callers never pass an empty sheet.
    async fn save(&self, review_id: &ReviewId, changes: &ScoreSheet) -> Result<(), StoreError>;
}

/// Workflow hook that moves a fully scored review to its next status.
#[async_trait]
pub trait ReviewSubmitter: Send + Sync {
    async fn submit(&self, review_id: &ReviewId) -> Result<(), SubmitError>;
}

/// Result of a save attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    /// Nothing meaningful to persist; the store was not called.
    NoChanges,
}

/// Error enumeration for score store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("review not found")]
    NotFound,
    #[error("score store unavailable: {0}")]
    Unavailable(String),
    #[error("score store rejected the update: {0}")]
    Rejected(String),
}

/// Submission failure reported by the workflow backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("review cannot be submitted from its current status: {0}")]
    InvalidTransition(String),
    #[error("submission transport unavailable: {0}")]
    Transport(String),
}
