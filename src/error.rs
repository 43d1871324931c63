use thiserror::Error;

use crate::repository::RepositoryError;

/// Failures surfaced by the detector. No-match conditions are never errors;
/// they come back as [`crate::services::detector::PositionOutcome::Ignored`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("repository failure: {0}")]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    /// Whether the ingest side should redeliver the message later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::Repository(RepositoryError::Unavailable(_))
                | EngineError::Repository(RepositoryError::Conflict { .. })
        )
    }
}
