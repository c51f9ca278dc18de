//! Error taxonomy for the novelty core.
//!
//! Library errors are typed with `thiserror`; gateway implementations keep
//! `anyhow` context internally and surface it through [`StoreError`].

use thiserror::Error;

use crate::story::StoryId;

/// Errors returned by the classifier, the lookup, the tracker and intake.
#[derive(Debug, Error)]
pub enum NoveltyError {
    /// Repository unreachable or failing. Transient; the caller owns retries.
    #[error("story storage unavailable: {0:#}")]
    StorageUnavailable(#[source] anyhow::Error),

    /// Malformed candidate. Permanent.
    #[error("invalid story data: {reason}")]
    InvalidStoryData { reason: String },

    /// Unknown story identifier handed to the tracker. Permanent.
    #[error("story not found: {0}")]
    StoryNotFound(StoryId),
}

impl NoveltyError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidStoryData {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

/// Errors reported by a [`StoryRepository`](crate::repository::StoryRepository).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("repository unavailable: {0:#}")]
    Unavailable(#[from] anyhow::Error),

    #[error("story {0} does not exist")]
    StoryNotFound(StoryId),
}

impl From<StoreError> for NoveltyError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(inner) => NoveltyError::StorageUnavailable(inner),
            StoreError::StoryNotFound(id) => NoveltyError::StoryNotFound(id),
        }
    }
}

pub type Result<T, E = NoveltyError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_taxonomy() {
        let e: NoveltyError = StoreError::Unavailable(anyhow::anyhow!("connection refused")).into();
        assert!(e.is_transient());
        assert!(e.to_string().contains("connection refused"));

        let e: NoveltyError = StoreError::StoryNotFound(StoryId(7)).into();
        assert!(matches!(e, NoveltyError::StoryNotFound(StoryId(7))));
        assert!(!e.is_transient());
        assert!(!NoveltyError::invalid("no media").is_transient());
    }
}
