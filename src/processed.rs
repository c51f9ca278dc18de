// src/processed.rs
//! Processed-state tracking.
//!
//! Each story moves once from `Unprocessed` to `Processed` and stays there.
//! Idempotence under concurrent workers comes from the repository's atomic
//! insert-if-absent; the tracker itself holds no state.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;

use crate::error::Result;
use crate::repository::StoryRepository;
use crate::story::StoryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessedState {
    Unprocessed,
    Processed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// This call created the marker.
    Marked,
    /// A marker was already there; nothing changed.
    AlreadyProcessed,
}

#[derive(Clone)]
pub struct ProcessedTracker {
    repo: Arc<dyn StoryRepository>,
}

impl ProcessedTracker {
    pub fn new(repo: Arc<dyn StoryRepository>) -> Self {
        Self { repo }
    }

    /// Ensure `story_id` carries a processed marker.
    pub async fn mark_processed(&self, story_id: StoryId) -> Result<()> {
        self.mark_processed_outcome(story_id).await.map(|_| ())
    }

    pub async fn mark_processed_outcome(&self, story_id: StoryId) -> Result<MarkOutcome> {
        let inserted = match self.repo.insert_processed_marker_if_absent(story_id).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(target: "novelty::processed", story = %story_id, error = %e, "mark processed failed");
                return Err(e.into());
            }
        };

        let outcome = if inserted {
            MarkOutcome::Marked
        } else {
            MarkOutcome::AlreadyProcessed
        };
        let label = match outcome {
            MarkOutcome::Marked => "marked",
            MarkOutcome::AlreadyProcessed => "already_processed",
        };
        counter!("processed_marked_total", "outcome" => label).increment(1);
        tracing::debug!(target: "novelty::processed", story = %story_id, outcome = label, "processed marker");
        Ok(outcome)
    }

    /// Unknown story ids report `false`.
    pub async fn is_processed(&self, story_id: StoryId) -> Result<bool> {
        Ok(self.repo.processed_marker_exists(story_id).await?)
    }

    pub async fn processed_state(&self, story_id: StoryId) -> Result<ProcessedState> {
        Ok(if self.is_processed(story_id).await? {
            ProcessedState::Processed
        } else {
            ProcessedState::Unprocessed
        })
    }
}
