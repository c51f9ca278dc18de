// src/intake.rs
//! Story intake: classify, persist new stories behind the (media, GUID)
//! guard, and downgrade a "new" verdict that lost the insert race.

use std::sync::Arc;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::classifier::{NoveltyClassifier, Verdict};
use crate::error::{NoveltyError, Result};
use crate::repository::{NewStory, StoryRepository};
use crate::story::{CandidateStory, Story};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "novelty_classified_total",
            "Candidates classified, by verdict."
        );
        describe_counter!(
            "processed_marked_total",
            "Processed-marker requests, by outcome."
        );
        describe_counter!("intake_inserted_total", "New stories persisted.");
        describe_counter!(
            "intake_duplicate_total",
            "Candidates classified as duplicates."
        );
        describe_counter!(
            "intake_race_duplicate_total",
            "Candidates classified new whose insert hit an existing (media, guid)."
        );
        describe_counter!(
            "intake_rejected_total",
            "Candidates rejected as invalid."
        );
        describe_gauge!("intake_last_run_ts", "Unix ts when a batch intake last ran.");
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Inserted(Story),
    Duplicate(Verdict),
    /// Classified new, but another writer persisted the same (media, GUID)
    /// before our insert.
    RaceDuplicate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeReport {
    pub inserted: Vec<Story>,
    pub duplicates: usize,
    pub race_duplicates: usize,
    pub rejected: usize,
}

#[derive(Clone)]
pub struct StoryIntake {
    repo: Arc<dyn StoryRepository>,
    classifier: NoveltyClassifier,
}

impl StoryIntake {
    pub fn new(repo: Arc<dyn StoryRepository>, classifier: NoveltyClassifier) -> Self {
        ensure_metrics_described();
        Self { repo, classifier }
    }

    pub fn classifier(&self) -> &NoveltyClassifier {
        &self.classifier
    }

    pub async fn intake(&self, candidate: &CandidateStory) -> Result<IntakeOutcome> {
        let verdict = self.classifier.classify(candidate).await?;
        if !verdict.is_new() {
            counter!("intake_duplicate_total").increment(1);
            return Ok(IntakeOutcome::Duplicate(verdict));
        }

        let new_story = NewStory::from_candidate(candidate)?;

        match self.repo.insert_story_if_guid_absent(&new_story).await? {
            Some(story) => {
                counter!("intake_inserted_total").increment(1);
                tracing::debug!(target: "intake", story = %story.id, media = %story.media_id, "story inserted");
                Ok(IntakeOutcome::Inserted(story))
            }
            None => {
                counter!("intake_race_duplicate_total").increment(1);
                tracing::info!(
                    target: "intake",
                    media = %new_story.media_id,
                    guid = %new_story.guid,
                    "new verdict downgraded: guid persisted concurrently"
                );
                Ok(IntakeOutcome::RaceDuplicate)
            }
        }
    }

    /// Run intake over a batch in order. Invalid candidates are counted and
    /// skipped; a storage failure aborts the batch.
    pub async fn intake_batch(&self, candidates: &[CandidateStory]) -> Result<IntakeReport> {
        let mut report = IntakeReport::default();

        for c in candidates {
            match self.intake(c).await {
                Ok(IntakeOutcome::Inserted(s)) => report.inserted.push(s),
                Ok(IntakeOutcome::Duplicate(_)) => report.duplicates += 1,
                Ok(IntakeOutcome::RaceDuplicate) => report.race_duplicates += 1,
                Err(NoveltyError::InvalidStoryData { reason }) => {
                    tracing::warn!(target: "intake", url = %c.url, %reason, "candidate rejected");
                    counter!("intake_rejected_total").increment(1);
                    report.rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let now = chrono::Utc::now().timestamp().max(0);
        gauge!("intake_last_run_ts").set(now as f64);
        tracing::info!(
            target: "intake",
            inserted = report.inserted.len(),
            duplicates = report.duplicates,
            race_duplicates = report.race_duplicates,
            rejected = report.rejected,
            "batch intake done"
        );
        Ok(report)
    }
}
