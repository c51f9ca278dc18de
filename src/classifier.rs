// src/classifier.rs
//! # Novelty Classifier
//! Decides whether a candidate story is new for its media source.
//!
//! A candidate is a duplicate when an existing story of the same source has
//! the same GUID, or the same title with a publish date strictly less than
//! the duplicate window away. Comparison is exact (case-sensitive, no
//! normalization). URL equality alone never makes a duplicate.

use std::sync::Arc;

use chrono::Duration;
use metrics::counter;
use serde::Serialize;

use crate::config::NoveltyConfig;
use crate::error::Result;
use crate::lookup::DuplicateLookup;
use crate::repository::StoryRepository;
use crate::story::{CandidateKey, CandidateStory, Story, StoryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchReason {
    Guid,
    TitleWithinWindow { delta_secs: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    New,
    Duplicate { of: StoryId, reason: MatchReason },
}

impl Verdict {
    pub fn is_new(&self) -> bool {
        matches!(self, Verdict::New)
    }

    fn label(&self) -> &'static str {
        match self {
            Verdict::New => "new",
            Verdict::Duplicate { .. } => "duplicate",
        }
    }
}

/// Pure decision over a validated candidate and any set of existing stories.
///
/// Stories from other media sources are ignored. A GUID match is reported in
/// preference to a title match.
pub fn decide(key: &CandidateKey<'_>, existing: &[Story], window: Duration) -> Verdict {
    let media = key.media_id;
    let same_source = || existing.iter().filter(move |e| e.media_id == media);

    if let Some(guid) = key.guid {
        if let Some(e) = same_source().find(|e| e.guid == guid) {
            return Verdict::Duplicate {
                of: e.id,
                reason: MatchReason::Guid,
            };
        }
    }

    if let Some((title, date)) = key.title {
        for e in same_source().filter(|e| e.title == title) {
            let delta = (e.publish_date - date).abs();
            if delta < window {
                return Verdict::Duplicate {
                    of: e.id,
                    reason: MatchReason::TitleWithinWindow {
                        delta_secs: delta.num_seconds(),
                    },
                };
            }
        }
    }

    Verdict::New
}

#[derive(Clone)]
pub struct NoveltyClassifier {
    lookup: DuplicateLookup,
}

impl NoveltyClassifier {
    pub fn new(repo: Arc<dyn StoryRepository>, window: Duration) -> Self {
        Self {
            lookup: DuplicateLookup::new(repo, window),
        }
    }

    /// Classifier over `repo` with the validated window of `cfg`.
    pub fn from_config(repo: Arc<dyn StoryRepository>, cfg: &NoveltyConfig) -> anyhow::Result<Self> {
        cfg.validate()?;
        Ok(Self::new(repo, cfg.duplicate_window()))
    }

    pub fn from_lookup(lookup: DuplicateLookup) -> Self {
        Self { lookup }
    }

    pub fn window(&self) -> Duration {
        self.lookup.window()
    }

    pub fn lookup(&self) -> &DuplicateLookup {
        &self.lookup
    }

    /// Classify with the matched story for diagnostics.
    pub async fn classify(&self, candidate: &CandidateStory) -> Result<Verdict> {
        let key = candidate.key()?;
        let existing = self.lookup.find_potential_duplicates(candidate).await?;
        let verdict = decide(&key, &existing, self.lookup.window());

        counter!("novelty_classified_total", "verdict" => verdict.label()).increment(1);
        match verdict {
            Verdict::New => {
                tracing::debug!(target: "novelty", media = %key.media_id, url = %candidate.url, "new story");
            }
            Verdict::Duplicate { of, reason } => {
                tracing::debug!(
                    target: "novelty",
                    media = %key.media_id,
                    url = %candidate.url,
                    duplicate_of = %of,
                    reason = ?reason,
                    "duplicate story"
                );
            }
        }
        Ok(verdict)
    }

    /// `true` when no existing story of the same source matches.
    pub async fn is_new(&self, candidate: &CandidateStory) -> Result<bool> {
        Ok(self.classify(candidate).await?.is_new())
    }
}
