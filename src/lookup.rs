// src/lookup.rs
//! Duplicate lookup: existing stories of the candidate's media source that
//! share its GUID, or share its title with a publish date inside the window.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::repository::StoryRepository;
use crate::story::{CandidateStory, Story};

#[derive(Clone)]
pub struct DuplicateLookup {
    repo: Arc<dyn StoryRepository>,
    window: Duration,
}

impl DuplicateLookup {
    /// `window` must lie in `[0, 2 days)`; build it from
    /// [`NoveltyConfig`](crate::config::NoveltyConfig) to get that checked.
    pub fn new(repo: Arc<dyn StoryRepository>, window: Duration) -> Self {
        debug_assert!(
            window >= Duration::zero() && window < Duration::days(2),
            "duplicate window {window} outside [0, 2 days)"
        );
        Self { repo, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Union of GUID and title-window matches, each existing story once.
    ///
    /// Read-only. Repository failures surface as
    /// [`NoveltyError::StorageUnavailable`](crate::error::NoveltyError::StorageUnavailable)
    /// without retry.
    pub async fn find_potential_duplicates(&self, candidate: &CandidateStory) -> Result<Vec<Story>> {
        let key = candidate.key()?;
        let mut found: BTreeMap<_, Story> = BTreeMap::new();

        if let Some(guid) = key.guid {
            let hits = self.repo.query_by_media_and_guid(key.media_id, guid).await?;
            tracing::debug!(
                target: "novelty::lookup",
                media = %key.media_id,
                hits = hits.len(),
                "guid lookup"
            );
            for s in hits.into_iter().filter(|s| s.media_id == key.media_id) {
                found.insert(s.id, s);
            }
        }

        if let Some((title, date)) = key.title {
            if self.window > Duration::zero() {
                let from = date
                    .checked_sub_signed(self.window)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                let to = date
                    .checked_add_signed(self.window)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                let hits = self
                    .repo
                    .query_by_media_and_title_window(key.media_id, title, from, to)
                    .await?;
                tracing::debug!(
                    target: "novelty::lookup",
                    media = %key.media_id,
                    hits = hits.len(),
                    "title window lookup"
                );
                // Pin the exclusive bound whatever the repository's range semantics.
                for s in hits.into_iter().filter(|s| {
                    s.media_id == key.media_id && (s.publish_date - date).abs() < self.window
                }) {
                    found.insert(s.id, s);
                }
            }
        }

        Ok(found.into_values().collect())
    }
}
