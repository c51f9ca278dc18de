// src/repository/mod.rs
//! Gateway to persisted stories and processed markers.
//!
//! The novelty core never touches storage directly; it calls a
//! [`StoryRepository`]. Implementations must make
//! [`insert_processed_marker_if_absent`](StoryRepository::insert_processed_marker_if_absent)
//! and [`insert_story_if_guid_absent`](StoryRepository::insert_story_if_guid_absent)
//! atomic with respect to concurrent callers.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryStoryRepository;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStoryRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NoveltyError, Result, StoreError};
use crate::story::{CandidateStory, MediaId, Story, StoryId};

/// Fields needed to persist a story. The repository assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStory {
    pub media_id: MediaId,
    pub guid: String,
    pub url: String,
    pub title: String,
    pub publish_date: DateTime<Utc>,
}

impl NewStory {
    /// Persistable form of a candidate. A missing GUID falls back to the URL.
    pub fn from_candidate(c: &CandidateStory) -> Result<Self> {
        let media_id = c
            .media_id
            .ok_or_else(|| NoveltyError::invalid("candidate has no media source"))?;
        let title = c
            .title
            .clone()
            .ok_or_else(|| NoveltyError::invalid("cannot persist a story without a title"))?;
        let publish_date = c
            .publish_date
            .ok_or_else(|| NoveltyError::invalid("cannot persist a story without a publish date"))?;
        let guid = c.guid.clone().unwrap_or_else(|| c.url.clone());

        Ok(Self {
            media_id,
            guid,
            url: c.url.clone(),
            title,
            publish_date,
        })
    }

    pub(crate) fn into_story(self, id: StoryId) -> Story {
        Story {
            id,
            media_id: self.media_id,
            guid: self.guid,
            url: self.url,
            title: self.title,
            publish_date: self.publish_date,
        }
    }
}

#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Stories of `media_id` whose GUID equals `guid` exactly.
    async fn query_by_media_and_guid(
        &self,
        media_id: MediaId,
        guid: &str,
    ) -> Result<Vec<Story>, StoreError>;

    /// Stories of `media_id` titled exactly `title` and published strictly
    /// between `from` and `to`.
    async fn query_by_media_and_title_window(
        &self,
        media_id: MediaId,
        title: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Story>, StoreError>;

    /// Returns `true` if this call created the marker. Unknown stories yield
    /// [`StoreError::StoryNotFound`].
    async fn insert_processed_marker_if_absent(&self, story_id: StoryId) -> Result<bool, StoreError>;

    async fn processed_marker_exists(&self, story_id: StoryId) -> Result<bool, StoreError>;

    /// Persist `story` unless its (media, GUID) pair is already taken, in
    /// which case `None` is returned and nothing is written.
    async fn insert_story_if_guid_absent(&self, story: &NewStory) -> Result<Option<Story>, StoreError>;

    async fn get_story(&self, story_id: StoryId) -> Result<Option<Story>, StoreError>;
}
