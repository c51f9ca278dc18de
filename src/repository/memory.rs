// src/repository/memory.rs
//! In-process story repository.
//!
//! Every mutation happens under one lock, which gives the same atomicity a
//! unique index plus `ON CONFLICT DO NOTHING` gives the SQL repository.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::{NewStory, StoryRepository};
use crate::error::StoreError;
use crate::story::{MediaId, Story, StoryId};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    stories: BTreeMap<StoryId, Story>,
    by_guid: HashMap<(MediaId, String), StoryId>,
    processed: HashSet<StoryId>,
}

#[derive(Debug, Default)]
pub struct InMemoryStoryRepository {
    inner: Mutex<Inner>,
    offline: AtomicBool,
}

impl InMemoryStoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while set, every call fails with
    /// [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn story_count(&self) -> usize {
        self.inner.lock().stories.len()
    }

    pub fn processed_count(&self) -> usize {
        self.inner.lock().processed.len()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(anyhow!("in-memory repository is offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl StoryRepository for InMemoryStoryRepository {
    async fn query_by_media_and_guid(
        &self,
        media_id: MediaId,
        guid: &str,
    ) -> Result<Vec<Story>, StoreError> {
        self.check_online()?;
        let inner = self.inner.lock();
        Ok(inner
            .by_guid
            .get(&(media_id, guid.to_string()))
            .and_then(|id| inner.stories.get(id))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn query_by_media_and_title_window(
        &self,
        media_id: MediaId,
        title: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Story>, StoreError> {
        self.check_online()?;
        let inner = self.inner.lock();
        Ok(inner
            .stories
            .values()
            .filter(|s| {
                s.media_id == media_id
                    && s.title == title
                    && s.publish_date > from
                    && s.publish_date < to
            })
            .cloned()
            .collect())
    }

    async fn insert_processed_marker_if_absent(&self, story_id: StoryId) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut inner = self.inner.lock();
        if !inner.stories.contains_key(&story_id) {
            return Err(StoreError::StoryNotFound(story_id));
        }
        Ok(inner.processed.insert(story_id))
    }

    async fn processed_marker_exists(&self, story_id: StoryId) -> Result<bool, StoreError> {
        self.check_online()?;
        Ok(self.inner.lock().processed.contains(&story_id))
    }

    async fn insert_story_if_guid_absent(&self, story: &NewStory) -> Result<Option<Story>, StoreError> {
        self.check_online()?;
        let mut inner = self.inner.lock();
        let key = (story.media_id, story.guid.clone());
        if inner.by_guid.contains_key(&key) {
            return Ok(None);
        }

        inner.next_id += 1;
        let id = StoryId(inner.next_id);
        let stored = story.clone().into_story(id);
        inner.by_guid.insert(key, id);
        inner.stories.insert(id, stored.clone());
        Ok(Some(stored))
    }

    async fn get_story(&self, story_id: StoryId) -> Result<Option<Story>, StoreError> {
        self.check_online()?;
        Ok(self.inner.lock().stories.get(&story_id).cloned())
    }
}
