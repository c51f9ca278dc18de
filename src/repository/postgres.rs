// src/repository/postgres.rs
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::{NewStory, StoryRepository};
use crate::error::StoreError;
use crate::story::{MediaId, Story, StoryId};

/// Tables the repository expects. The unique indexes carry the atomicity the
/// novelty core relies on.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS stories (
    stories_id   BIGSERIAL PRIMARY KEY,
    media_id     BIGINT NOT NULL,
    guid         TEXT NOT NULL,
    url          TEXT NOT NULL,
    title        TEXT NOT NULL,
    publish_date TIMESTAMPTZ NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS stories_media_guid ON stories (media_id, guid);
CREATE INDEX IF NOT EXISTS stories_media_title_date ON stories (media_id, title, publish_date);

CREATE TABLE IF NOT EXISTS processed_stories (
    processed_stories_id BIGSERIAL PRIMARY KEY,
    stories_id           BIGINT NOT NULL UNIQUE
                         REFERENCES stories (stories_id) ON DELETE CASCADE
);
"#;

pub struct PostgresStoryRepository {
    pool: PgPool,
}

impl PostgresStoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("connecting to story database")?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they are missing.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .context("creating story tables")?;
        Ok(())
    }
}

fn story_from_row(r: &PgRow) -> Result<Story, sqlx::Error> {
    Ok(Story {
        id: StoryId(r.try_get("stories_id")?),
        media_id: MediaId(r.try_get("media_id")?),
        guid: r.try_get("guid")?,
        url: r.try_get("url")?,
        title: r.try_get("title")?,
        publish_date: r.try_get("publish_date")?,
    })
}

fn stories_from_rows(rows: Vec<PgRow>, what: &'static str) -> Result<Vec<Story>, StoreError> {
    rows.iter()
        .map(story_from_row)
        .collect::<Result<Vec<_>, _>>()
        .context(what)
        .map_err(StoreError::from)
}

#[async_trait]
impl StoryRepository for PostgresStoryRepository {
    async fn query_by_media_and_guid(
        &self,
        media_id: MediaId,
        guid: &str,
    ) -> Result<Vec<Story>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT stories_id, media_id, guid, url, title, publish_date
            FROM stories
            WHERE media_id = $1 AND guid = $2
            "#,
        )
        .bind(media_id.0)
        .bind(guid)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query stories by media and guid")?;

        stories_from_rows(rows, "Failed to decode stories by guid")
    }

    async fn query_by_media_and_title_window(
        &self,
        media_id: MediaId,
        title: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Story>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT stories_id, media_id, guid, url, title, publish_date
            FROM stories
            WHERE media_id = $1
              AND title = $2
              AND publish_date > $3
              AND publish_date < $4
            "#,
        )
        .bind(media_id.0)
        .bind(title)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query stories by media and title window")?;

        stories_from_rows(rows, "Failed to decode stories by title")
    }

    async fn insert_processed_marker_if_absent(&self, story_id: StoryId) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            INSERT INTO processed_stories (stories_id)
            VALUES ($1)
            ON CONFLICT (stories_id) DO NOTHING
            "#,
        )
        .bind(story_id.0)
        .execute(&self.pool)
        .await;

        match res {
            Ok(done) => Ok(done.rows_affected() == 1),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(StoreError::StoryNotFound(story_id))
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context("Failed to insert processed marker")
                .into()),
        }
    }

    async fn processed_marker_exists(&self, story_id: StoryId) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM processed_stories WHERE stories_id = $1)",
        )
        .bind(story_id.0)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check processed marker")?;
        Ok(exists)
    }

    async fn insert_story_if_guid_absent(&self, story: &NewStory) -> Result<Option<Story>, StoreError> {
        let id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO stories (media_id, guid, url, title, publish_date)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (media_id, guid) DO NOTHING
            RETURNING stories_id
            "#,
        )
        .bind(story.media_id.0)
        .bind(&story.guid)
        .bind(&story.url)
        .bind(&story.title)
        .bind(story.publish_date)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to insert story")?;

        Ok(id.map(|id| story.clone().into_story(StoryId(id))))
    }

    async fn get_story(&self, story_id: StoryId) -> Result<Option<Story>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT stories_id, media_id, guid, url, title, publish_date
            FROM stories
            WHERE stories_id = $1
            "#,
        )
        .bind(story_id.0)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get story")?;

        row.as_ref()
            .map(story_from_row)
            .transpose()
            .context("Failed to decode story")
            .map_err(StoreError::from)
    }
}
