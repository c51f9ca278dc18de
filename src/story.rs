// src/story.rs
//! Story records as seen by the novelty core: transient candidates discovered
//! from feeds, and stories already persisted by the repository.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NoveltyError, Result};

/// Media source (outlet) identifier. Duplicate matching never crosses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(pub i64);

/// Durable story identifier assigned by the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub i64);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "media#{}", self.0)
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "story#{}", self.0)
    }
}

/// A story discovered from a feed and not yet classified.
///
/// `None` means the field is absent. Empty strings are ordinary values and
/// compare like any other string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateStory {
    pub media_id: Option<MediaId>,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub publish_date: Option<DateTime<Utc>>,
}

/// A story persisted by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub media_id: MediaId,
    pub guid: String,
    pub url: String,
    pub title: String,
    pub publish_date: DateTime<Utc>,
}

impl Story {
    /// Candidate identical to this story in every observable field.
    pub fn as_candidate(&self) -> CandidateStory {
        CandidateStory {
            media_id: Some(self.media_id),
            guid: Some(self.guid.clone()),
            url: self.url.clone(),
            title: Some(self.title.clone()),
            publish_date: Some(self.publish_date),
        }
    }
}

/// Fields of a candidate that passed validation, borrowed for comparison.
#[derive(Debug, Clone, Copy)]
pub struct CandidateKey<'a> {
    pub media_id: MediaId,
    pub guid: Option<&'a str>,
    /// Title together with the publish date it must be compared against.
    pub title: Option<(&'a str, DateTime<Utc>)>,
}

impl CandidateStory {
    pub fn new(media_id: MediaId, guid: &str, url: &str, title: &str, publish_date: DateTime<Utc>) -> Self {
        Self {
            media_id: Some(media_id),
            guid: Some(guid.to_string()),
            url: url.to_string(),
            title: Some(title.to_string()),
            publish_date: Some(publish_date),
        }
    }

    /// Checks the fields classification depends on.
    ///
    /// A media id is required, and at least one of GUID or title. A title is
    /// only comparable with a resolved publish date.
    pub fn key(&self) -> Result<CandidateKey<'_>> {
        let media_id = self
            .media_id
            .ok_or_else(|| NoveltyError::invalid("candidate has no media source"))?;

        if self.guid.is_none() && self.title.is_none() {
            return Err(NoveltyError::invalid(format!(
                "candidate from {media_id} has neither guid nor title"
            )));
        }

        let title = match (self.title.as_deref(), self.publish_date) {
            (Some(t), Some(d)) => Some((t, d)),
            (Some(_), None) => {
                return Err(NoveltyError::invalid(format!(
                    "candidate from {media_id} has a title but no publish date"
                )))
            }
            (None, _) => None,
        };

        Ok(CandidateKey {
            media_id,
            guid: self.guid.as_deref(),
            title,
        })
    }
}

/// Resolve a feed timestamp to an absolute UTC instant.
///
/// Accepts RFC 3339, RFC 2822 and `YYYY-MM-DD HH:MM:SS±HH[:MM]`. Timestamps
/// without an offset are rejected since their instant is ambiguous.
pub fn parse_publish_date(raw: &str) -> Result<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(NoveltyError::invalid("empty publish date"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%#z") {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok();
    if naive {
        return Err(NoveltyError::invalid(format!(
            "publish date '{s}' has no UTC offset"
        )));
    }

    Err(NoveltyError::invalid(format!("unparseable publish date '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn key_requires_media_and_an_identity_field() {
        let mut c = CandidateStory::new(MediaId(1), "g", "u", "t", d());
        assert!(c.key().is_ok());

        c.media_id = None;
        assert!(matches!(c.key(), Err(NoveltyError::InvalidStoryData { .. })));

        let c = CandidateStory {
            media_id: Some(MediaId(1)),
            guid: None,
            url: "u".into(),
            title: None,
            publish_date: Some(d()),
        };
        assert!(matches!(c.key(), Err(NoveltyError::InvalidStoryData { .. })));
    }

    #[test]
    fn title_without_date_is_rejected_but_guid_only_is_fine() {
        let mut c = CandidateStory::new(MediaId(1), "g", "u", "t", d());
        c.publish_date = None;
        assert!(c.key().is_err());

        c.title = None;
        let key = c.key().unwrap();
        assert_eq!(key.guid, Some("g"));
        assert!(key.title.is_none());
    }

    #[test]
    fn empty_strings_are_ordinary_values() {
        let c = CandidateStory::new(MediaId(1), "", "", "", d());
        let key = c.key().unwrap();
        assert_eq!(key.guid, Some(""));
        assert_eq!(key.title.map(|(t, _)| t), Some(""));
    }

    #[test]
    fn parses_offset_timestamps_and_rejects_naive_ones() {
        assert_eq!(parse_publish_date("2016-05-01T12:00:00Z").unwrap(), d());
        assert_eq!(parse_publish_date("2016-05-01T14:00:00+02:00").unwrap(), d());
        assert_eq!(parse_publish_date("Sun, 01 May 2016 12:00:00 +0000").unwrap(), d());
        assert_eq!(parse_publish_date("2016-05-01 12:00:00+00").unwrap(), d());

        let err = parse_publish_date("2016-05-01 12:00:00").unwrap_err();
        assert!(err.to_string().contains("no UTC offset"));
        assert!(parse_publish_date("2016-05-01").is_err());
        assert!(parse_publish_date("yesterday").is_err());
        assert!(parse_publish_date("  ").is_err());
    }

    #[test]
    fn candidate_deserializes_with_missing_fields() {
        let c: CandidateStory =
            serde_json::from_str(r#"{"media_id": 3, "guid": "g1", "url": "u1"}"#).unwrap();
        assert_eq!(c.media_id, Some(MediaId(3)));
        assert!(c.title.is_none());
        assert!(c.publish_date.is_none());
    }
}
