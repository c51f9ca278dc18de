// src/lib.rs
//! Novelty classification and processed-state tracking for a news ingestion
//! pipeline.
//!
//! A candidate story is a duplicate when an existing story of the same media
//! source shares its GUID, or shares its title with a publish date less than
//! the configured window away. Processed markers are written at most once per
//! story, whatever the number of concurrent workers.

pub mod classifier;
pub mod config;
pub mod error;
pub mod intake;
pub mod lookup;
pub mod processed;
pub mod repository;
pub mod story;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::classifier::{decide, MatchReason, NoveltyClassifier, Verdict};
pub use crate::config::NoveltyConfig;
pub use crate::error::{NoveltyError, StoreError};
pub use crate::intake::{IntakeOutcome, IntakeReport, StoryIntake};
pub use crate::lookup::DuplicateLookup;
pub use crate::processed::{MarkOutcome, ProcessedState, ProcessedTracker};
pub use crate::repository::{InMemoryStoryRepository, NewStory, StoryRepository};
pub use crate::story::{parse_publish_date, CandidateStory, MediaId, Story, StoryId};
