//! Demo that replays a few candidates for one media source through intake and
//! the processed tracker, using the in-memory repository.

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use story_novelty::telemetry::{init_tracing, Metrics};
use story_novelty::{
    parse_publish_date, CandidateStory, InMemoryStoryRepository, IntakeOutcome, MediaId,
    NoveltyClassifier, NoveltyConfig, ProcessedTracker, StoryIntake,
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let metrics = Metrics::init()?;

    let cfg = NoveltyConfig::load_default()?;
    let repo = Arc::new(InMemoryStoryRepository::new());
    let classifier = NoveltyClassifier::from_config(repo.clone(), &cfg)?;
    let intake = StoryIntake::new(repo.clone(), classifier);
    let tracker = ProcessedTracker::new(repo.clone());

    let media = MediaId(1);
    let d = parse_publish_date("2016-05-01T12:00:00Z")?;
    let seq = [
        CandidateStory::new(media, "g1", "u1", "t1", d),
        CandidateStory::new(media, "g1", "u2", "t2", d + Duration::days(10)),
        CandidateStory::new(media, "g2", "u2", "t1", d),
        CandidateStory::new(media, "g2", "u2", "t1", d + Duration::days(3)),
    ];

    for c in &seq {
        match intake.intake(c).await? {
            IntakeOutcome::Inserted(story) => {
                tracker.mark_processed(story.id).await?;
                tracker.mark_processed(story.id).await?;
                println!(
                    "{} {} -> new ({}, processed={})",
                    c.guid.as_deref().unwrap_or_default(),
                    c.title.as_deref().unwrap_or_default(),
                    story.id,
                    tracker.is_processed(story.id).await?
                );
            }
            IntakeOutcome::Duplicate(v) => println!(
                "{} {} -> {}",
                c.guid.as_deref().unwrap_or_default(),
                c.title.as_deref().unwrap_or_default(),
                serde_json::to_string(&v)?
            ),
            IntakeOutcome::RaceDuplicate => println!("race duplicate"),
        }
    }

    println!(
        "novelty-demo done: {} stories, {} processed (window {}s)",
        repo.story_count(),
        repo.processed_count(),
        cfg.duplicate_window_secs
    );
    tracing::debug!(metrics = %metrics.render(), "metrics snapshot");
    Ok(())
}
