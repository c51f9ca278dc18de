// tests/novelty_is_new.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use story_novelty::{
    CandidateStory, InMemoryStoryRepository, MatchReason, MediaId, NewStory, NoveltyClassifier,
    NoveltyError, Story, StoryRepository, Verdict,
};

fn base_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 5, 1, 12, 0, 0).unwrap()
}

/// Two media sources: media 1 with stories 1..=6, media 2 with 7..=9.
async fn story_stack(repo: &InMemoryStoryRepository) -> Vec<Story> {
    let layout: [(i64, &[i64]); 2] = [(1, &[1, 2, 3, 4, 5, 6][..]), (2, &[7, 8, 9][..])];
    let mut out = Vec::new();
    for (media, nums) in layout {
        for &n in nums {
            let s = repo
                .insert_story_if_guid_absent(&NewStory {
                    media_id: MediaId(media),
                    guid: format!("guid-{n}"),
                    url: format!("https://media{media}.test/story/{n}"),
                    title: format!("story {n}"),
                    publish_date: base_date() + Duration::hours(n),
                })
                .await
                .unwrap()
                .expect("fresh guid");
            out.push(s);
        }
    }
    out
}

fn classifier(repo: &Arc<InMemoryStoryRepository>) -> NoveltyClassifier {
    NoveltyClassifier::new(repo.clone(), Duration::days(1))
}

#[tokio::test]
async fn field_matrix_against_every_stored_story() {
    let repo = Arc::new(InMemoryStoryRepository::new());
    let stories = story_stack(&repo).await;
    let cls = classifier(&repo);

    for story in &stories {
        let n = story.id;
        let c = story.as_candidate();

        assert!(!cls.is_new(&c).await.unwrap(), "{n} identical");

        let mut other_media = c.clone();
        other_media.media_id = Some(MediaId(story.media_id.0 + 1));
        assert!(cls.is_new(&other_media).await.unwrap(), "{n} media_id diff");

        let mut same_title = c.clone();
        same_title.url = "diff".into();
        same_title.guid = Some("diff".into());
        assert!(!cls.is_new(&same_title).await.unwrap(), "{n} URL + GUID diff, title same");

        let mut same_guid = c.clone();
        same_guid.url = "diff".into();
        same_guid.title = Some("diff".into());
        assert!(!cls.is_new(&same_guid).await.unwrap(), "{n} title + URL diff, GUID same");

        let mut same_url = c.clone();
        same_url.guid = Some("diff".into());
        same_url.title = Some("diff".into());
        assert!(cls.is_new(&same_url).await.unwrap(), "{n} title + GUID diff, URL same");

        for days in [2, -2] {
            let mut shifted = same_title.clone();
            shifted.publish_date = Some(story.publish_date + Duration::days(days));
            assert!(cls.is_new(&shifted).await.unwrap(), "{n} date {days:+} days");
        }
    }
}

#[tokio::test]
async fn scenario_guid_dominates_and_window_limits_title() {
    let repo = Arc::new(InMemoryStoryRepository::new());
    let d = base_date();
    let m = MediaId(42);
    let stored = repo
        .insert_story_if_guid_absent(&NewStory {
            media_id: m,
            guid: "g1".into(),
            url: "u1".into(),
            title: "t1".into(),
            publish_date: d,
        })
        .await
        .unwrap()
        .unwrap();
    let cls = classifier(&repo);

    let by_guid = CandidateStory::new(m, "g1", "u2", "t2", d + Duration::days(10));
    assert_eq!(
        cls.classify(&by_guid).await.unwrap(),
        Verdict::Duplicate {
            of: stored.id,
            reason: MatchReason::Guid
        }
    );

    let by_title = CandidateStory::new(m, "g2", "u2", "t1", d);
    assert!(!cls.is_new(&by_title).await.unwrap());

    let too_late = CandidateStory::new(m, "g2", "u2", "t1", d + Duration::days(3));
    assert!(cls.is_new(&too_late).await.unwrap());
}

#[tokio::test]
async fn title_match_exactly_one_window_apart_is_new() {
    let repo = Arc::new(InMemoryStoryRepository::new());
    let stories = story_stack(&repo).await;
    let cls = classifier(&repo);
    let s = &stories[0];

    let mut c = s.as_candidate();
    c.guid = Some("other".into());
    c.publish_date = Some(s.publish_date - Duration::days(1));
    assert!(cls.is_new(&c).await.unwrap());

    c.publish_date = Some(s.publish_date - Duration::days(1) + Duration::milliseconds(1));
    assert!(!cls.is_new(&c).await.unwrap());
}

#[tokio::test]
async fn empty_strings_compare_as_ordinary_values() {
    let repo = Arc::new(InMemoryStoryRepository::new());
    let d = base_date();
    repo.insert_story_if_guid_absent(&NewStory {
        media_id: MediaId(1),
        guid: "".into(),
        url: "".into(),
        title: "".into(),
        publish_date: d,
    })
    .await
    .unwrap();
    let cls = classifier(&repo);

    assert!(!cls
        .is_new(&CandidateStory::new(MediaId(1), "", "x", "y", d))
        .await
        .unwrap());
    assert!(cls
        .is_new(&CandidateStory::new(MediaId(1), "g", "", "y", d))
        .await
        .unwrap());
}

#[tokio::test]
async fn invalid_candidates_are_rejected() {
    let repo = Arc::new(InMemoryStoryRepository::new());
    let cls = classifier(&repo);

    let no_media = CandidateStory {
        media_id: None,
        guid: Some("g".into()),
        url: "u".into(),
        title: Some("t".into()),
        publish_date: Some(base_date()),
    };
    assert!(matches!(
        cls.is_new(&no_media).await,
        Err(NoveltyError::InvalidStoryData { .. })
    ));

    let undated = CandidateStory {
        media_id: Some(MediaId(1)),
        publish_date: None,
        ..no_media.clone()
    };
    assert!(matches!(
        cls.is_new(&undated).await,
        Err(NoveltyError::InvalidStoryData { .. })
    ));
}

#[tokio::test]
async fn lookup_failure_is_not_a_verdict() {
    let repo = Arc::new(InMemoryStoryRepository::new());
    story_stack(&repo).await;
    let cls = classifier(&repo);
    repo.set_offline(true);

    let c = CandidateStory::new(MediaId(1), "guid-1", "u", "story 1", base_date());
    let err = cls.is_new(&c).await.unwrap_err();
    assert!(matches!(err, NoveltyError::StorageUnavailable(_)));
    assert!(err.is_transient());
}
