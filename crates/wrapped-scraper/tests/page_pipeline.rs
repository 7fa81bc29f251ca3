//! End-to-end tests for `run_page` over saved dashboard renders.
//!
//! Fixtures under `tests/fixtures/` are trimmed copies of the two analytics
//! pages. Time-dependent tests run on a paused tokio clock so the load wait
//! and stabilization delays cost nothing.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use wrapped_core::{aggregate, MediaKind, MergePolicy, Metric, PageScrapeResult};
use wrapped_scraper::{
    fingerprint, run_page, LoadWait, PageError, PageSource, PollConfig,
    ReadyState, ScrapeSettings, SnapshotSequence,
};

const TOP_POSTS_URL: &str =
    "https://www.linkedin.com/analytics/creator/top-posts/?timeRange=past_365_days";
const CONTENT_URL: &str = "https://www.linkedin.com/analytics/creator/content/?endDate=2025-12-15&metricType=IMPRESSIONS&startDate=2024-12-15&timeRange=past_365_days";

const TOP_POSTS_HTML: &str = include_str!("fixtures/top_posts.html");
const PANEL_LOADING_HTML: &str = include_str!("fixtures/panel_loading.html");
const PANEL_READY_HTML: &str = include_str!("fixtures/panel_ready.html");

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Builtin profile with short waits.
fn fast_settings() -> ScrapeSettings {
    ScrapeSettings {
        load: LoadWait {
            check_interval: Duration::from_millis(5),
            max_checks: 4,
            settle_delay: Duration::from_millis(1),
        },
        panel_poll: Some(PollConfig {
            interval: Duration::from_millis(800),
            max_attempts: 15,
            stable_rounds: 2,
        }),
        ..ScrapeSettings::default()
    }
}

/// Page whose snapshots cannot be taken, as when the tab was closed.
struct ClosedTab;

impl PageSource for ClosedTab {
    async fn ready_state(&self) -> Result<ReadyState, PageError> {
        Ok(ReadyState::Complete)
    }

    async fn snapshot(&self) -> Result<String, PageError> {
        Err(PageError::Source {
            reason: "tab closed".to_owned(),
        })
    }
}

// -----------------------------------------------------------------------
// Top posts
// -----------------------------------------------------------------------

#[tokio::test]
async fn top_posts_page_from_file() {
    let source = SnapshotSequence::from_files(&[fixture("top_posts.html")])
        .await
        .unwrap();

    let result = run_page(&source, TOP_POSTS_URL, &fast_settings()).await;

    assert!(result.error.is_none());
    assert_eq!(result.scraped_from, TOP_POSTS_URL);
    assert_eq!(result.meta.page, "creator-top-posts");
    assert!(result.profile_stats.is_empty());

    let posts = &result.top_posts;
    assert_eq!(posts.len(), 3, "duplicate and signal-less cards are dropped");

    assert_eq!(
        posts[0].text,
        "We shipped the new build pipeline and cut CI time in half."
    );
    assert_eq!(posts[0].impressions, Some(Metric::Int(12_480)));
    assert_eq!(posts[0].likes, Some(Metric::Int(312)));
    assert_eq!(posts[0].comments, Some(Metric::Int(41)));
    assert_eq!(posts[0].timestamp.as_deref(), Some("2025-03-04T09:15:00Z"));
    assert_eq!(posts[0].media, MediaKind::Image);

    assert_eq!(posts[1].impressions, Some(Metric::Int(8_100)));
    assert_eq!(posts[1].likes, Some(Metric::Int(95)));
    assert!(posts[1].comments.is_none());
    assert_eq!(posts[1].media, MediaKind::Video);

    // The accessible label wins over the abbreviated "1.2K".
    assert_eq!(posts[2].likes, Some(Metric::Int(1_204)));
    assert_eq!(posts[2].comments, Some(Metric::Int(87)));
    assert_eq!(posts[2].media, MediaKind::Text);

    for post in posts {
        assert_eq!(post.source_url, TOP_POSTS_URL);
        assert_eq!(post.scraped_at, result.scraped_at);
    }
}

#[tokio::test(start_paused = true)]
async fn stabilized_post_list_matches_single_pass() {
    let source = SnapshotSequence::new(vec![TOP_POSTS_HTML.to_owned()]);
    let mut settings = fast_settings();
    settings.posts_poll = Some(PollConfig {
        interval: Duration::from_millis(500),
        max_attempts: 15,
        stable_rounds: 2,
    });

    let result = run_page(&source, TOP_POSTS_URL, &settings).await;

    assert_eq!(result.top_posts.len(), 3);
    assert_eq!(source.reads(), 2);
}

#[tokio::test(start_paused = true)]
async fn top_posts_page_caps_unique_cards_at_ten() {
    let cards: String = (1..=12)
        .map(|n| {
            format!(
                "<div><p>Release notes part {n} with details</p><span>{} impressions</span></div>",
                n * 10
            )
        })
        .collect();
    let html = format!("<html><body><main>{cards}</main></body></html>");
    let source = SnapshotSequence::new(vec![html]);

    let result = run_page(&source, TOP_POSTS_URL, &fast_settings()).await;

    assert!(result.error.is_none());
    assert_eq!(result.meta.page, "creator-top-posts");
    let posts = &result.top_posts;
    assert_eq!(posts.len(), 10);
    assert_eq!(posts[0].text, "Release notes part 1 with details");
    assert_eq!(posts[9].impressions, Some(Metric::Int(100)));
    let fingerprints: HashSet<_> = posts.iter().map(fingerprint).collect();
    assert_eq!(fingerprints.len(), posts.len());
}

// -----------------------------------------------------------------------
// Discovery panel
// -----------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn discovery_panel_waits_for_numbers_to_settle() {
    let source = SnapshotSequence::new(vec![
        PANEL_LOADING_HTML.to_owned(),
        PANEL_READY_HTML.to_owned(),
    ]);

    let result = run_page(&source, CONTENT_URL, &fast_settings()).await;

    assert!(result.error.is_none());
    assert_eq!(result.meta.page, "creator-content-impressions");
    assert!(result.top_posts.is_empty());
    assert_eq!(result.profile_stats.impressions, Some(Metric::Int(152_340)));
    assert_eq!(
        result.profile_stats.members_reached,
        Some(Metric::Int(48_210))
    );
    assert_eq!(source.reads(), 3);
}

#[tokio::test(start_paused = true)]
async fn discovery_panel_times_out_with_last_reading() {
    let source = SnapshotSequence::new(vec![PANEL_LOADING_HTML.to_owned()]);
    let mut settings = fast_settings();
    settings.panel_poll = Some(PollConfig {
        interval: Duration::from_millis(800),
        max_attempts: 3,
        stable_rounds: 5,
    });

    let result = run_page(&source, CONTENT_URL, &settings).await;

    assert!(result.error.is_none());
    assert!(result.profile_stats.is_empty());
    assert_eq!(source.reads(), 3);
}

#[tokio::test(start_paused = true)]
async fn discovery_heading_missing_yields_empty_stats() {
    let source = SnapshotSequence::new(vec![TOP_POSTS_HTML.to_owned()]);

    let result = run_page(&source, CONTENT_URL, &fast_settings()).await;

    assert!(result.error.is_none());
    assert!(result.profile_stats.is_empty());
    assert!(result.top_posts.is_empty());
}

// -----------------------------------------------------------------------
// Failures
// -----------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn unreadable_page_is_reported_on_the_result() {
    let result = run_page(&ClosedTab, TOP_POSTS_URL, &fast_settings()).await;

    assert_eq!(result.scraped_from, TOP_POSTS_URL);
    assert!(result.top_posts.is_empty());
    assert!(result.profile_stats.is_empty());
    assert_eq!(
        result.error.as_deref(),
        Some("page source unavailable: tab closed")
    );

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["error"], "page source unavailable: tab closed");
    assert!(json["topPosts"].as_array().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn page_that_never_finishes_loading_is_still_scraped() {
    let source =
        SnapshotSequence::new(vec![TOP_POSTS_HTML.to_owned()]).with_loading_checks(u32::MAX);

    let result = run_page(&source, TOP_POSTS_URL, &fast_settings()).await;

    assert!(result.error.is_none());
    assert_eq!(result.top_posts.len(), 3);
}

// -----------------------------------------------------------------------
// Both pages into one report
// -----------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn both_pages_aggregate_into_one_report() {
    let settings = fast_settings();
    let posts_page = SnapshotSequence::new(vec![TOP_POSTS_HTML.to_owned()]);
    let panel_page = SnapshotSequence::new(vec![PANEL_READY_HTML.to_owned()]);

    let results: Vec<PageScrapeResult> = vec![
        run_page(&panel_page, CONTENT_URL, &settings).await,
        run_page(&posts_page, TOP_POSTS_URL, &settings).await,
    ];
    let report = aggregate(results, MergePolicy::FillGaps);

    assert_eq!(report.posts.len(), 3);
    assert_eq!(report.stats.impressions, Some(Metric::Int(152_340)));

    let summary = report.summary();
    assert_eq!(summary.total_impressions, Metric::Int(152_340));
    assert_eq!(summary.post_count, 3);
    assert_eq!(
        summary.top_post.and_then(|p| p.impressions),
        Some(Metric::Int(12_480))
    );
}
