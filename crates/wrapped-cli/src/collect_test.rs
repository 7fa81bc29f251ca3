use std::path::Path;

use wrapped_core::{Environment, MergePolicy, Metric};

use super::*;

const TOP_POSTS_URL: &str =
    "https://www.linkedin.com/analytics/creator/top-posts/?timeRange=past_365_days";
const CONTENT_URL: &str =
    "https://www.linkedin.com/analytics/creator/content/?metricType=IMPRESSIONS&timeRange=past_365_days";

const POSTS_HTML: &str = r#"<html><body><main><ul>
<li><div><p>Notes from the platform migration retro.</p><span>4,200 impressions</span></div></li>
<li><div><p>Why we moved our queue to a single writer.</p><span>950 impressions</span></div></li>
</ul></main></body></html>"#;

const PANEL_HTML: &str = r#"<html><body><section><h2>Discovery</h2><ul>
<li><p class="text-body-medium-bold">20,000</p><p class="member-analytics-addon-list-item__description">Impressions</p></li>
<li><p class="text-body-medium-bold">7,500</p><p class="member-analytics-addon-list-item__description">Members reached</p></li>
</ul></section></body></html>"#;

fn test_config(store_path: Option<PathBuf>) -> AppConfig {
    AppConfig {
        env: Environment::Test,
        log_level: "debug".to_string(),
        selectors_path: None,
        store_path,
        merge_policy: MergePolicy::FillGaps,
        poll_interval_ms: 1,
        poll_max_attempts: 5,
        poll_stable_rounds: 2,
        load_check_interval_ms: 1,
        load_max_checks: 2,
        settle_delay_ms: 0,
    }
}

fn write_page(dir: &Path, name: &str, html: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, html).unwrap();
    path
}

// -----------------------------------------------------------------------
// parse_page_spec
// -----------------------------------------------------------------------

#[test]
fn page_spec_keeps_query_string() {
    let spec = parse_page_spec(&format!("{TOP_POSTS_URL}=posts.html")).unwrap();
    assert_eq!(spec.url, TOP_POSTS_URL);
    assert_eq!(spec.snapshots, vec![PathBuf::from("posts.html")]);
}

#[test]
fn page_spec_with_several_snapshots() {
    let spec = parse_page_spec("https://a.test/content=first.html, second.html,").unwrap();
    assert_eq!(spec.url, "https://a.test/content");
    assert_eq!(
        spec.snapshots,
        vec![PathBuf::from("first.html"), PathBuf::from("second.html")]
    );
}

#[test]
fn page_spec_without_separator_is_rejected() {
    let err = parse_page_spec("https://a.test/page.html").unwrap_err();
    assert!(err.contains("URL=FILE"));
}

#[test]
fn page_spec_without_files_is_rejected() {
    assert!(parse_page_spec("https://a.test/?x=").is_err());
    assert!(parse_page_spec("=page.html").is_err());
}

// -----------------------------------------------------------------------
// collect_session
// -----------------------------------------------------------------------

#[tokio::test]
async fn session_collects_every_page() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![
        PageSpec {
            url: TOP_POSTS_URL.to_owned(),
            snapshots: vec![write_page(dir.path(), "posts.html", POSTS_HTML)],
        },
        PageSpec {
            url: CONTENT_URL.to_owned(),
            snapshots: vec![write_page(dir.path(), "panel.html", PANEL_HTML)],
        },
    ];

    let collected = collect_session(&test_config(None), CompiledProfile::builtin(), pages, true)
        .await
        .unwrap();

    assert_eq!(collected.len(), 2);
    assert!(collected.iter().all(|r| r.error.is_none()));

    let model = wrapped_core::aggregate(collected, MergePolicy::FillGaps);
    assert_eq!(model.posts.len(), 2);
    assert_eq!(model.stats.impressions, Some(Metric::Int(20_000)));
    assert_eq!(model.stats.members_reached, Some(Metric::Int(7_500)));
}

#[tokio::test]
async fn missing_snapshot_still_delivers_a_result() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![PageSpec {
        url: TOP_POSTS_URL.to_owned(),
        snapshots: vec![dir.path().join("never-saved.html")],
    }];

    let collected = collect_session(&test_config(None), CompiledProfile::builtin(), pages, false)
        .await
        .unwrap();

    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].scraped_from, TOP_POSTS_URL);
    assert!(collected[0].top_posts.is_empty());
    assert!(collected[0]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("never-saved.html")));
}

#[tokio::test]
async fn session_is_mirrored_to_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("collected.json");
    let pages = vec![PageSpec {
        url: TOP_POSTS_URL.to_owned(),
        snapshots: vec![write_page(dir.path(), "posts.html", POSTS_HTML)],
    }];

    let collected = collect_session(
        &test_config(Some(store.clone())),
        CompiledProfile::builtin(),
        pages,
        false,
    )
    .await
    .unwrap();

    let stored = crate::report::read_results(&store).await.unwrap();
    assert_eq!(stored, collected);
}
