//! Per-page pipeline: wait for load, classify, extract, stabilize.
//!
//! A page is read through [`PageSource`], which yields HTML snapshots of its
//! current render. [`run_page`] never fails: whole-page failures end up on
//! the result's `error` field and the partial payload is still returned.

use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use scraper::Html;
use wrapped_core::{AppConfig, PageScrapeResult, PostRecord, ProfileStats};

use crate::classify::classify;
use crate::error::PageError;
use crate::extract::{scan_discovery_panel, scan_posts, PostContext};
use crate::profile::CompiledProfile;
use crate::stability::{poll_until_stable, PollConfig};

/// Document readiness as reported by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// A rendered page that can be inspected repeatedly.
pub trait PageSource: Send + Sync {
    fn ready_state(&self) -> impl Future<Output = Result<ReadyState, PageError>> + Send;

    /// HTML of the page as currently rendered.
    fn snapshot(&self) -> impl Future<Output = Result<String, PageError>> + Send;
}

/// Saved renders of one page, replayed in order.
///
/// Each [`PageSource::snapshot`] call returns the next render; the last one
/// repeats once the sequence is exhausted. This reproduces a panel whose
/// numbers fill in over a few frames.
#[derive(Debug, Default)]
pub struct SnapshotSequence {
    snapshots: Vec<String>,
    cursor: AtomicUsize,
    loading_checks: AtomicU32,
}

impl SnapshotSequence {
    #[must_use]
    pub fn new(snapshots: Vec<String>) -> Self {
        Self {
            snapshots,
            cursor: AtomicUsize::new(0),
            loading_checks: AtomicU32::new(0),
        }
    }

    /// Reports [`ReadyState::Loading`] for the first `checks` readiness checks.
    #[must_use]
    pub fn with_loading_checks(self, checks: u32) -> Self {
        self.loading_checks.store(checks, Ordering::SeqCst);
        self
    }

    /// Reads snapshots from files, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Io`] if a file cannot be read.
    pub async fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, PageError> {
        let mut snapshots = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let html = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| PageError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
            snapshots.push(html);
        }
        Ok(Self::new(snapshots))
    }

    /// Number of snapshots handed out so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl PageSource for SnapshotSequence {
    async fn ready_state(&self) -> Result<ReadyState, PageError> {
        let still_loading = self
            .loading_checks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        Ok(if still_loading {
            ReadyState::Loading
        } else {
            ReadyState::Complete
        })
    }

    async fn snapshot(&self) -> Result<String, PageError> {
        let last = self.snapshots.len().checked_sub(1).ok_or(PageError::NoSnapshot)?;
        let index = self.cursor.fetch_add(1, Ordering::SeqCst).min(last);
        Ok(self.snapshots[index].clone())
    }
}

/// Bounded wait for the document to finish loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadWait {
    pub check_interval: Duration,
    pub max_checks: u32,
    /// Pause after load for late-rendering content.
    pub settle_delay: Duration,
}

impl Default for LoadWait {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_millis(300),
            max_checks: 8,
            settle_delay: Duration::from_millis(600),
        }
    }
}

/// Everything a page run needs besides the page itself.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub profile: CompiledProfile,
    /// Stabilize the post list; `None` extracts once.
    pub posts_poll: Option<PollConfig>,
    /// Stabilize the discovery panel; `None` extracts once.
    pub panel_poll: Option<PollConfig>,
    pub load: LoadWait,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            profile: CompiledProfile::builtin(),
            posts_poll: None,
            panel_poll: Some(PollConfig {
                interval: Duration::from_millis(800),
                ..PollConfig::default()
            }),
            load: LoadWait::default(),
        }
    }
}

impl ScrapeSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig, profile: CompiledProfile) -> Self {
        Self {
            profile,
            posts_poll: None,
            panel_poll: Some(PollConfig {
                interval: config.poll_interval(),
                max_attempts: config.poll_max_attempts,
                stable_rounds: config.poll_stable_rounds,
            }),
            load: LoadWait {
                check_interval: config.load_check_interval(),
                max_checks: config.load_max_checks,
                settle_delay: config.settle_delay(),
            },
        }
    }
}

/// Polls readiness until complete or out of checks, then settles.
///
/// Running out of checks is not an error: extraction proceeds on whatever
/// has rendered.
///
/// # Errors
///
/// Returns the source's error if readiness cannot be read.
pub async fn wait_for_page_load<S: PageSource>(
    source: &S,
    load: &LoadWait,
) -> Result<(), PageError> {
    let mut complete = false;
    for check in 0..load.max_checks {
        if source.ready_state().await? == ReadyState::Complete {
            complete = true;
            break;
        }
        if check + 1 < load.max_checks {
            tokio::time::sleep(load.check_interval).await;
        }
    }
    if !complete {
        tracing::warn!(
            max_checks = load.max_checks,
            "page never reported complete; extracting anyway"
        );
    }
    tokio::time::sleep(load.settle_delay).await;
    Ok(())
}

/// Runs the full pipeline for the page at `url`.
pub async fn run_page<S: PageSource>(
    source: &S,
    url: &str,
    settings: &ScrapeSettings,
) -> PageScrapeResult {
    let load = wait_for_page_load(source, &settings.load).await;

    let kind = classify(url, &settings.profile.profile().classifier);
    let ctx = PostContext {
        source_url: url.to_owned(),
        scraped_at: Utc::now(),
    };
    let mut result = PageScrapeResult::empty(url, ctx.scraped_at);
    result.meta.page = kind.meta_label().to_owned();
    tracing::info!(url, page = kind.meta_label(), "scraping page");

    let outcome = async {
        load?;
        if kind.scans_posts() {
            result.top_posts = scrape_posts(source, &ctx, settings).await?;
        } else {
            result.profile_stats = scrape_panel(source, settings).await?;
        }
        Ok::<(), PageError>(())
    }
    .await;

    match outcome {
        Ok(()) => tracing::info!(
            url,
            posts = result.top_posts.len(),
            has_stats = !result.profile_stats.is_empty(),
            "page scraped"
        ),
        Err(e) => {
            tracing::error!(url, error = %e, "page scrape failed");
            result.error = Some(e.to_string());
        }
    }
    result
}

async fn scrape_posts<S: PageSource>(
    source: &S,
    ctx: &PostContext,
    settings: &ScrapeSettings,
) -> Result<Vec<PostRecord>, PageError> {
    let profile = &settings.profile;
    let read = move || async move {
        let html = source.snapshot().await?;
        posts_from_html(&html, ctx, profile)
    };
    match &settings.posts_poll {
        Some(poll) => Ok(poll_until_stable(poll, read).await?.value),
        None => read().await,
    }
}

async fn scrape_panel<S: PageSource>(
    source: &S,
    settings: &ScrapeSettings,
) -> Result<ProfileStats, PageError> {
    let profile = &settings.profile;
    let read = move || async move {
        let html = source.snapshot().await?;
        panel_from_html(&html, profile)
    };
    match &settings.panel_poll {
        Some(poll) => Ok(poll_until_stable(poll, read).await?.value),
        None => read().await,
    }
}

fn posts_from_html(
    html: &str,
    ctx: &PostContext,
    profile: &CompiledProfile,
) -> Result<Vec<PostRecord>, PageError> {
    let doc = Html::parse_document(html);
    Ok(scan_posts(&doc, ctx, profile)?)
}

fn panel_from_html(html: &str, profile: &CompiledProfile) -> Result<ProfileStats, PageError> {
    let doc = Html::parse_document(html);
    Ok(scan_discovery_panel(&doc, profile)?)
}
