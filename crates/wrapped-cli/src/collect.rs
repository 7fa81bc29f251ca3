//! The `collect` command: a full review session over several pages.
//!
//! Mirrors a browser session: clear the previous collection, run every page
//! in its own task, let each task deliver its result exactly once, then ask
//! the coordinator for everything collected and fold it into a report.
//! A page that fails still delivers a result carrying its `error`.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use wrapped_core::{AppConfig, Collector, Message, PageScrapeResult, TabId};
use wrapped_scraper::{run_page, CompiledProfile, ScrapeSettings, SnapshotSequence};

use crate::coordinator::{spawn_coordinator, CoordinatorHandle};
use crate::report;

/// One page of a session: its address and saved renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageSpec {
    pub url: String,
    pub snapshots: Vec<PathBuf>,
}

/// Parses `URL=FILE[,FILE...]`.
///
/// The split is on the last `=`, so query strings in the URL are kept.
pub(crate) fn parse_page_spec(s: &str) -> Result<PageSpec, String> {
    let (url, files) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected URL=FILE[,FILE...], got '{s}'"))?;
    if url.trim().is_empty() {
        return Err(format!("missing page URL in '{s}'"));
    }
    let snapshots: Vec<PathBuf> = files
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(PathBuf::from)
        .collect();
    if snapshots.is_empty() {
        return Err(format!("no snapshot files given for '{url}'"));
    }
    Ok(PageSpec {
        url: url.trim().to_owned(),
        snapshots,
    })
}

/// Runs a collection session over `pages` and prints the report.
///
/// # Errors
///
/// Returns an error if the coordinator stops before the session completes
/// or the report cannot be serialized. Per-page failures are recorded on
/// that page's result instead.
pub(crate) async fn run_collect(
    config: &AppConfig,
    profile: CompiledProfile,
    pages: Vec<PageSpec>,
    close_tabs: bool,
) -> anyhow::Result<()> {
    let page_count = pages.len();
    let collected = collect_session(config, profile, pages, close_tabs).await?;

    eprintln!("Received {} data chunks", collected.len());
    if collected.is_empty() {
        eprintln!(
            "No data was collected. Verify that you are logged in and that the saved pages show your analytics."
        );
        return Ok(());
    }
    let failed = collected.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        tracing::warn!(failed, pages = page_count, "some pages failed to scrape");
    }

    report::print_report(collected, config.merge_policy)
}

/// Clears the collection, scrapes every page concurrently and returns what
/// the coordinator collected.
pub(crate) async fn collect_session(
    config: &AppConfig,
    profile: CompiledProfile,
    pages: Vec<PageSpec>,
    close_tabs: bool,
) -> anyhow::Result<Vec<PageScrapeResult>> {
    let collector = match config.store_path.as_deref() {
        Some(path) => Collector::with_store(path),
        None => Collector::new(),
    };
    let (handle, coordinator) = spawn_coordinator(collector);

    handle.send(None, Message::ClearCollected).await?;

    let settings = Arc::new(ScrapeSettings::from_config(config, profile));
    tracing::info!(pages = pages.len(), "starting collection session");

    let tasks: Vec<_> = pages
        .into_iter()
        .zip(1u64..)
        .map(|(page, n)| {
            let handle = handle.clone();
            let settings = Arc::clone(&settings);
            tokio::spawn(async move { run_tab(TabId(n), page, &settings, &handle, close_tabs).await })
        })
        .collect();

    for joined in futures::future::join_all(tasks).await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "page task panicked");
        }
    }

    let response = handle.send(None, Message::GetCollected).await?;
    drop(handle);

    let mut collector = coordinator.await??;
    for tab in collector.take_close_requests() {
        tracing::info!(%tab, "closing tab");
    }

    Ok(response.collected.unwrap_or_default())
}

/// Scrapes one page and delivers its result. Delivery is attempted once.
async fn run_tab(
    tab: TabId,
    page: PageSpec,
    settings: &ScrapeSettings,
    handle: &CoordinatorHandle,
    close_tab: bool,
) {
    let result = scrape_tab(tab, &page, settings).await;
    let message = Message::ScrapedData {
        data: result,
        from_url: page.url.clone(),
        close_tab,
    };
    if let Err(e) = handle.send(Some(tab), message).await {
        tracing::error!(%tab, url = %page.url, error = %e, "failed to deliver page result");
    }
}

async fn scrape_tab(tab: TabId, page: &PageSpec, settings: &ScrapeSettings) -> PageScrapeResult {
    match SnapshotSequence::from_files(&page.snapshots).await {
        Ok(source) => {
            tracing::debug!(%tab, url = %page.url, snapshots = page.snapshots.len(), "page opened");
            run_page(&source, &page.url, settings).await
        }
        Err(e) => {
            tracing::error!(%tab, url = %page.url, error = %e, "page failed to load");
            let mut result = PageScrapeResult::empty(&page.url, Utc::now());
            result.error = Some(e.to_string());
            result
        }
    }
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
