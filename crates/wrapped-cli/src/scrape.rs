use std::path::PathBuf;

use anyhow::Context;
use wrapped_core::AppConfig;
use wrapped_scraper::{run_page, CompiledProfile, ScrapeSettings, SnapshotSequence};

/// The `scrape` command: one page, printed as a page result.
///
/// # Errors
///
/// Returns an error if a snapshot cannot be read. Extraction failures are
/// reported on the printed result's `error` field.
pub(crate) async fn run_scrape(
    config: &AppConfig,
    profile: CompiledProfile,
    url: &str,
    snapshots: &[PathBuf],
) -> anyhow::Result<()> {
    let source = SnapshotSequence::from_files(snapshots)
        .await
        .context("opening page snapshots")?;
    let settings = ScrapeSettings::from_config(config, profile);

    let result = run_page(&source, url, &settings).await;
    if let Some(err) = &result.error {
        tracing::warn!(url, error = %err, "page scraped with errors");
    }

    let json = serde_json::to_string_pretty(&result).context("serializing page result")?;
    println!("{json}");
    Ok(())
}
