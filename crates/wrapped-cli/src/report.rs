//! Report output shared by `collect` and `aggregate`.
//!
//! The aggregated model goes to stdout as JSON so it can be piped into the
//! renderer; the human-readable summary goes to stderr.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use wrapped_core::{aggregate, AppConfig, CollectedChunk, MergePolicy, PageScrapeResult, ReportSummary};

const SNIPPET_PREVIEW_CHARS: usize = 60;

/// Accepted shapes of a saved results file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultsFile {
    Many(Vec<PageScrapeResult>),
    One(Box<PageScrapeResult>),
    /// A collection store written by the coordinator.
    Store { collected: Vec<CollectedChunk> },
}

impl ResultsFile {
    fn into_results(self) -> Vec<PageScrapeResult> {
        match self {
            ResultsFile::Many(results) => results,
            ResultsFile::One(result) => vec![*result],
            ResultsFile::Store { collected } => collected.into_iter().map(|c| c.data).collect(),
        }
    }
}

/// Reads every page result from `path`.
pub(crate) async fn read_results(path: &Path) -> anyhow::Result<Vec<PageScrapeResult>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let file: ResultsFile = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a page result file", path.display()))?;
    Ok(file.into_results())
}

/// The `aggregate` command.
///
/// # Errors
///
/// Returns an error if a file cannot be read or parsed.
pub(crate) async fn run_aggregate(config: &AppConfig, files: &[PathBuf]) -> anyhow::Result<()> {
    let mut results = Vec::new();
    for path in files {
        let mut file_results = read_results(path).await?;
        tracing::debug!(path = %path.display(), results = file_results.len(), "read results file");
        results.append(&mut file_results);
    }
    eprintln!("Received {} data chunks", results.len());
    print_report(results, config.merge_policy)
}

/// Aggregates `results`, prints the model as JSON and the summary.
pub(crate) fn print_report(results: Vec<PageScrapeResult>, policy: MergePolicy) -> anyhow::Result<()> {
    let model = aggregate(results, policy);
    let json = serde_json::to_string_pretty(&model).context("serializing report")?;
    println!("{json}");
    for line in summary_lines(&model.summary()) {
        eprintln!("{line}");
    }
    Ok(())
}

pub(crate) fn summary_lines(summary: &ReportSummary<'_>) -> Vec<String> {
    let mut lines = vec![
        format!("Total impressions: {}", summary.total_impressions),
        format!(
            "Members reached: {}",
            summary
                .members_reached
                .map_or_else(|| "n/a".to_owned(), |m| m.to_string())
        ),
        format!("Posts: {}", summary.post_count),
        format!("Total likes: {}", summary.total_likes),
        format!("Total comments: {}", summary.total_comments),
        format!("Avg engagement per post: {:.1}", summary.avg_engagement),
    ];
    if let Some(post) = summary.top_post {
        let preview: String = post.text.chars().take(SNIPPET_PREVIEW_CHARS).collect();
        let ellipsis = if post.text.chars().count() > SNIPPET_PREVIEW_CHARS {
            "..."
        } else {
            ""
        };
        let impressions = post
            .impressions
            .map_or_else(|| "no".to_owned(), |m| m.to_string());
        lines.push(format!(
            "Top post: \"{preview}{ellipsis}\" ({impressions} impressions)"
        ));
    }
    lines
}
