mod collect;
mod coordinator;
mod report;
mod scrape;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wrapped_scraper::{CompiledProfile, DEFAULT_DASHBOARD_ORIGIN};

use crate::collect::PageSpec;

#[derive(Debug, Parser)]
#[command(name = "wrapped")]
#[command(about = "Year-in-review analytics scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape one page from saved snapshots and print its result
    Scrape {
        /// Address the snapshots were taken from; selects the extraction strategy
        #[arg(long)]
        url: String,

        /// HTML snapshots of the page, oldest render first
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,
    },
    /// Scrape several pages concurrently and print the aggregated report
    Collect {
        /// Page to scrape, as URL=FILE[,FILE...]; repeat per page
        #[arg(long = "page", required = true, value_parser = collect::parse_page_spec)]
        pages: Vec<PageSpec>,

        /// Ask for each page's tab to be closed once its data is delivered
        #[arg(long)]
        close_tabs: bool,
    },
    /// Fold saved page results into one report
    Aggregate {
        /// JSON files holding a page result or an array of page results
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the analytics pages to save for a profile
    Urls {
        profile_url: String,

        /// Dashboard origin the pages live under
        #[arg(long, default_value = DEFAULT_DASHBOARD_ORIGIN)]
        origin: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = wrapped_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(env = %config.env, "configuration loaded");

    match cli.command {
        Commands::Scrape { url, snapshots } => {
            let profile = load_selector_profile(&config)?;
            scrape::run_scrape(&config, profile, &url, &snapshots).await
        }
        Commands::Collect { pages, close_tabs } => {
            let profile = load_selector_profile(&config)?;
            collect::run_collect(&config, profile, pages, close_tabs).await
        }
        Commands::Aggregate { files } => report::run_aggregate(&config, &files).await,
        Commands::Urls {
            profile_url,
            origin,
        } => run_urls(&profile_url, &origin),
    }
}

/// Selector profile from `WRAPPED_SELECTORS_PATH`, or the built-in one.
fn load_selector_profile(config: &wrapped_core::AppConfig) -> anyhow::Result<CompiledProfile> {
    match config.selectors_path.as_deref() {
        Some(path) => {
            let profile = wrapped_scraper::load_profile(path)
                .with_context(|| format!("loading selector profile {}", path.display()))?;
            tracing::info!(path = %path.display(), "using selector profile");
            Ok(profile)
        }
        None => Ok(CompiledProfile::builtin()),
    }
}

fn run_urls(profile_url: &str, origin: &str) -> anyhow::Result<()> {
    let username = wrapped_scraper::extract_username(profile_url).with_context(|| {
        format!(
            "could not extract a username from {profile_url}; expected a profile address like {DEFAULT_DASHBOARD_ORIGIN}/in/username/"
        )
    })?;
    tracing::info!(%username, "planning analytics pages");

    let today = chrono::Utc::now().date_naive();
    for url in wrapped_scraper::analytics_urls(origin, today) {
        println!("{url}");
    }
    Ok(())
}
