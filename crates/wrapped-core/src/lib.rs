pub mod aggregate;
pub mod app_config;
pub mod collector;
pub mod config;
pub mod messages;
pub mod metric;
pub mod model;

pub use aggregate::{aggregate, AggregatedReportModel, MergePolicy, ReportSummary};
pub use app_config::{AppConfig, Environment};
pub use collector::{CollectedChunk, Collector, StoreError, TabId};
pub use config::{load_app_config, load_app_config_from_env};
pub use messages::{Message, Response, Status};
pub use metric::Metric;
pub use model::{MediaKind, PageMeta, PageScrapeResult, PostRecord, ProfileStats};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
