use std::path::PathBuf;
use std::time::Duration;

use crate::aggregate::MergePolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// YAML selector profile; `None` uses the built-in profile.
    pub selectors_path: Option<PathBuf>,
    /// JSON mirror of the collected results; `None` keeps them in memory only.
    pub store_path: Option<PathBuf>,
    pub merge_policy: MergePolicy,
    pub poll_interval_ms: u64,
    pub poll_max_attempts: u32,
    pub poll_stable_rounds: u32,
    pub load_check_interval_ms: u64,
    pub load_max_checks: u32,
    pub settle_delay_ms: u64,
}

impl AppConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn load_check_interval(&self) -> Duration {
        Duration::from_millis(self.load_check_interval_ms)
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
