pub mod classify;
pub mod dedup;
pub mod dom;
pub mod error;
pub mod extract;
pub mod number;
pub mod page;
pub mod profile;
pub mod stability;
pub mod urls;

pub use classify::{classify, PageKind};
pub use dedup::{dedup_posts, fingerprint};
pub use dom::{CardLike, ElementView};
pub use error::{DomError, ExtractError, PageError, ProfileError};
pub use extract::{
    collect_posts, extract_metric, extract_post, scan_discovery_panel, scan_posts, LabeledMetric,
    PostContext, RawMetricCandidate,
};
pub use number::{first_numeric_run, parse_number};
pub use page::{
    run_page, wait_for_page_load, LoadWait, PageSource, ReadyState, ScrapeSettings,
    SnapshotSequence,
};
pub use profile::{load_profile, parse_profile, CompiledProfile, SelectorProfile};
pub use stability::{poll_until_stable, PollConfig, PollOutcome, PollState, Stabilizer};
pub use urls::{analytics_urls, extract_username, DEFAULT_DASHBOARD_ORIGIN};
