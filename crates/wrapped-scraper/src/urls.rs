//! Dashboard addresses for a year-in-review run.

use chrono::{Months, NaiveDate};
use url::Url;

pub const DEFAULT_DASHBOARD_ORIGIN: &str = "https://www.linkedin.com";

const TIME_RANGE: &str = "past_365_days";

/// Username from a profile URL: the segment after `/in/`, otherwise the
/// first path segment. `None` for unparseable URLs or an empty path.
#[must_use]
pub fn extract_username(profile_url: &str) -> Option<String> {
    let url = Url::parse(profile_url).ok()?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let first = segments.next()?;
    if first == "in" {
        if let Some(name) = segments.next() {
            return Some(name.to_owned());
        }
    }
    Some(first.to_owned())
}

/// The pages to open, in order: the top-posts list and the content
/// impressions panel covering the year up to `today`.
#[must_use]
pub fn analytics_urls(origin: &str, today: NaiveDate) -> Vec<String> {
    let origin = origin.trim_end_matches('/');
    let start = today.checked_sub_months(Months::new(12)).unwrap_or(today);
    let end = today.format("%Y-%m-%d");
    let start = start.format("%Y-%m-%d");

    vec![
        format!("{origin}/analytics/creator/top-posts/?timeRange={TIME_RANGE}"),
        format!(
            "{origin}/analytics/creator/content/?endDate={end}&metricType=IMPRESSIONS&startDate={start}&timeRange={TIME_RANGE}"
        ),
    ]
}
