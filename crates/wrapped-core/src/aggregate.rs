//! Folding many page results into one report model.
//!
//! Results arrive from independent page tasks in no particular order. Posts
//! are concatenated in encounter order; nothing is deduplicated across pages.
//! Stats are merged field by field according to a [`MergePolicy`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::metric::Metric;
use crate::model::{PageScrapeResult, PostRecord, ProfileStats};
use crate::ConfigError;

/// How a later result's stats combine with what has been merged so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// A later non-null field overwrites; a null never erases a value.
    #[default]
    FillGaps,
    /// Later fields always overwrite, nulls included.
    Overwrite,
}

impl FromStr for MergePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fill-gaps" => Ok(MergePolicy::FillGaps),
            "overwrite" => Ok(MergePolicy::Overwrite),
            other => Err(ConfigError::InvalidEnvVar {
                var: "WRAPPED_MERGE_POLICY".to_string(),
                reason: format!("unknown merge policy '{other}'; expected fill-gaps or overwrite"),
            }),
        }
    }
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergePolicy::FillGaps => write!(f, "fill-gaps"),
            MergePolicy::Overwrite => write!(f, "overwrite"),
        }
    }
}

impl ProfileStats {
    /// Merges `newer` into `self`.
    pub fn merge_from(&mut self, newer: &ProfileStats, policy: MergePolicy) {
        match policy {
            MergePolicy::FillGaps => {
                if newer.impressions.is_some() {
                    self.impressions = newer.impressions;
                }
                if newer.members_reached.is_some() {
                    self.members_reached = newer.members_reached;
                }
            }
            MergePolicy::Overwrite => {
                self.impressions = newer.impressions;
                self.members_reached = newer.members_reached;
            }
        }
    }
}

/// Input model for the report renderer.
///
/// Deserialization accepts both the current `posts`/`stats` names and the
/// legacy `topPosts`/`profileStats` names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReportModel {
    #[serde(default, alias = "topPosts")]
    pub posts: Vec<PostRecord>,

    #[serde(default, alias = "profileStats")]
    pub stats: ProfileStats,
}

/// Folds `results` into one report model.
pub fn aggregate<I>(results: I, policy: MergePolicy) -> AggregatedReportModel
where
    I: IntoIterator<Item = PageScrapeResult>,
{
    let mut model = AggregatedReportModel::default();
    let mut chunks = 0usize;

    for result in results {
        chunks += 1;
        if let Some(err) = result.error.as_deref() {
            tracing::debug!(url = %result.scraped_from, error = %err, "aggregating partial page result");
        }
        model.posts.extend(result.top_posts);
        model.stats.merge_from(&result.profile_stats, policy);
    }

    tracing::debug!(
        chunks,
        posts = model.posts.len(),
        %policy,
        "aggregated page results"
    );
    model
}

/// Headline numbers derived from a report model.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary<'a> {
    /// Profile impressions, or the sum of post impressions when the profile
    /// total was not scraped.
    pub total_impressions: Metric,
    pub members_reached: Option<Metric>,
    pub post_count: usize,
    pub total_likes: Metric,
    pub total_comments: Metric,
    /// `(likes + comments) / post_count`, or 0 without posts.
    pub avg_engagement: f64,
    /// Post with the most impressions; the earliest wins a tie.
    pub top_post: Option<&'a PostRecord>,
}

impl AggregatedReportModel {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> ReportSummary<'_> {
        let total_of = |field: fn(&PostRecord) -> Option<Metric>| {
            self.posts
                .iter()
                .filter_map(field)
                .fold(Metric::Int(0), Metric::add)
        };
        let total_impressions = self
            .stats
            .impressions
            .unwrap_or_else(|| total_of(|p| p.impressions));
        let total_likes = total_of(|p| p.likes);
        let total_comments = total_of(|p| p.comments);
        let avg_engagement = if self.posts.is_empty() {
            0.0
        } else {
            total_likes.add(total_comments).as_f64() / self.posts.len() as f64
        };

        let mut top_post: Option<&PostRecord> = None;
        for post in &self.posts {
            let score = post.impressions.map_or(0.0, Metric::as_f64);
            let best = top_post.and_then(|p| p.impressions).map_or(0.0, Metric::as_f64);
            if top_post.is_none() || score > best {
                top_post = Some(post);
            }
        }

        ReportSummary {
            total_impressions,
            members_reached: self.stats.members_reached,
            post_count: self.posts.len(),
            total_likes,
            total_comments,
            avg_engagement,
            top_post,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::model::{MediaKind, PageMeta};

    fn at() -> DateTime<Utc> {
        "2025-12-01T10:00:00Z".parse().unwrap()
    }

    fn post(text: &str, impressions: Option<u64>) -> PostRecord {
        PostRecord {
            source_url: "https://example.com/analytics/creator/top-posts/".to_owned(),
            scraped_at: at(),
            text: text.to_owned(),
            impressions: impressions.map(Metric::Int),
            likes: None,
            comments: None,
            timestamp: None,
            media: MediaKind::Text,
        }
    }

    fn result(posts: Vec<PostRecord>, stats: ProfileStats) -> PageScrapeResult {
        PageScrapeResult {
            scraped_from: "https://example.com".to_owned(),
            scraped_at: at(),
            top_posts: posts,
            profile_stats: stats,
            meta: PageMeta::default(),
            error: None,
        }
    }

    fn stats(impressions: Option<u64>, members: Option<u64>) -> ProfileStats {
        ProfileStats {
            impressions: impressions.map(Metric::Int),
            members_reached: members.map(Metric::Int),
        }
    }

    #[test]
    fn fill_gaps_keeps_earlier_values_when_later_is_null() {
        let model = aggregate(
            vec![
                result(vec![], stats(Some(10), None)),
                result(vec![], stats(None, Some(5))),
            ],
            MergePolicy::FillGaps,
        );
        assert_eq!(model.stats, stats(Some(10), Some(5)));
    }

    #[test]
    fn fill_gaps_lets_newer_values_win() {
        let model = aggregate(
            vec![
                result(vec![], stats(Some(10), Some(1))),
                result(vec![], stats(Some(12), None)),
            ],
            MergePolicy::FillGaps,
        );
        assert_eq!(model.stats, stats(Some(12), Some(1)));
    }

    #[test]
    fn overwrite_policy_lets_nulls_erase() {
        let model = aggregate(
            vec![
                result(vec![], stats(Some(10), None)),
                result(vec![], stats(None, Some(5))),
            ],
            MergePolicy::Overwrite,
        );
        assert_eq!(model.stats, stats(None, Some(5)));
    }

    #[test]
    fn posts_are_concatenated_in_encounter_order() {
        let first = vec![post("a", Some(1)), post("b", Some(2)), post("c", Some(3))];
        let second = vec![post("d", Some(4)), post("a", Some(1))];
        let model = aggregate(
            vec![
                result(first, ProfileStats::default()),
                result(second, ProfileStats::default()),
            ],
            MergePolicy::FillGaps,
        );
        let texts: Vec<&str> = model.posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["a", "b", "c", "d", "a"]);
    }

    #[test]
    fn empty_input_yields_empty_model() {
        let model = aggregate(Vec::new(), MergePolicy::FillGaps);
        assert_eq!(model, AggregatedReportModel::default());
    }

    #[test]
    fn report_model_accepts_legacy_field_names() {
        let raw = r#"{ "topPosts": [], "profileStats": { "impressions": 7 } }"#;
        let model: AggregatedReportModel = serde_json::from_str(raw).unwrap();
        assert_eq!(model.stats.impressions, Some(Metric::Int(7)));
    }

    #[test]
    fn merge_policy_parses_known_names() {
        assert_eq!("fill-gaps".parse::<MergePolicy>().unwrap(), MergePolicy::FillGaps);
        assert_eq!("overwrite".parse::<MergePolicy>().unwrap(), MergePolicy::Overwrite);
        assert!("last-wins".parse::<MergePolicy>().is_err());
    }

    #[test]
    fn summary_prefers_profile_impressions() {
        let model = AggregatedReportModel {
            posts: vec![post("a", Some(5))],
            stats: stats(Some(900), Some(40)),
        };
        let summary = model.summary();
        assert_eq!(summary.total_impressions, Metric::Int(900));
        assert_eq!(summary.members_reached, Some(Metric::Int(40)));
    }

    #[test]
    fn summary_sums_post_impressions_without_profile_total() {
        let model = AggregatedReportModel {
            posts: vec![post("a", Some(5)), post("b", None), post("c", Some(7))],
            stats: ProfileStats::default(),
        };
        assert_eq!(model.summary().total_impressions, Metric::Int(12));
    }

    #[test]
    fn summary_top_post_is_first_of_the_highest() {
        let model = AggregatedReportModel {
            posts: vec![post("a", Some(5)), post("b", Some(9)), post("c", Some(9))],
            stats: ProfileStats::default(),
        };
        let summary = model.summary();
        assert_eq!(summary.top_post.map(|p| p.text.as_str()), Some("b"));
        assert_eq!(summary.post_count, 3);
    }

    #[test]
    fn summary_of_empty_model_has_no_top_post() {
        let model = AggregatedReportModel::default();
        let summary = model.summary();
        assert!(summary.top_post.is_none());
        assert_eq!(summary.total_impressions, Metric::Int(0));
        assert_eq!(summary.total_likes, Metric::Int(0));
        assert_eq!(summary.total_comments, Metric::Int(0));
        assert!(summary.avg_engagement.abs() < f64::EPSILON);
    }

    #[test]
    fn summary_totals_engagement_across_posts() {
        let mut a = post("a", Some(5));
        a.likes = Some(Metric::Int(10));
        a.comments = Some(Metric::Int(3));
        let mut b = post("b", Some(9));
        b.likes = Some(Metric::Int(4));
        let c = post("c", None);
        let model = AggregatedReportModel {
            posts: vec![a, b, c],
            stats: ProfileStats::default(),
        };

        let summary = model.summary();
        assert_eq!(summary.total_likes, Metric::Int(14));
        assert_eq!(summary.total_comments, Metric::Int(3));
        assert!((summary.avg_engagement - 17.0 / 3.0).abs() < 1e-9);
    }
}
