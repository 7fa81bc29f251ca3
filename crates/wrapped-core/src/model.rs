//! Records produced by one page visit.
//!
//! ## Wire shape
//!
//! Field names are camelCase on the wire (`scrapedFrom`, `topPosts`,
//! `membersReached`). Absent metrics are `null`, never `0`: a card that shows
//! no comment count is different from a card that shows "0 comments".
//!
//! Older payloads sent `profileStats: {}` with the keys omitted entirely, so
//! every optional field carries `#[serde(default)]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metric::Metric;

/// Media attached to a post card. Video wins over image when a card has both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Text,
}

/// One content item discovered on a top-posts page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    /// Address of the page the card was found on.
    pub source_url: String,

    /// Start of the scrape pass that produced this record.
    pub scraped_at: DateTime<Utc>,

    /// Text snippet, bounded to a few hundred characters.
    pub text: String,

    #[serde(default)]
    pub impressions: Option<Metric>,

    #[serde(default)]
    pub likes: Option<Metric>,

    #[serde(default)]
    pub comments: Option<Metric>,

    /// Publish time from a machine-readable `datetime` attribute, verbatim.
    #[serde(default)]
    pub timestamp: Option<String>,

    pub media: MediaKind,
}

impl PostRecord {
    /// `true` when at least one engagement metric was found.
    #[must_use]
    pub fn has_signal(&self) -> bool {
        self.impressions.is_some() || self.likes.is_some() || self.comments.is_some()
    }
}

/// Aggregate counters for a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    #[serde(default)]
    pub impressions: Option<Metric>,

    #[serde(default)]
    pub members_reached: Option<Metric>,
}

impl ProfileStats {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.impressions.is_none() && self.members_reached.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Strategy label, e.g. `creator-top-posts`.
    #[serde(default)]
    pub page: String,
}

/// Complete extraction output of one page visit; the unit sent to the
/// coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageScrapeResult {
    pub scraped_from: String,
    pub scraped_at: DateTime<Utc>,

    #[serde(default)]
    pub top_posts: Vec<PostRecord>,

    #[serde(default)]
    pub profile_stats: ProfileStats,

    #[serde(default)]
    pub meta: PageMeta,

    /// Set when the page pipeline failed part-way; the partial payload is
    /// still delivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageScrapeResult {
    /// An empty result for `url`, stamped with `scraped_at`.
    #[must_use]
    pub fn empty(url: &str, scraped_at: DateTime<Utc>) -> Self {
        Self {
            scraped_from: url.to_owned(),
            scraped_at,
            top_posts: Vec::new(),
            profile_stats: ProfileStats::default(),
            meta: PageMeta::default(),
            error: None,
        }
    }
}
