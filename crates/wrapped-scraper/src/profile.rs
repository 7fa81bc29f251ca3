//! Selector profile: the swappable configuration that ties extraction to a
//! dashboard's markup.
//!
//! Dashboard class names change without notice. Everything markup-specific
//! lives here so adapting to a redesign means editing YAML, not code. Any
//! field left out of a YAML override keeps its built-in default.
//!
//! ```yaml
//! posts:
//!   max_posts: 10
//!   likes:
//!     selectors: ["button[aria-label*=\"reaction\"]"]
//!     label_attributes: ["aria-label"]
//! panel:
//!   heading_text: discovery
//! ```

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dom::compile;
use crate::error::ProfileError;

/// An ordered list of places a number may be found.
///
/// Selectors are tried in order. For the first element a selector matches,
/// each label attribute is tried in order, then the element's visible text.
/// The first probe that yields a number wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProbes {
    pub selectors: Vec<String>,
    #[serde(default)]
    pub label_attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeProbe {
    pub selector: String,
    pub attribute: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// URL fragment identifying the top-posts list.
    pub top_posts_pattern: String,
    /// URL fragment identifying the aggregate discovery panel.
    pub discovery_panel_pattern: String,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            top_posts_pattern: "/analytics/creator/top-posts".to_owned(),
            discovery_panel_pattern: "/analytics/creator/content".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostSelectors {
    /// Elements considered as post cards.
    pub card_selector: String,
    /// A candidate card's lowercased text must contain one of these.
    pub card_keywords: Vec<String>,
    /// Candidates considered per page scan.
    pub candidate_scan_limit: usize,
    /// Accepted records after which the candidate pool is closed.
    pub max_posts: usize,
    /// Cards with shorter text are skipped.
    pub min_text_len: usize,
    pub snippet_selector: String,
    pub snippet_max_chars: usize,
    /// First capture group is the impressions count.
    pub impressions_pattern: String,
    pub likes: FieldProbes,
    pub comments: FieldProbes,
    pub timestamp: AttributeProbe,
    pub video_selector: String,
    pub image_selector: String,
    /// Drop cards with no impressions, likes or comments.
    pub require_signal: bool,
}

impl Default for PostSelectors {
    fn default() -> Self {
        Self {
            card_selector: "div".to_owned(),
            card_keywords: vec![
                "impressions".to_owned(),
                "views".to_owned(),
                "engagement".to_owned(),
            ],
            candidate_scan_limit: 80,
            max_posts: 10,
            min_text_len: 10,
            snippet_selector: "p, span".to_owned(),
            snippet_max_chars: 500,
            impressions_pattern: r"(?i)([\d,\.]+)\s*(impressions|views)".to_owned(),
            likes: FieldProbes {
                selectors: vec![
                    "button[data-reaction-details]".to_owned(),
                    r#"button[aria-label*="reaction"]"#.to_owned(),
                    ".social-details-social-counts__count-value".to_owned(),
                ],
                label_attributes: vec!["aria-label".to_owned()],
            },
            comments: FieldProbes {
                selectors: vec![
                    r#"button[aria-label*="comment"]"#.to_owned(),
                    ".comment-count".to_owned(),
                    "[data-test-comments-count]".to_owned(),
                ],
                label_attributes: vec!["aria-label".to_owned()],
            },
            timestamp: AttributeProbe {
                selector: "time".to_owned(),
                attribute: "datetime".to_owned(),
            },
            video_selector: "video".to_owned(),
            image_selector: "img".to_owned(),
            require_signal: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSelectors {
    pub heading_selector: String,
    /// Exact heading text, compared trimmed and case-insensitively.
    pub heading_text: String,
    /// Closest ancestor of the heading that holds the metric items.
    pub container_selector: String,
    pub item_selector: String,
    pub value: FieldProbes,
    pub label_selectors: Vec<String>,
    pub impressions_labels: Vec<String>,
    pub members_reached_labels: Vec<String>,
    /// Unlabeled first item is impressions, unlabeled second is members reached.
    pub positional_fallback: bool,
}

impl Default for PanelSelectors {
    fn default() -> Self {
        Self {
            heading_selector: "h2".to_owned(),
            heading_text: "discovery".to_owned(),
            container_selector: "section".to_owned(),
            item_selector: "li".to_owned(),
            value: FieldProbes {
                selectors: vec![
                    "p.text-body-medium-bold".to_owned(),
                    "p.text-heading-large".to_owned(),
                    "p[class*='text-heading']".to_owned(),
                    "p[class*='bold']".to_owned(),
                ],
                label_attributes: Vec::new(),
            },
            label_selectors: vec![
                "p.member-analytics-addon-list-item__description".to_owned(),
                "p[class*='description']".to_owned(),
            ],
            impressions_labels: vec!["impression".to_owned()],
            members_reached_labels: vec!["members reached".to_owned(), "reached".to_owned()],
            positional_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorProfile {
    pub classifier: ClassifierRules,
    pub posts: PostSelectors,
    pub panel: PanelSelectors,
}

/// A validated profile with its regex compiled once.
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    profile: SelectorProfile,
    impressions_re: Regex,
}

impl CompiledProfile {
    /// Validates `profile` and compiles its patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Validation`] when a selector or pattern does
    /// not compile or a limit is zero.
    pub fn new(profile: SelectorProfile) -> Result<Self, ProfileError> {
        validate_profile(&profile)?;
        let impressions_re = Regex::new(&profile.posts.impressions_pattern).map_err(|e| {
            ProfileError::Validation(format!("impressions_pattern does not compile: {e}"))
        })?;
        if impressions_re.captures_len() < 2 {
            return Err(ProfileError::Validation(
                "impressions_pattern needs a capture group for the number".to_string(),
            ));
        }
        Ok(Self {
            profile,
            impressions_re,
        })
    }

    /// The built-in profile.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            impressions_re: Regex::new(&PostSelectors::default().impressions_pattern)
                .expect("built-in impressions pattern is valid"),
            profile: SelectorProfile::default(),
        }
    }

    #[must_use]
    pub fn profile(&self) -> &SelectorProfile {
        &self.profile
    }

    #[must_use]
    pub fn impressions_re(&self) -> &Regex {
        &self.impressions_re
    }
}

/// Load and validate a selector profile from a YAML file.
///
/// # Errors
///
/// Returns `ProfileError` if the file cannot be read, parsed, or fails validation.
pub fn load_profile(path: &Path) -> Result<CompiledProfile, ProfileError> {
    let content = std::fs::read_to_string(path).map_err(|e| ProfileError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_profile(&content)
}

/// Parse and validate a selector profile from YAML text.
///
/// # Errors
///
/// Returns `ProfileError` if the YAML is malformed or fails validation.
pub fn parse_profile(yaml: &str) -> Result<CompiledProfile, ProfileError> {
    let profile: SelectorProfile = serde_yaml::from_str(yaml)?;
    CompiledProfile::new(profile)
}

fn validate_profile(profile: &SelectorProfile) -> Result<(), ProfileError> {
    let posts = &profile.posts;
    let panel = &profile.panel;

    if posts.max_posts == 0 {
        return Err(ProfileError::Validation(
            "posts.max_posts must be at least 1".to_string(),
        ));
    }
    if posts.snippet_max_chars == 0 {
        return Err(ProfileError::Validation(
            "posts.snippet_max_chars must be at least 1".to_string(),
        ));
    }
    if posts.card_keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ProfileError::Validation(
            "posts.card_keywords must not contain blank entries".to_string(),
        ));
    }
    if panel.heading_text.trim().is_empty() {
        return Err(ProfileError::Validation(
            "panel.heading_text must be non-empty".to_string(),
        ));
    }

    let singles = [
        ("posts.card_selector", &posts.card_selector),
        ("posts.snippet_selector", &posts.snippet_selector),
        ("posts.timestamp.selector", &posts.timestamp.selector),
        ("posts.video_selector", &posts.video_selector),
        ("posts.image_selector", &posts.image_selector),
        ("panel.heading_selector", &panel.heading_selector),
        ("panel.container_selector", &panel.container_selector),
        ("panel.item_selector", &panel.item_selector),
    ];
    for (field, selector) in singles {
        check_selector(field, selector)?;
    }

    let lists = [
        ("posts.likes.selectors", &posts.likes.selectors),
        ("posts.comments.selectors", &posts.comments.selectors),
        ("panel.value.selectors", &panel.value.selectors),
        ("panel.label_selectors", &panel.label_selectors),
    ];
    for (field, selectors) in lists {
        if selectors.is_empty() {
            return Err(ProfileError::Validation(format!(
                "{field} must list at least one selector"
            )));
        }
        for selector in selectors {
            check_selector(field, selector)?;
        }
    }

    Ok(())
}

fn check_selector(field: &str, selector: &str) -> Result<(), ProfileError> {
    compile(selector)
        .map(|_| ())
        .map_err(|e| ProfileError::Validation(format!("{field}: {e}")))
}
