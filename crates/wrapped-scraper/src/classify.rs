use crate::profile::ClassifierRules;

/// Extraction strategy for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    TopPostsList,
    AggregateDiscoveryPanel,
    /// Unrecognized address; the top-posts strategy is attempted anyway.
    Fallback,
}

impl PageKind {
    /// Label recorded in the result's `meta.page`.
    #[must_use]
    pub fn meta_label(self) -> &'static str {
        match self {
            PageKind::TopPostsList => "creator-top-posts",
            PageKind::AggregateDiscoveryPanel => "creator-content-impressions",
            PageKind::Fallback => "fallback",
        }
    }

    /// Whether the page is scanned for post cards.
    #[must_use]
    pub fn scans_posts(self) -> bool {
        !matches!(self, PageKind::AggregateDiscoveryPanel)
    }
}

/// Chooses the extraction strategy for `url`. Never fails.
#[must_use]
pub fn classify(url: &str, rules: &ClassifierRules) -> PageKind {
    if url.contains(&rules.top_posts_pattern) {
        PageKind::TopPostsList
    } else if url.contains(&rules.discovery_panel_pattern) {
        PageKind::AggregateDiscoveryPanel
    } else {
        PageKind::Fallback
    }
}
