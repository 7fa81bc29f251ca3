//! Field extraction from post cards and panel metric items.
//!
//! Per-element failures are contained: a card that cannot be read is logged
//! and skipped, and the scan continues with the next candidate. Only a
//! failure that affects the whole document (an invalid page-level selector)
//! escapes as an error.

use chrono::{DateTime, Utc};
use scraper::Html;
use wrapped_core::{MediaKind, Metric, PostRecord, ProfileStats};

use crate::dedup::dedup_posts;
use crate::dom::{closest, compile, rendered_text, CardLike};
use crate::error::{DomError, ExtractError};
use crate::number::{first_numeric_run, parse_number};
use crate::profile::{CompiledProfile, FieldProbes, PanelSelectors};

/// A value found in the page before it is assigned to a field.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMetricCandidate {
    pub text: String,
    pub numeric_value: Option<Metric>,
}

impl RawMetricCandidate {
    fn from_text(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            numeric_value: parse_number(Some(text)),
        }
    }
}

/// A panel metric with its lowercased label (empty when none was found).
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMetric {
    pub label: String,
    pub value: RawMetricCandidate,
}

/// Where and when a scan pass runs; stamped onto every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContext {
    pub source_url: String,
    pub scraped_at: DateTime<Utc>,
}

/// Number from an accessible label or visible text, e.g. `"1,234 reactions"`.
fn parse_label(label: &str) -> Option<Metric> {
    first_numeric_run(label).and_then(|run| parse_number(Some(run)))
}

/// Runs `probes` against `card`; the first probe yielding a number wins.
fn probe_field<C: CardLike + ?Sized>(
    card: &C,
    probes: &FieldProbes,
) -> Result<Option<Metric>, DomError> {
    for selector in &probes.selectors {
        let Some(view) = card.first_match(selector)? else {
            continue;
        };
        let value = probes
            .label_attributes
            .iter()
            .filter_map(|attr| view.attr(attr))
            .find_map(parse_label)
            .or_else(|| parse_label(&view.text));
        if value.is_some() {
            return Ok(value);
        }
    }
    Ok(None)
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Extracts one post record from a card.
///
/// Returns `Ok(None)` for cards that are too short or, when the profile
/// requires it, carry no engagement metric.
///
/// # Errors
///
/// Returns [`ExtractError`] when the card cannot be queried.
pub fn extract_post<C: CardLike + ?Sized>(
    card: &C,
    ctx: &PostContext,
    profile: &CompiledProfile,
) -> Result<Option<PostRecord>, ExtractError> {
    let sel = &profile.profile().posts;

    let text = card.text()?;
    if text.is_empty() || text.chars().count() < sel.min_text_len {
        return Ok(None);
    }

    let impressions = profile
        .impressions_re()
        .captures(&text)
        .and_then(|caps| parse_number(caps.get(1).map(|m| m.as_str())));

    let likes = probe_field(card, &sel.likes)?;
    let comments = probe_field(card, &sel.comments)?;

    let timestamp = card
        .first_match(&sel.timestamp.selector)?
        .and_then(|view| view.attr(&sel.timestamp.attribute).map(str::to_owned))
        .filter(|t| !t.is_empty());

    let media = if card.has_match(&sel.video_selector)? {
        MediaKind::Video
    } else if card.has_match(&sel.image_selector)? {
        MediaKind::Image
    } else {
        MediaKind::Text
    };

    let snippet_source = card
        .first_match(&sel.snippet_selector)?
        .map(|view| view.text)
        .filter(|t| !t.is_empty())
        .unwrap_or(text);

    let record = PostRecord {
        source_url: ctx.source_url.clone(),
        scraped_at: ctx.scraped_at,
        text: truncate_chars(&snippet_source, sel.snippet_max_chars),
        impressions,
        likes,
        comments,
        timestamp,
        media,
    };

    if sel.require_signal && !record.has_signal() {
        return Ok(None);
    }
    Ok(Some(record))
}

/// Extracts the value and label of one panel list item.
///
/// Hidden value elements are treated as misses. Returns `Ok(None)` when no
/// visible value element exists.
///
/// # Errors
///
/// Returns [`ExtractError`] when the item cannot be queried.
pub fn extract_metric<C: CardLike + ?Sized>(
    item: &C,
    panel: &PanelSelectors,
) -> Result<Option<LabeledMetric>, ExtractError> {
    let mut value: Option<RawMetricCandidate> = None;
    for selector in &panel.value.selectors {
        let Some(view) = item.first_match(selector)? else {
            continue;
        };
        if view.hidden {
            continue;
        }
        let candidate = panel
            .value
            .label_attributes
            .iter()
            .filter_map(|attr| view.attr(attr))
            .map(RawMetricCandidate::from_text)
            .find(|c| c.numeric_value.is_some())
            .unwrap_or_else(|| RawMetricCandidate::from_text(&view.text));
        let found = candidate.numeric_value.is_some();
        value = Some(candidate);
        if found {
            break;
        }
    }

    let Some(value) = value else {
        return Ok(None);
    };

    let mut label = String::new();
    for selector in &panel.label_selectors {
        if let Some(view) = item.first_match(selector)? {
            label = view.text.to_lowercase();
            break;
        }
    }

    Ok(Some(LabeledMetric { label, value }))
}

/// Extracts records from candidate cards, closing the pool at
/// `max_posts` accepted records, then deduplicates.
///
/// Cards that fail extraction are skipped.
pub fn collect_posts<C, I>(cards: I, ctx: &PostContext, profile: &CompiledProfile) -> Vec<PostRecord>
where
    C: CardLike,
    I: IntoIterator<Item = C>,
{
    let max_posts = profile.profile().posts.max_posts;
    let mut posts = Vec::new();
    let mut skipped = 0usize;

    for card in cards {
        match extract_post(&card, ctx, profile) {
            Ok(Some(post)) => posts.push(post),
            Ok(None) => {}
            Err(e) => {
                skipped += 1;
                tracing::debug!(error = %e, "skipping post card");
            }
        }
        if posts.len() >= max_posts {
            break;
        }
    }

    let found = posts.len();
    let unique = dedup_posts(posts);
    tracing::debug!(
        url = %ctx.source_url,
        found,
        unique = unique.len(),
        skipped,
        "extracted post cards"
    );
    unique
}

/// Scans a top-posts document for post cards.
///
/// # Errors
///
/// Returns [`DomError::Selector`] when the profile's card selector is invalid.
pub fn scan_posts(
    doc: &Html,
    ctx: &PostContext,
    profile: &CompiledProfile,
) -> Result<Vec<PostRecord>, DomError> {
    let sel = &profile.profile().posts;
    let card_selector = compile(&sel.card_selector)?;

    let candidates: Vec<_> = doc
        .select(&card_selector)
        .filter(|el| {
            let text = rendered_text(*el).to_lowercase();
            sel.card_keywords
                .iter()
                .any(|k| text.contains(&k.to_lowercase()))
        })
        .take(sel.candidate_scan_limit)
        .collect();

    tracing::debug!(candidates = candidates.len(), "found post card candidates");
    Ok(collect_posts(candidates, ctx, profile))
}

/// Reads the discovery panel's profile stats.
///
/// A missing heading or container yields empty stats, not an error.
///
/// # Errors
///
/// Returns [`DomError::Selector`] when a panel selector is invalid.
pub fn scan_discovery_panel(
    doc: &Html,
    profile: &CompiledProfile,
) -> Result<ProfileStats, DomError> {
    let panel = &profile.profile().panel;
    let heading_selector = compile(&panel.heading_selector)?;
    let container_selector = compile(&panel.container_selector)?;
    let item_selector = compile(&panel.item_selector)?;
    let wanted = panel.heading_text.trim().to_lowercase();

    let mut stats = ProfileStats::default();

    let Some(heading) = doc
        .select(&heading_selector)
        .find(|h| rendered_text(*h).to_lowercase() == wanted)
    else {
        tracing::info!(heading = %panel.heading_text, "panel heading not found");
        return Ok(stats);
    };

    let Some(container) = closest(heading, &container_selector) else {
        tracing::info!(heading = %panel.heading_text, "panel container not found");
        return Ok(stats);
    };

    for (index, item) in container.select(&item_selector).enumerate() {
        let metric = match extract_metric(&item, panel) {
            Ok(Some(metric)) => metric,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!(index, error = %e, "skipping panel item");
                continue;
            }
        };

        tracing::debug!(index, label = %metric.label, value = ?metric.value.numeric_value, "panel item");

        let Some(number) = metric.value.numeric_value.filter(|n| n.is_positive()) else {
            continue;
        };
        assign_panel_metric(&mut stats, panel, index, &metric.label, number);
    }

    Ok(stats)
}

fn assign_panel_metric(
    stats: &mut ProfileStats,
    panel: &PanelSelectors,
    index: usize,
    label: &str,
    number: Metric,
) {
    let matches_any = |labels: &[String]| labels.iter().any(|l| label.contains(l.as_str()));

    if matches_any(&panel.impressions_labels) {
        stats.impressions = Some(number);
    } else if matches_any(&panel.members_reached_labels) {
        stats.members_reached = Some(number);
    } else if panel.positional_fallback && index == 0 && stats.impressions.is_none() {
        stats.impressions = Some(number);
    } else if panel.positional_fallback
        && index == 1
        && stats.impressions.is_some()
        && stats.members_reached.is_none()
    {
        stats.members_reached = Some(number);
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
