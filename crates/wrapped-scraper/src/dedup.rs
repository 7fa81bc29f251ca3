//! Collapsing repeated post cards.
//!
//! Overlapping card candidates (a card and its wrapper, or the same card
//! matched twice) produce near-identical records. Records are keyed on a
//! lossy fingerprint of their most visible fields; two distinct posts with
//! the same opening text and the same impressions and likes collapse into
//! one.

use std::collections::HashSet;

use wrapped_core::PostRecord;

/// Characters of text that take part in the fingerprint.
const FINGERPRINT_TEXT_CHARS: usize = 120;

/// `text[..120]|impressions|likes`, with absent metrics as empty strings.
#[must_use]
pub fn fingerprint(post: &PostRecord) -> String {
    let text: String = post.text.chars().take(FINGERPRINT_TEXT_CHARS).collect();
    let impressions = post.impressions.map(|m| m.to_string()).unwrap_or_default();
    let likes = post.likes.map(|m| m.to_string()).unwrap_or_default();
    format!("{text}|{impressions}|{likes}")
}

/// Drops records whose fingerprint was already seen, keeping first
/// occurrences in their original order.
#[must_use]
pub fn dedup_posts(posts: Vec<PostRecord>) -> Vec<PostRecord> {
    let mut seen = HashSet::new();
    posts
        .into_iter()
        .filter(|post| seen.insert(fingerprint(post)))
        .collect()
}
