//! Numeric values scraped from dashboard markup.
//!
//! Dashboards print counts as integers ("1,234") and occasionally as decimals
//! ("12.5K" after unit letters are stripped). [`Metric`] keeps that distinction
//! so a count serializes back to JSON as `1234`, not `1234.0`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A parsed dashboard number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    Int(u64),
    Float(f64),
}

impl Metric {
    /// Lossy conversion used for ranking and summing.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Metric::Int(n) => n as f64,
            Metric::Float(x) => x,
        }
    }

    /// `true` when the value is strictly greater than zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        match self {
            Metric::Int(n) => n > 0,
            Metric::Float(x) => x > 0.0,
        }
    }

    /// Adds two metrics, staying integral while both sides are integral.
    #[must_use]
    pub fn add(self, other: Metric) -> Metric {
        match (self, other) {
            (Metric::Int(a), Metric::Int(b)) => Metric::Int(a.saturating_add(b)),
            (a, b) => Metric::Float(a.as_f64() + b.as_f64()),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Int(n) => write!(f, "{n}"),
            Metric::Float(x) => write!(f, "{x}"),
        }
    }
}
