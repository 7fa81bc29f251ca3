use thiserror::Error;

/// Failure while querying the DOM of one element.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("invalid selector \"{selector}\": {reason}")]
    Selector { selector: String, reason: String },

    #[error("malformed element: {0}")]
    Malformed(String),
}

/// Failure extracting one card or metric item. The page scan skips the
/// element and keeps going.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Dom(#[from] DomError),
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read selector profile {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse selector profile: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid selector profile: {0}")]
    Validation(String),
}

/// Whole-page failure. Recorded on the result's `error` field instead of
/// being propagated past the page pipeline.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to read page snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("page source has no snapshots")]
    NoSnapshot,

    #[error("page source unavailable: {reason}")]
    Source { reason: String },

    #[error(transparent)]
    Dom(#[from] DomError),
}
