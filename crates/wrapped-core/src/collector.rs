//! Coordinator-side state: the growing collection of page results.
//!
//! Page tasks deliver exactly one [`Message::ScrapedData`] each. Chunks are
//! append-only and kept in arrival order. When a store path is configured
//! the collection is mirrored to a JSON file after every change, and
//! `GET_COLLECTED` falls back to that file when memory is empty (e.g. after
//! the coordinator restarted mid-session).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::{Message, Response};
use crate::model::PageScrapeResult;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access collection store {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("collection store {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Identifies the page context a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedChunk {
    /// `None` when the sender had no tab.
    pub tab: Option<TabId>,
    pub from_url: String,
    pub data: PageScrapeResult,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCollection {
    #[serde(default)]
    collected: Vec<CollectedChunk>,
}

#[derive(Debug, Default)]
pub struct Collector {
    chunks: Vec<CollectedChunk>,
    close_requests: Vec<TabId>,
    store_path: Option<PathBuf>,
}

impl Collector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A collector that mirrors its state to `path`.
    #[must_use]
    pub fn with_store(path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Handles one message and returns the acknowledgement.
    ///
    /// Store failures are logged; they never fail the message.
    pub fn handle(&mut self, tab: Option<TabId>, message: Message) -> Response {
        match message {
            Message::ScrapedData {
                data,
                from_url,
                close_tab,
            } => {
                tracing::info!(
                    tab = ?tab,
                    url = %from_url,
                    posts = data.top_posts.len(),
                    "received scraped data"
                );
                self.chunks.push(CollectedChunk {
                    tab,
                    from_url,
                    data,
                });
                if close_tab {
                    if let Some(tab) = tab {
                        self.close_requests.push(tab);
                    }
                }
                self.persist();
                Response::ok()
            }
            Message::ClearCollected => {
                self.chunks.clear();
                self.close_requests.clear();
                self.persist();
                tracing::info!("cleared collected data");
                Response::ok()
            }
            Message::GetCollected => Response::with_collected(self.collected()),
        }
    }

    /// All collected page results in arrival order.
    ///
    /// Falls back to the store file when nothing is held in memory.
    #[must_use]
    pub fn collected(&self) -> Vec<PageScrapeResult> {
        if !self.chunks.is_empty() {
            return self.chunks.iter().map(|c| c.data.clone()).collect();
        }
        let Some(path) = self.store_path.as_deref() else {
            return Vec::new();
        };
        match load_store(path) {
            Ok(stored) => {
                tracing::debug!(count = stored.len(), "returning stored collection");
                stored.into_iter().map(|c| c.data).collect()
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not read collection store");
                Vec::new()
            }
        }
    }

    /// `true` when every change is mirrored to a store file, making
    /// [`Collector::handle`] perform blocking file I/O.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.store_path.is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Tabs that asked to be closed since the last call.
    pub fn take_close_requests(&mut self) -> Vec<TabId> {
        std::mem::take(&mut self.close_requests)
    }

    fn persist(&self) {
        let Some(path) = self.store_path.as_deref() else {
            return;
        };
        if let Err(e) = save_store(path, &self.chunks) {
            tracing::warn!(error = %e, "could not write collection store");
        }
    }
}

fn load_store(path: &Path) -> Result<Vec<CollectedChunk>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| StoreError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let stored: StoredCollection =
        serde_json::from_str(&content).map_err(|e| StoreError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
    Ok(stored.collected)
}

fn save_store(path: &Path, chunks: &[CollectedChunk]) -> Result<(), StoreError> {
    #[derive(Serialize)]
    struct Borrowed<'a> {
        collected: &'a [CollectedChunk],
    }

    let json = serde_json::to_string(&Borrowed { collected: chunks }).map_err(|e| {
        StoreError::Parse {
            path: path.display().to_string(),
            source: e,
        }
    })?;
    std::fs::write(path, json).map_err(|e| StoreError::Io {
        path: path.display().to_string(),
        source: e,
    })
}
