//! Messages exchanged between page tasks, the UI and the coordinator.
//!
//! ```json
//! { "action": "SCRAPED_DATA", "data": { ... }, "fromUrl": "...", "closeTab": true }
//! { "action": "CLEAR_COLLECTED" }
//! { "action": "GET_COLLECTED" }
//! ```
//!
//! Every message is acknowledged with `{ "status": "ok" }`; `GET_COLLECTED`
//! additionally carries `collected`.

use serde::{Deserialize, Serialize};

use crate::model::PageScrapeResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// One-shot delivery of a finished page scrape.
    #[serde(rename_all = "camelCase")]
    ScrapedData {
        data: PageScrapeResult,
        from_url: String,
        #[serde(default)]
        close_tab: bool,
    },
    /// Reset aggregation state before a new session.
    ClearCollected,
    /// Retrieve everything collected so far.
    GetCollected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected: Option<Vec<PageScrapeResult>>,
}

impl Response {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            collected: None,
        }
    }

    #[must_use]
    pub fn with_collected(collected: Vec<PageScrapeResult>) -> Self {
        Self {
            status: Status::Ok,
            collected: Some(collected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scraped_data_uses_extension_field_names() {
        let msg = Message::ScrapedData {
            data: PageScrapeResult::empty(
                "https://example.com/analytics/creator/top-posts/",
                "2025-12-01T10:00:00Z".parse().unwrap(),
            ),
            from_url: "https://example.com/analytics/creator/top-posts/".to_owned(),
            close_tab: true,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["action"], "SCRAPED_DATA");
        assert_eq!(json["closeTab"], true);
        assert_eq!(json["fromUrl"], "https://example.com/analytics/creator/top-posts/");
        assert_eq!(json["data"]["scrapedFrom"], "https://example.com/analytics/creator/top-posts/");
    }

    #[test]
    fn parses_unit_actions() {
        let clear: Message = serde_json::from_str(r#"{"action":"CLEAR_COLLECTED"}"#).unwrap();
        let get: Message = serde_json::from_str(r#"{"action":"GET_COLLECTED"}"#).unwrap();
        assert_eq!(clear, Message::ClearCollected);
        assert_eq!(get, Message::GetCollected);
    }

    #[test]
    fn rejects_unknown_action() {
        assert!(serde_json::from_str::<Message>(r#"{"action":"OPEN_TABS"}"#).is_err());
    }

    #[test]
    fn plain_ack_has_no_collected_key() {
        let json = serde_json::to_string(&Response::ok()).unwrap();
        assert_eq!(json, r#"{"status":"ok"}"#);
    }
}
