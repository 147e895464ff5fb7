use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::TransitionType;

/// A browser-reported notification that a URL was navigated to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub url: Option<String>,
    pub title: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_visit_time: Option<DateTime<Utc>>,
    pub visit_count: u32,
    pub typed_count: u32,
}

/// One entry in the browser's visit log for a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitItem {
    /// History item id this visit belongs to.
    pub id: String,
    pub visit_id: String,
    pub referring_visit_id: Option<String>,
    pub transition: TransitionType,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub visit_time: Option<DateTime<Utc>>,
}

/// The subset of browser tab state the pipeline consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: Option<i64>,
    pub window_id: i64,
    pub active: bool,
    pub highlighted: bool,
    pub status: Option<String>,
    pub fav_icon_url: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
}

/// Filter for [`super::BrowserApi::query_tabs`]. All criteria are ANDed.
#[derive(Debug, Clone, Default)]
pub struct TabQuery {
    pub url: Option<String>,
    pub window_id: Option<i64>,
    pub active: Option<bool>,
    pub last_focused_window: bool,
}

impl TabQuery {
    pub fn by_url(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Self::default()
        }
    }

    pub fn by_window(window_id: i64) -> Self {
        Self {
            window_id: Some(window_id),
            ..Self::default()
        }
    }

    /// The focused tab of the last-focused window.
    pub fn focused() -> Self {
        Self {
            active: Some(true),
            last_focused_window: true,
            ..Self::default()
        }
    }
}
