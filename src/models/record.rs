//! Navigation record data model.
//!
//! One record per visited URL, assembled field-by-field as the correlation
//! steps complete. Any snapshot field may stay `None` — the source queries
//! are best-effort and absence is a valid outcome, not an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why the browser says the navigation happened.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    Link,
    Typed,
    AutoBookmark,
    AutoSubframe,
    ManualSubframe,
    Generated,
    AutoToplevel,
    FormSubmit,
    Reload,
    Keyword,
    KeywordGenerated,
}

impl TransitionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionType::Link => "link",
            TransitionType::Typed => "typed",
            TransitionType::AutoBookmark => "auto_bookmark",
            TransitionType::AutoSubframe => "auto_subframe",
            TransitionType::ManualSubframe => "manual_subframe",
            TransitionType::Generated => "generated",
            TransitionType::AutoToplevel => "auto_toplevel",
            TransitionType::FormSubmit => "form_submit",
            TransitionType::Reload => "reload",
            TransitionType::Keyword => "keyword",
            TransitionType::KeywordGenerated => "keyword_generated",
        }
    }
}

/// Derived classification of the navigation's provenance relative to the
/// tab/window it landed in. Not supplied by the browser.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LinkTransition {
    SameTab,
    OpenInNewTab,
    NewWindow,
}

/// Causal edge between two records. `target` is always this record's id;
/// `source` is the predecessor's id when one could be established.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub source: Option<String>,
    pub target: String,
}

/// Advisory snapshot from the tab activation / highlight listeners.
/// Last-write-wins, never a correctness input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TabActivity {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_query_time: DateTime<Utc>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRecord {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time: DateTime<Utc>,
    #[serde(rename = "user_id")]
    pub user_id: Option<String>,
    pub domain_id: Option<String>,
    pub url_id: Option<String>,
    pub tab_id: Option<i64>,
    pub tab_window_id: Option<i64>,
    pub tab_status: Option<String>,
    pub tab_favicon_url: Option<String>,
    pub tab_window_length: Option<u32>,
    pub active_tab_id: Option<i64>,
    pub active_tab_window_id: Option<i64>,
    pub transition_type: Option<TransitionType>,
    pub link_transition: Option<LinkTransition>,
    pub link: Link,
    #[serde(rename = "session_id")]
    pub session_id: Option<String>,
    pub activated_tab: Option<TabActivity>,
    pub highlighted_tab: Option<TabActivity>,
}

impl NavigationRecord {
    /// Create an empty draft from the raw visit event fields. Everything
    /// else is filled in by the correlation pipeline.
    pub fn draft(url: String, title: Option<String>, time: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4().to_string();
        Self {
            link: Link {
                source: None,
                target: id.clone(),
            },
            id,
            url,
            title,
            time,
            user_id: None,
            domain_id: None,
            url_id: None,
            tab_id: None,
            tab_window_id: None,
            tab_status: None,
            tab_favicon_url: None,
            tab_window_length: None,
            active_tab_id: None,
            active_tab_window_id: None,
            transition_type: None,
            link_transition: None,
            session_id: None,
            activated_tab: None,
            highlighted_tab: None,
        }
    }
}
