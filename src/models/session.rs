//! Browsing session data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-bounded grouping of navigation activity for one user.
///
/// `end_time` is a soft expiry: it is pushed forward on each qualifying
/// event, and a visit arriving after it starts a new session instead of
/// continuing this one. At most one session is current per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    #[serde(rename = "user_id")]
    pub user_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,
}
