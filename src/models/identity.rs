//! Deduplicated domain / url identity rows.
//!
//! Both tables are content-addressed: the normalized string is the key and
//! the mapping string -> id must be stable. Lookups are idempotent with
//! create-on-miss; a concurrent duplicate insert is tolerated (last write
//! wins) rather than corrected.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    pub domain: String,
}

/// A normalized URL scoped to its domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlEntry {
    pub id: String,
    pub url: String,
    pub domain_id: String,
}
