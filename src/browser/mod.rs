//! Browser tab/history API boundary.
//!
//! The collector never talks to a browser directly; the embedder supplies a
//! [`BrowserApi`] implementation. Queries are treated as black-box,
//! possibly-empty, possibly-slow services — an empty result is data, not an
//! error.

pub mod favicon;
mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use types::{HistoryItem, Tab, TabQuery, VisitItem};

#[async_trait]
pub trait BrowserApi: Send + Sync {
    /// Query open tabs. Returns every tab matching the filter, possibly none.
    async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>>;

    /// All recorded visits for a URL, most recent first.
    async fn get_visits(&self, url: &str) -> Result<Vec<VisitItem>>;
}
