//! Remote record store.
//!
//! A REST-style resource store (PostgREST semantics) holds the authoritative
//! data: navigation records, sessions and the domain/url dedup tables. The
//! in-memory side keeps no cache — every lookup goes to the store.
//!
//! [`RestClient`] speaks the wire protocol (bearer auth, filtered queries);
//! [`RemoteStore`] layers the typed operations the pipeline needs on top.
//! [`NavStore`] is the seam the rest of the crate consumes, so tests can
//! substitute an in-memory fake.

mod client;
#[cfg(test)]
pub mod memory;
mod remote;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::AuthError;
use crate::models::{Domain, NavigationRecord, Session, UrlEntry};

pub use client::RestClient;
pub use remote::RemoteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remote store returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("remote store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Typed store operations used by the pipeline. Every lookup that can miss
/// returns `Option` — not-found is a legitimate branch, never an error.
#[async_trait]
pub trait NavStore: Send + Sync {
    async fn insert_record(&self, record: &NavigationRecord) -> Result<(), StoreError>;

    /// Most recent record at or before `before` in the given tab.
    async fn latest_record_for_tab(
        &self,
        before: DateTime<Utc>,
        tab_id: i64,
        window_id: i64,
    ) -> Result<Option<NavigationRecord>, StoreError>;

    /// Most recent record at or before `before` anywhere in the given window.
    async fn latest_record_for_window(
        &self,
        before: DateTime<Utc>,
        window_id: i64,
    ) -> Result<Option<NavigationRecord>, StoreError>;

    /// Most recent record at or before `before`, across all tabs and windows.
    async fn latest_record(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Option<NavigationRecord>, StoreError>;

    /// The user's most recently started session.
    async fn latest_session(&self, user_id: &str) -> Result<Option<Session>, StoreError>;

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Push a session's soft expiry forward.
    async fn extend_session(
        &self,
        session_id: &str,
        end_time: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn find_domain(&self, domain: &str) -> Result<Option<Domain>, StoreError>;

    async fn insert_domain(&self, domain: &Domain) -> Result<(), StoreError>;

    async fn find_url(&self, url: &str, domain_id: &str)
        -> Result<Option<UrlEntry>, StoreError>;

    async fn insert_url(&self, entry: &UrlEntry) -> Result<(), StoreError>;
}
