//! In-memory [`NavStore`] used by tests. Query semantics mirror the REST
//! store: descending time order, limit 1, exact-match filters.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Domain, NavigationRecord, Session, UrlEntry};
use crate::store::{NavStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    pub records: Mutex<Vec<NavigationRecord>>,
    pub sessions: Mutex<Vec<Session>>,
    pub domains: Mutex<Vec<Domain>>,
    pub urls: Mutex<Vec<UrlEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn latest_matching<F>(&self, before: DateTime<Utc>, predicate: F) -> Option<NavigationRecord>
    where
        F: Fn(&NavigationRecord) -> bool,
    {
        let records = self.records.lock().unwrap();
        records
            .iter()
            .filter(|record| record.time <= before && predicate(record))
            .max_by_key(|record| record.time)
            .cloned()
    }
}

#[async_trait]
impl NavStore for MemoryStore {
    async fn insert_record(&self, record: &NavigationRecord) -> Result<(), StoreError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn latest_record_for_tab(
        &self,
        before: DateTime<Utc>,
        tab_id: i64,
        window_id: i64,
    ) -> Result<Option<NavigationRecord>, StoreError> {
        Ok(self.latest_matching(before, |record| {
            record.tab_id == Some(tab_id) && record.tab_window_id == Some(window_id)
        }))
    }

    async fn latest_record_for_window(
        &self,
        before: DateTime<Utc>,
        window_id: i64,
    ) -> Result<Option<NavigationRecord>, StoreError> {
        Ok(self.latest_matching(before, |record| record.tab_window_id == Some(window_id)))
    }

    async fn latest_record(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Option<NavigationRecord>, StoreError> {
        Ok(self.latest_matching(before, |_| true))
    }

    async fn latest_session(&self, user_id: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .iter()
            .filter(|session| session.user_id == user_id)
            .max_by_key(|session| session.start_time)
            .cloned())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn extend_session(
        &self,
        session_id: &str,
        end_time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        for session in sessions.iter_mut() {
            if session.id == session_id {
                session.end_time = end_time;
            }
        }
        Ok(())
    }

    async fn find_domain(&self, domain: &str) -> Result<Option<Domain>, StoreError> {
        let domains = self.domains.lock().unwrap();
        Ok(domains.iter().find(|row| row.domain == domain).cloned())
    }

    async fn insert_domain(&self, domain: &Domain) -> Result<(), StoreError> {
        self.domains.lock().unwrap().push(domain.clone());
        Ok(())
    }

    async fn find_url(
        &self,
        url: &str,
        domain_id: &str,
    ) -> Result<Option<UrlEntry>, StoreError> {
        let urls = self.urls.lock().unwrap();
        Ok(urls
            .iter()
            .find(|row| row.url == url && row.domain_id == domain_id)
            .cloned())
    }

    async fn insert_url(&self, entry: &UrlEntry) -> Result<(), StoreError> {
        self.urls.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
