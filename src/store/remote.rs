//! Typed store operations over the REST client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::models::{Domain, NavigationRecord, Session, UrlEntry};
use crate::store::{NavStore, RestClient, StoreError};

const RECORDS_TABLE: &str = "historyItems";
const SESSIONS_TABLE: &str = "historySessions";
const DOMAINS_TABLE: &str = "domains";
const URLS_TABLE: &str = "urls";

pub struct RemoteStore {
    client: RestClient,
}

impl RemoteStore {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    async fn latest_record_where(
        &self,
        filters: &[(&str, String)],
    ) -> Result<Option<NavigationRecord>, StoreError> {
        let rows: Vec<NavigationRecord> = self
            .client
            .query(RECORDS_TABLE, filters, Some("time.desc"), Some(1))
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl NavStore for RemoteStore {
    async fn insert_record(&self, record: &NavigationRecord) -> Result<(), StoreError> {
        self.client.insert(RECORDS_TABLE, record).await
    }

    async fn latest_record_for_tab(
        &self,
        before: DateTime<Utc>,
        tab_id: i64,
        window_id: i64,
    ) -> Result<Option<NavigationRecord>, StoreError> {
        self.latest_record_where(&[
            ("time", format!("lte.{}", before.timestamp_millis())),
            ("tabId", format!("eq.{tab_id}")),
            ("tabWindowId", format!("eq.{window_id}")),
        ])
        .await
    }

    async fn latest_record_for_window(
        &self,
        before: DateTime<Utc>,
        window_id: i64,
    ) -> Result<Option<NavigationRecord>, StoreError> {
        self.latest_record_where(&[
            ("time", format!("lte.{}", before.timestamp_millis())),
            ("tabWindowId", format!("eq.{window_id}")),
        ])
        .await
    }

    async fn latest_record(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Option<NavigationRecord>, StoreError> {
        self.latest_record_where(&[("time", format!("lte.{}", before.timestamp_millis()))])
            .await
    }

    async fn latest_session(&self, user_id: &str) -> Result<Option<Session>, StoreError> {
        let rows: Vec<Session> = self
            .client
            .query(
                SESSIONS_TABLE,
                &[("user_id", format!("eq.{user_id}"))],
                Some("startTime.desc"),
                Some(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.client.insert(SESSIONS_TABLE, session).await
    }

    async fn extend_session(
        &self,
        session_id: &str,
        end_time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.client
            .patch(
                SESSIONS_TABLE,
                &[("id", format!("eq.{session_id}"))],
                &json!({ "endTime": end_time.timestamp_millis() }),
            )
            .await
    }

    async fn find_domain(&self, domain: &str) -> Result<Option<Domain>, StoreError> {
        let rows: Vec<Domain> = self
            .client
            .query(
                DOMAINS_TABLE,
                &[("domain", format!("eq.{domain}"))],
                None,
                Some(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_domain(&self, domain: &Domain) -> Result<(), StoreError> {
        self.client.insert(DOMAINS_TABLE, domain).await
    }

    async fn find_url(
        &self,
        url: &str,
        domain_id: &str,
    ) -> Result<Option<UrlEntry>, StoreError> {
        let rows: Vec<UrlEntry> = self
            .client
            .query(
                URLS_TABLE,
                &[
                    ("url", format!("eq.{url}")),
                    ("domainId", format!("eq.{domain_id}")),
                ],
                None,
                Some(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_url(&self, entry: &UrlEntry) -> Result<(), StoreError> {
        self.client.insert(URLS_TABLE, entry).await
    }
}
