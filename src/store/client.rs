//! Low-level REST client for the remote record store.
//!
//! PostgREST-style wire protocol: rows are JSON, filters are query
//! parameters (`column=eq.value`), writes ask for `return=minimal`.
//! Credentials are fetched and validated before every call.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::{self, Credentials, TokenProvider};
use crate::store::StoreError;

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    tokens: Arc<dyn TokenProvider>,
}

impl RestClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            tokens,
        })
    }

    pub async fn insert<T: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &T,
    ) -> Result<(), StoreError> {
        let credentials = self.authorize().await?;
        let response = self
            .request(self.http.post(self.endpoint(table)), &credentials)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    pub async fn query<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        order: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<T>, StoreError> {
        let credentials = self.authorize().await?;

        let mut request = self
            .request(self.http.get(self.endpoint(table)), &credentials)
            .query(&[("select", "*")])
            .query(filters);
        if let Some(order) = order {
            request = request.query(&[("order", order)]);
        }
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit.to_string())]);
        }

        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        partial: &T,
    ) -> Result<(), StoreError> {
        let credentials = self.authorize().await?;
        let response = self
            .request(self.http.patch(self.endpoint(table)), &credentials)
            .header("Prefer", "return=minimal")
            .query(filters)
            .json(partial)
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    async fn authorize(&self) -> Result<Credentials, StoreError> {
        Ok(auth::authorize(&self.tokens).await?)
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn request(
        &self,
        builder: reqwest::RequestBuilder,
        credentials: &Credentials,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder.bearer_auth(&credentials.access_token);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("apikey", api_key);
        }
        builder
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "<response unavailable>".to_string());
        warn!("remote store error {status}: {message}");
        Err(StoreError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
