//! Domain / url identity resolution.
//!
//! Normalized strings map to stable ids in the remote dedup tables, resolved
//! lazily per buffered record just before upload. Lookup-or-create only: a
//! concurrent duplicate insert of the same key is an accepted data-quality
//! tradeoff, not something we detect or repair.

use std::sync::Arc;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::models::{Domain, UrlEntry};
use crate::normalize::{normalize_domain, normalize_url};
use crate::store::NavStore;

#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn NavStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn NavStore>) -> Self {
        Self { store }
    }

    /// Stable id for the URL's bare domain, creating the row on first sight.
    pub async fn domain_id(&self, url: &str) -> Result<String> {
        let domain = normalize_domain(url)?;

        if let Some(existing) = self
            .store
            .find_domain(&domain)
            .await
            .context("domain lookup failed")?
        {
            return Ok(existing.id);
        }

        let row = Domain {
            id: Uuid::new_v4().to_string(),
            domain,
        };
        self.store
            .insert_domain(&row)
            .await
            .context("domain insert failed")?;
        Ok(row.id)
    }

    /// Stable id for the normalized URL within its domain.
    pub async fn url_id(&self, url: &str, domain_id: &str) -> Result<String> {
        let normalized = normalize_url(url)?;

        if let Some(existing) = self
            .store
            .find_url(&normalized, domain_id)
            .await
            .context("url lookup failed")?
        {
            return Ok(existing.id);
        }

        let row = UrlEntry {
            id: Uuid::new_v4().to_string(),
            url: normalized,
            domain_id: domain_id.to_string(),
        };
        self.store
            .insert_url(&row)
            .await
            .context("url insert failed")?;
        Ok(row.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn domain_id_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let resolver = IdentityResolver::new(store.clone());

        let first = resolver.domain_id("https://www.example.com/a").await.unwrap();
        let second = resolver.domain_id("http://example.com/b").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.domains.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn url_id_is_idempotent_and_scoped_to_domain() {
        let store = Arc::new(MemoryStore::new());
        let resolver = IdentityResolver::new(store.clone());

        let domain_id = resolver.domain_id("https://example.com").await.unwrap();
        let first = resolver
            .url_id("https://www.example.com/a?q=1", &domain_id)
            .await
            .unwrap();
        let second = resolver
            .url_id("http://example.com/a?q=1", &domain_id)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.urls.lock().unwrap().len(), 1);

        let other = resolver
            .url_id("https://example.com/a?q=1", "other-domain")
            .await
            .unwrap();
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn malformed_url_propagates() {
        let resolver = IdentityResolver::new(Arc::new(MemoryStore::new()));
        assert!(resolver.domain_id("http://").await.is_err());
    }
}
