//! Batch upload buffer.
//!
//! Finished records accumulate briefly so that bursty navigation (redirect
//! chains, form resubmits) can be deduplicated before anything hits the
//! store. The first record entering an empty buffer arms a debounce timer;
//! when it fires, the buffer is swapped out, deduplicated, and each
//! survivor is uploaded independently — one failing record never blocks
//! the others.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::identity::IdentityResolver;
use crate::models::{NavigationRecord, TransitionType};
use crate::normalize::normalize_url;
use crate::retry::{retry, RetryConfig};
use crate::store::NavStore;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

#[derive(Clone)]
pub struct BatchUploader {
    inner: Arc<UploaderInner>,
}

struct UploaderInner {
    buffer: StdMutex<Vec<NavigationRecord>>,
    store: Arc<dyn NavStore>,
    identity: IdentityResolver,
    debounce: Duration,
    retry: RetryConfig,
}

impl BatchUploader {
    pub fn new(store: Arc<dyn NavStore>, debounce_ms: u64, retry: RetryConfig) -> Self {
        Self {
            inner: Arc::new(UploaderInner {
                buffer: StdMutex::new(Vec::new()),
                identity: IdentityResolver::new(store.clone()),
                store,
                debounce: Duration::from_millis(debounce_ms),
                retry,
            }),
        }
    }

    /// Buffer a finished record. The record is immutable from here on.
    pub fn enqueue(&self, record: NavigationRecord) {
        let arm_timer = {
            let mut buffer = self.inner.buffer.lock().unwrap();
            buffer.push(record);
            // Only the enqueue that found the buffer empty arms the timer;
            // it re-arms naturally once the flush empties the buffer.
            buffer.len() == 1
        };

        if arm_timer {
            let uploader = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(uploader.inner.debounce).await;
                uploader.flush().await;
            });
        }
    }

    /// Drain, deduplicate and upload the buffer. Uploads run concurrently;
    /// each failure is logged and dropped.
    pub async fn flush(&self) {
        let drained = std::mem::take(&mut *self.inner.buffer.lock().unwrap());
        if drained.is_empty() {
            return;
        }

        let total = drained.len();
        let survivors = dedupe(drained);
        log_info!("flushing {}/{total} records", survivors.len());

        let uploads: Vec<_> = survivors
            .into_iter()
            .map(|record| {
                let uploader = self.clone();
                tokio::spawn(async move {
                    let url = record.url.clone();
                    if let Err(err) = uploader.upload(record).await {
                        log_error!("upload of {url} failed: {err:#}");
                    }
                })
            })
            .collect();

        for upload in uploads {
            let _ = upload.await;
        }
    }

    async fn upload(&self, mut record: NavigationRecord) -> Result<()> {
        let inner = &self.inner;

        let domain_id = retry(inner.retry, || inner.identity.domain_id(&record.url))
            .await
            .context("domain id resolution failed")?;
        let url_id = retry(inner.retry, || {
            inner.identity.url_id(&record.url, &domain_id)
        })
        .await
        .context("url id resolution failed")?;

        record.domain_id = Some(domain_id);
        record.url_id = Some(url_id);

        retry(inner.retry, || inner.store.insert_record(&record))
            .await
            .context("record insert failed")?;
        Ok(())
    }
}

/// Deduplication pass: one forward scan, removing in place. The index only
/// advances when nothing was removed at the current position, since a
/// removal shifts the next element into the slot under examination.
pub fn dedupe(mut records: Vec<NavigationRecord>) -> Vec<NavigationRecord> {
    let mut index = 0;
    while index < records.len() {
        // Form resubmissions are noise.
        if records[index].transition_type == Some(TransitionType::FormSubmit) {
            records.remove(index);
            continue;
        }

        // Too little context to be useful.
        if records[index].tab_id.is_none() || records[index].tab_window_id.is_none() {
            records.remove(index);
            continue;
        }

        if index + 1 < records.len() && is_adjacent_duplicate(&records[index], &records[index + 1])
        {
            let current = &records[index];
            let next = &records[index + 1];

            if current.tab_id.is_none() {
                records.remove(index);
            } else if next.tab_id.is_none() {
                records.remove(index + 1);
            } else if current.transition_type == Some(TransitionType::Link)
                && next.transition_type != Some(TransitionType::Link)
            {
                // The explicit transition is the more informative one.
                records.remove(index);
            } else {
                records.remove(index + 1);
            }
            continue;
        }

        index += 1;
    }
    records
}

fn is_adjacent_duplicate(current: &NavigationRecord, next: &NavigationRecord) -> bool {
    if comparable_url(&current.url) != comparable_url(&next.url) {
        return false;
    }
    // Records from different tabs showing the same URL are distinct visits.
    match (current.tab_id, next.tab_id) {
        (Some(a), Some(b)) => {
            a == b && current.tab_window_id == next.tab_window_id
        }
        _ => true,
    }
}

fn comparable_url(url: &str) -> String {
    normalize_url(url).unwrap_or_else(|_| url.to_string())
}
