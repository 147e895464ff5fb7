//! The navigation-event correlation pipeline.
//!
//! A raw visit event enters the queue, and the single worker runs it
//! end-to-end: fan-out correlation against the browser's tab/visit state,
//! session resolution, causal classification, then hand-off to the upload
//! buffer. No two visits are ever correlated concurrently — the context
//! queries read "current" browser state that concurrent events would race
//! on.

mod classify;
mod correlate;
mod queue;

use std::sync::{Arc, Mutex as StdMutex};

use anyhow::{Context, Result};
use chrono::{Duration, Utc};

use crate::auth::{self, TokenProvider};
use crate::browser::{BrowserApi, HistoryItem, Tab};
use crate::models::{NavigationRecord, TabActivity};
use crate::retry::RetryConfig;
use crate::session::SessionTracker;
use crate::settings::CollectorSettings;
use crate::store::NavStore;
use crate::uploader::BatchUploader;

pub use queue::QueueController;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Last-write-wins snapshots from the tab activation/highlight listeners.
/// Updated outside the queue, read when a record is assembled. Advisory
/// only — never a correctness input to classification.
#[derive(Debug, Default)]
pub struct AdvisoryTabs {
    pub activated: Option<TabActivity>,
    pub highlighted: Option<TabActivity>,
}

impl AdvisoryTabs {
    pub fn note_activated(&mut self, tab: &Tab) {
        self.activated = Some(TabActivity {
            last_query_time: Utc::now(),
            url: tab.url.clone(),
        });
    }

    pub fn note_highlighted(&mut self, tab: &Tab) {
        self.highlighted = Some(TabActivity {
            last_query_time: Utc::now(),
            url: tab.url.clone(),
        });
    }
}

pub struct Pipeline {
    browser: Arc<dyn BrowserApi>,
    store: Arc<dyn NavStore>,
    tokens: Arc<dyn TokenProvider>,
    tracker: Arc<SessionTracker>,
    uploader: BatchUploader,
    advisory: Arc<StdMutex<AdvisoryTabs>>,
    retry: RetryConfig,
    visit_tolerance: Duration,
    favicon_size: u32,
}

impl Pipeline {
    pub fn new(
        browser: Arc<dyn BrowserApi>,
        store: Arc<dyn NavStore>,
        tokens: Arc<dyn TokenProvider>,
        tracker: Arc<SessionTracker>,
        uploader: BatchUploader,
        advisory: Arc<StdMutex<AdvisoryTabs>>,
        settings: &CollectorSettings,
    ) -> Self {
        Self {
            browser,
            store,
            tokens,
            tracker,
            uploader,
            advisory,
            retry: RetryConfig::new(settings.retry_attempts, settings.retry_interval_ms),
            visit_tolerance: Duration::milliseconds(settings.visit_tolerance_ms),
            favicon_size: settings.favicon_size,
        }
    }

    /// Run one visit event through the whole pipeline. Called only from the
    /// queue worker, one event at a time.
    pub async fn process(&self, item: HistoryItem) -> Result<()> {
        let Some(url) = item.url.clone() else {
            log_warn!("visit event {} has no url, skipping", item.id);
            return Ok(());
        };

        let credentials = auth::authorize(&self.tokens)
            .await
            .context("cannot process visit without credentials")?;

        let time = item.last_visit_time.unwrap_or_else(Utc::now);
        let mut record = NavigationRecord::draft(url, item.title.clone(), time);
        record.user_id = Some(credentials.user_id.clone());

        correlate::correlate(
            self.browser.as_ref(),
            &mut record,
            &item,
            self.retry,
            self.visit_tolerance,
            self.favicon_size,
        )
        .await?;

        record.session_id = Some(
            self.tracker
                .resolve_session(time, &credentials.user_id)
                .await?,
        );

        classify::classify_and_link(self.store.as_ref(), &mut record, self.retry).await?;

        {
            let advisory = self.advisory.lock().unwrap();
            record.activated_tab = advisory.activated.clone();
            record.highlighted_tab = advisory.highlighted.clone();
        }

        log_info!(
            "correlated visit {} ({:?} / {:?})",
            record.url,
            record.transition_type,
            record.link_transition
        );
        self.uploader.enqueue(record);
        Ok(())
    }
}
