//! navtrail reconstructs a causally-linked graph of browsing activity.
//!
//! The embedder (extension host, automation harness, ...) forwards raw
//! browser events to a [`Collector`]; the collector correlates each history
//! visit against live tab state, assigns it to a browsing session,
//! classifies how it relates to the navigation that caused it, and uploads
//! normalized records to a remote store.

mod auth;
mod browser;
mod identity;
mod models;
mod normalize;
mod pipeline;
mod retry;
mod session;
mod settings;
mod store;
mod uploader;
mod utils;

use std::sync::{Arc, Mutex as StdMutex};

use anyhow::Result;

pub use auth::{validate, AuthError, Credentials, TokenProvider};
pub use browser::{favicon::favicon_url, BrowserApi, HistoryItem, Tab, TabQuery, VisitItem};
pub use models::{
    Domain, Link, LinkTransition, NavigationRecord, Session, TabActivity, TransitionType,
    UrlEntry,
};
pub use normalize::{normalize_domain, normalize_url};
pub use retry::{retry, RetryConfig};
pub use session::{SessionTracker, SESSION_TIMEOUT_MS};
pub use settings::{CollectorSettings, SettingsStore};
pub use store::{NavStore, RemoteStore, RestClient, StoreError};
pub use uploader::{dedupe, BatchUploader};

use pipeline::{AdvisoryTabs, Pipeline, QueueController};

/// Initialize logging (reads `RUST_LOG`, defaults to info).
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}

/// The background collector. Owns the event queue, session tracker and
/// upload buffer; the embedder feeds it browser events and it does the
/// rest.
pub struct Collector {
    settings: CollectorSettings,
    tokens: Arc<dyn TokenProvider>,
    tracker: Arc<SessionTracker>,
    uploader: BatchUploader,
    queue: QueueController,
    pipeline: Arc<Pipeline>,
    advisory: Arc<StdMutex<AdvisoryTabs>>,
}

impl Collector {
    pub fn new(
        settings: CollectorSettings,
        browser: Arc<dyn BrowserApi>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let client = RestClient::new(
            &settings.store_base_url,
            settings.store_api_key.clone(),
            tokens.clone(),
        )?;
        let store: Arc<dyn NavStore> = Arc::new(RemoteStore::new(client));
        Ok(Self::with_store(settings, browser, tokens, store))
    }

    /// Wire the collector against an explicit store implementation.
    pub fn with_store(
        settings: CollectorSettings,
        browser: Arc<dyn BrowserApi>,
        tokens: Arc<dyn TokenProvider>,
        store: Arc<dyn NavStore>,
    ) -> Self {
        let retry = RetryConfig::new(settings.retry_attempts, settings.retry_interval_ms);
        let tracker = Arc::new(SessionTracker::new(
            store.clone(),
            settings.session_timeout_ms,
        ));
        let uploader = BatchUploader::new(store.clone(), settings.debounce_ms, retry);
        let advisory = Arc::new(StdMutex::new(AdvisoryTabs::default()));

        let pipeline = Arc::new(Pipeline::new(
            browser,
            store,
            tokens.clone(),
            tracker.clone(),
            uploader.clone(),
            advisory.clone(),
            &settings,
        ));

        Self {
            settings,
            tokens,
            tracker,
            uploader,
            queue: QueueController::new(),
            pipeline,
            advisory,
        }
    }

    /// Start the queue worker and the session keep-alive. Events enqueued
    /// before this sit in the channel and are processed once started.
    pub async fn start(&self) -> Result<()> {
        self.queue.start(self.pipeline.clone())?;
        self.tracker
            .start_keepalive(self.settings.keepalive_interval_secs, self.tokens.clone())
            .await;
        Ok(())
    }

    /// Stop the workers and flush whatever is still buffered.
    pub async fn shutdown(&self) -> Result<()> {
        self.queue.stop().await?;
        self.tracker.stop_keepalive().await?;
        self.uploader.flush().await;
        Ok(())
    }

    /// A history visit fired. Never blocks; processing is serialized by the
    /// queue worker.
    pub fn on_visited(&self, item: HistoryItem) {
        self.tracker.note_activity();
        self.queue.enqueue(item);
    }

    /// The focused tab changed.
    pub fn on_activated(&self, tab: &Tab) {
        self.advisory.lock().unwrap().note_activated(tab);
    }

    /// The highlighted tab set changed.
    pub fn on_highlighted(&self, tab: &Tab) {
        self.advisory.lock().unwrap().note_highlighted(tab);
    }

    /// The embedder observed user activity (mouse, keyboard, visibility).
    pub fn note_activity(&self) {
        self.tracker.note_activity();
    }
}
