//! Browsing-session tracking.
//!
//! Sessions are server-authoritative: each visit resolves against the most
//! recently started session in the remote store, extending it when the visit
//! falls inside the activity window and rotating to a fresh one after a gap.
//! If the store is unreachable the whole visit fails — no local fallback
//! session is synthesized, so we never drift from the stored state.
//!
//! A keep-alive task additionally extends the current session while the
//! embedder keeps reporting user activity (scrolling, typing) between
//! visits, so an active reader on a single long page keeps their session.

use std::sync::{Arc, Mutex as StdMutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::auth::{self, TokenProvider};
use crate::models::Session;
use crate::store::NavStore;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Inactivity gap after which a session is considered abandoned.
pub const SESSION_TIMEOUT_MS: i64 = 120_000;

enum SessionDecision {
    StartNew,
    Continue(String),
}

/// Whether a visit at `visit_time` continues the existing session.
fn decide(existing: Option<&Session>, visit_time: DateTime<Utc>) -> SessionDecision {
    match existing {
        Some(session) if session.end_time >= visit_time => {
            SessionDecision::Continue(session.id.clone())
        }
        _ => SessionDecision::StartNew,
    }
}

pub struct SessionTracker {
    store: Arc<dyn NavStore>,
    timeout: Duration,
    last_activity: Arc<StdMutex<Option<DateTime<Utc>>>>,
    keepalive: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl SessionTracker {
    pub fn new(store: Arc<dyn NavStore>, timeout_ms: i64) -> Self {
        Self {
            store,
            timeout: Duration::milliseconds(timeout_ms),
            last_activity: Arc::new(StdMutex::new(None)),
            keepalive: Mutex::new(None),
        }
    }

    /// Session id for a visit at `visit_time`, creating or rotating the
    /// session as needed.
    pub async fn resolve_session(
        &self,
        visit_time: DateTime<Utc>,
        user_id: &str,
    ) -> Result<String> {
        let existing = self
            .store
            .latest_session(user_id)
            .await
            .context("session lookup failed")?;

        match decide(existing.as_ref(), visit_time) {
            SessionDecision::Continue(id) => {
                let end_time = Utc::now() + self.timeout;
                self.store
                    .extend_session(&id, end_time)
                    .await
                    .context("session extend failed")?;
                Ok(id)
            }
            SessionDecision::StartNew => {
                let session = Session {
                    id: Uuid::new_v4().to_string(),
                    user_id: user_id.to_string(),
                    start_time: visit_time,
                    end_time: visit_time + self.timeout,
                };
                self.store
                    .insert_session(&session)
                    .await
                    .context("session insert failed")?;
                log_info!("started session {} for user {user_id}", session.id);
                Ok(session.id)
            }
        }
    }

    /// Record user activity (mouse/keyboard/visibility) from the embedder.
    pub fn note_activity(&self) {
        *self.last_activity.lock().unwrap() = Some(Utc::now());
    }

    /// Spawn the keep-alive loop. While reported activity stays inside the
    /// timeout window, the current session's expiry is pushed forward on
    /// each tick; once activity goes quiet the session is left to lapse.
    pub async fn start_keepalive(&self, interval_secs: u64, tokens: Arc<dyn TokenProvider>) {
        let mut guard = self.keepalive.lock().await;
        if guard.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let store = self.store.clone();
        let timeout = self.timeout;
        let last_activity = self.last_activity.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(std::time::Duration::from_secs(interval_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = Utc::now();
                        let active = last_activity
                            .lock()
                            .unwrap()
                            .map(|at| now - at < timeout)
                            .unwrap_or(false);
                        if !active {
                            continue;
                        }

                        // Signed-out users have no session to keep alive.
                        let Ok(credentials) = auth::authorize(&tokens).await else {
                            continue;
                        };

                        match store.latest_session(&credentials.user_id).await {
                            Ok(Some(session)) if session.end_time >= now => {
                                if let Err(err) =
                                    store.extend_session(&session.id, now + timeout).await
                                {
                                    log_warn!("session keep-alive extend failed: {err}");
                                }
                            }
                            // Lapsed or absent sessions are the next visit's
                            // problem; keep-alive never creates one.
                            Ok(_) => {}
                            Err(err) => log_warn!("session keep-alive lookup failed: {err}"),
                        }
                    }
                    _ = token.cancelled() => {
                        log_info!("session keep-alive shutting down");
                        break;
                    }
                }
            }
        });

        *guard = Some((cancel, handle));
    }

    pub async fn stop_keepalive(&self) -> Result<()> {
        if let Some((cancel, handle)) = self.keepalive.lock().await.take() {
            cancel.cancel();
            handle.await.context("keep-alive task failed to join")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn tracker_with_store() -> (SessionTracker, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (
            SessionTracker::new(store.clone(), SESSION_TIMEOUT_MS),
            store,
        )
    }

    #[tokio::test]
    async fn first_visit_creates_a_session() {
        let (tracker, store) = tracker_with_store();
        let now = Utc::now();

        let id = tracker.resolve_session(now, "user-1").await.unwrap();

        let sessions = store.sessions.lock().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, id);
        assert_eq!(sessions[0].start_time, now);
        assert_eq!(sessions[0].end_time, now + Duration::milliseconds(SESSION_TIMEOUT_MS));
    }

    #[tokio::test]
    async fn visit_inside_window_continues_and_extends() {
        let (tracker, store) = tracker_with_store();
        let start = Utc::now() - Duration::seconds(30);

        let first = tracker.resolve_session(start, "user-1").await.unwrap();
        let second = tracker
            .resolve_session(start + Duration::seconds(20), "user-1")
            .await
            .unwrap();

        assert_eq!(first, second);
        let sessions = store.sessions.lock().unwrap();
        assert_eq!(sessions.len(), 1);
        // Extended relative to wall clock, not the visit time.
        assert!(sessions[0].end_time > start + Duration::milliseconds(SESSION_TIMEOUT_MS));
    }

    #[tokio::test]
    async fn gap_beyond_timeout_rotates_the_session() {
        let (tracker, store) = tracker_with_store();
        let start = Utc::now() - Duration::seconds(600);

        let first = tracker.resolve_session(start, "user-1").await.unwrap();
        let second = tracker
            .resolve_session(start + Duration::seconds(300), "user-1")
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(store.sessions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sessions_are_per_user() {
        let (tracker, store) = tracker_with_store();
        let now = Utc::now();

        let a = tracker.resolve_session(now, "user-a").await.unwrap();
        let b = tracker.resolve_session(now, "user-b").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.sessions.lock().unwrap().len(), 2);
    }
}
