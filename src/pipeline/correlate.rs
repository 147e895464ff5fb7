//! Tab/visit correlation.
//!
//! Three context queries run concurrently and join: the tab currently
//! showing the visited URL, the focused tab, and the visit-history entry
//! that explains why the navigation happened. Each is best-effort — a tab
//! that closed before the query resolved simply leaves its fields empty.
//! A query failure (after bounded retry) aborts the whole event.

use anyhow::{Context, Result};
use chrono::Duration;

use crate::browser::{favicon, BrowserApi, HistoryItem, TabQuery};
use crate::models::{NavigationRecord, TransitionType};
use crate::normalize::normalize_domain;
use crate::retry::{retry, RetryConfig};

/// Snapshot of the tab the URL was loaded into.
#[derive(Debug, Default)]
struct VisitedTab {
    tab_id: Option<i64>,
    window_id: Option<i64>,
    status: Option<String>,
    favicon_url: Option<String>,
    window_length: Option<u32>,
}

pub async fn correlate(
    browser: &dyn BrowserApi,
    record: &mut NavigationRecord,
    item: &HistoryItem,
    retry_cfg: RetryConfig,
    tolerance: Duration,
    favicon_size: u32,
) -> Result<()> {
    let (visited, active, transition) = tokio::try_join!(
        visited_tab(browser, &record.url, retry_cfg),
        active_tab(browser, retry_cfg),
        visit_transition(browser, item, retry_cfg, tolerance),
    )?;

    record.tab_id = visited.tab_id;
    record.tab_window_id = visited.window_id;
    record.tab_status = visited.status;
    record.tab_favicon_url = visited.favicon_url;
    record.tab_window_length = visited.window_length;
    if let Some((active_id, active_window_id)) = active {
        record.active_tab_id = active_id;
        record.active_tab_window_id = Some(active_window_id);
    }
    record.transition_type = transition;

    // The tab query found nothing or the tab carried no icon; fall back to
    // the external lookup. Unparseable URLs just skip the favicon.
    if record.tab_favicon_url.is_none() {
        record.tab_favicon_url = normalize_domain(&record.url)
            .ok()
            .map(|domain| favicon::favicon_url(&domain, favicon_size));
    }

    Ok(())
}

/// Find the tab currently showing the visited URL and, when it has one,
/// count the tabs sharing its window.
async fn visited_tab(
    browser: &dyn BrowserApi,
    url: &str,
    retry_cfg: RetryConfig,
) -> Result<VisitedTab> {
    let query = TabQuery::by_url(url);
    let tabs = retry(retry_cfg, || browser.query_tabs(&query))
        .await
        .context("tab query failed")?;

    let Some(tab) = tabs.into_iter().next() else {
        // The tab already navigated away or closed. Expected.
        return Ok(VisitedTab::default());
    };

    let window_query = TabQuery::by_window(tab.window_id);
    let window_tabs = retry(retry_cfg, || browser.query_tabs(&window_query))
        .await
        .context("window tab query failed")?;

    Ok(VisitedTab {
        tab_id: tab.id,
        window_id: Some(tab.window_id),
        status: tab.status,
        favicon_url: tab.fav_icon_url.filter(|icon| !icon.is_empty()),
        window_length: Some(window_tabs.len() as u32),
    })
}

/// Snapshot of whatever tab has focus right now. Focus and navigation are
/// decoupled, so this may be a different tab than the visited one.
async fn active_tab(
    browser: &dyn BrowserApi,
    retry_cfg: RetryConfig,
) -> Result<Option<(Option<i64>, i64)>> {
    let query = TabQuery::focused();
    let tabs = retry(retry_cfg, || browser.query_tabs(&query))
        .await
        .context("active tab query failed")?;

    Ok(tabs.into_iter().next().map(|tab| (tab.id, tab.window_id)))
}

/// Pick the transition type out of the visit log: entries for this visit id
/// within the time tolerance, preferring an explicit transition (typed,
/// reload, ...) over the generic "link" when several entries collide.
async fn visit_transition(
    browser: &dyn BrowserApi,
    item: &HistoryItem,
    retry_cfg: RetryConfig,
    tolerance: Duration,
) -> Result<Option<TransitionType>> {
    let Some(url) = item.url.as_deref() else {
        return Ok(None);
    };

    let visits = retry(retry_cfg, || browser.get_visits(url))
        .await
        .context("visit query failed")?;

    let matching: Vec<TransitionType> = visits
        .iter()
        .filter(|visit| visit.id == item.id)
        .filter(|visit| match (visit.visit_time, item.last_visit_time) {
            (Some(visit_time), Some(event_time)) => {
                (visit_time - event_time).abs() <= tolerance
            }
            _ => false,
        })
        .map(|visit| visit.transition)
        .collect();

    Ok(matching
        .iter()
        .find(|transition| **transition != TransitionType::Link)
        .or_else(|| matching.first())
        .copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{Tab, VisitItem};
    use async_trait::async_trait;
    use chrono::Utc;

    struct ScriptedBrowser {
        tabs: Vec<Tab>,
        visits: Vec<VisitItem>,
    }

    #[async_trait]
    impl BrowserApi for ScriptedBrowser {
        async fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>> {
            Ok(self
                .tabs
                .iter()
                .filter(|tab| {
                    query
                        .url
                        .as_deref()
                        .map_or(true, |url| tab.url.as_deref() == Some(url))
                        && query.window_id.map_or(true, |id| tab.window_id == id)
                        && query.active.map_or(true, |active| tab.active == active)
                })
                .cloned()
                .collect())
        }

        async fn get_visits(&self, _url: &str) -> Result<Vec<VisitItem>> {
            Ok(self.visits.clone())
        }
    }

    fn visit(id: &str, transition: TransitionType, offset_ms: i64) -> VisitItem {
        VisitItem {
            id: id.to_string(),
            visit_id: "v".to_string(),
            referring_visit_id: None,
            transition,
            visit_time: Some(Utc::now() + Duration::milliseconds(offset_ms)),
        }
    }

    fn item_for(id: &str, url: &str) -> HistoryItem {
        HistoryItem {
            id: id.to_string(),
            url: Some(url.to_string()),
            title: None,
            last_visit_time: Some(Utc::now()),
            visit_count: 1,
            typed_count: 0,
        }
    }

    #[tokio::test]
    async fn prefers_explicit_transition_over_link() {
        let browser = ScriptedBrowser {
            tabs: vec![],
            visits: vec![
                visit("h-1", TransitionType::Link, 0),
                visit("h-1", TransitionType::Typed, 100),
            ],
        };

        let transition = visit_transition(
            &browser,
            &item_for("h-1", "https://example.com"),
            RetryConfig::new(1, 1),
            Duration::milliseconds(1_000),
        )
        .await
        .unwrap();

        assert_eq!(transition, Some(TransitionType::Typed));
    }

    #[tokio::test]
    async fn ignores_visits_outside_tolerance_or_other_ids() {
        let browser = ScriptedBrowser {
            tabs: vec![],
            visits: vec![
                visit("h-1", TransitionType::Typed, -5_000),
                visit("other", TransitionType::Reload, 0),
                visit("h-1", TransitionType::Link, 200),
            ],
        };

        let transition = visit_transition(
            &browser,
            &item_for("h-1", "https://example.com"),
            RetryConfig::new(1, 1),
            Duration::milliseconds(1_000),
        )
        .await
        .unwrap();

        assert_eq!(transition, Some(TransitionType::Link));
    }

    #[tokio::test]
    async fn missing_tab_leaves_snapshot_empty_with_fallback_favicon() {
        let browser = ScriptedBrowser {
            tabs: vec![],
            visits: vec![],
        };
        let item = item_for("h-1", "https://www.example.com/a");
        let mut record = NavigationRecord::draft(
            "https://www.example.com/a".to_string(),
            None,
            Utc::now(),
        );

        correlate(
            &browser,
            &mut record,
            &item,
            RetryConfig::new(1, 1),
            Duration::milliseconds(1_000),
            64,
        )
        .await
        .unwrap();

        assert_eq!(record.tab_id, None);
        assert_eq!(record.tab_window_id, None);
        assert_eq!(record.transition_type, None);
        assert_eq!(
            record.tab_favicon_url.as_deref(),
            Some("https://www.google.com/s2/favicons?domain=example.com&sz=64")
        );
    }

    #[tokio::test]
    async fn empty_tab_favicon_falls_back() {
        let tab = Tab {
            id: Some(3),
            window_id: 9,
            active: false,
            highlighted: false,
            status: Some("loading".to_string()),
            fav_icon_url: Some(String::new()),
            url: Some("https://example.com/x".to_string()),
            title: None,
        };
        let browser = ScriptedBrowser {
            tabs: vec![tab],
            visits: vec![],
        };
        let item = item_for("h-2", "https://example.com/x");
        let mut record =
            NavigationRecord::draft("https://example.com/x".to_string(), None, Utc::now());

        correlate(
            &browser,
            &mut record,
            &item,
            RetryConfig::new(1, 1),
            Duration::milliseconds(1_000),
            32,
        )
        .await
        .unwrap();

        assert_eq!(record.tab_id, Some(3));
        assert_eq!(record.tab_window_length, Some(1));
        assert_eq!(
            record.tab_favicon_url.as_deref(),
            Some("https://www.google.com/s2/favicons?domain=example.com&sz=32")
        );
    }
}
