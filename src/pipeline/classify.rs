//! Causal link classification.
//!
//! The browser reports no parent-child relationship between navigations, so
//! provenance is reconstructed from timing and tab/window identity. The
//! decision table is evaluated top to bottom, first match wins:
//!
//! 1. a `typed` transition stays in its tab;
//! 2. the visited tab being the focused tab stays in its tab;
//! 3. a `link` transition in an unfocused tab of the focused window opened
//!    in a new tab;
//! 4. otherwise, when no predecessor exists and the window holds exactly
//!    one tab, the navigation opened a new window.
//!
//! The predecessor lookup then attaches `link.source`: most recent record in
//! the same tab+window, falling back to the window alone for new tabs (a new
//! tab has no history under its own id) and to the global most-recent record
//! for new windows (continuation from an external app or a reopened window).

use anyhow::{Context, Result};

use crate::models::{LinkTransition, NavigationRecord, TransitionType};
use crate::retry::{retry, RetryConfig};
use crate::store::NavStore;

/// Pure decision table over the draft record (rules 1-3; rule 4 depends on
/// the predecessor lookup and lives in [`classify_and_link`]).
pub fn classify(record: &NavigationRecord) -> Option<LinkTransition> {
    if record.transition_type == Some(TransitionType::Typed) {
        return Some(LinkTransition::SameTab);
    }

    if let (Some(active_id), Some(tab_id)) = (record.active_tab_id, record.tab_id) {
        if active_id == tab_id {
            return Some(LinkTransition::SameTab);
        }
    }

    if record.transition_type == Some(TransitionType::Link) {
        if let (Some(active_id), Some(tab_id), Some(window_id), Some(active_window_id)) = (
            record.active_tab_id,
            record.tab_id,
            record.tab_window_id,
            record.active_tab_window_id,
        ) {
            if active_id != tab_id && window_id == active_window_id {
                return Some(LinkTransition::OpenInNewTab);
            }
        }
    }

    None
}

/// Set `link_transition` and attach the predecessor link.
pub async fn classify_and_link(
    store: &dyn NavStore,
    record: &mut NavigationRecord,
    retry_cfg: RetryConfig,
) -> Result<()> {
    record.link_transition = classify(record);

    let before = record.time;
    let primary = match (record.tab_id, record.tab_window_id) {
        (Some(tab_id), Some(window_id)) => {
            retry(retry_cfg, || {
                store.latest_record_for_tab(before, tab_id, window_id)
            })
            .await
            .context("predecessor lookup failed")?
        }
        // Without a tab snapshot there is nothing to match on.
        _ => None,
    };

    if let Some(predecessor) = primary {
        record.link.source = Some(predecessor.id);
        return Ok(());
    }

    if record.link_transition == Some(LinkTransition::OpenInNewTab) {
        // A freshly-opened tab has no prior record under its own id; widen
        // the lookup to the window it appeared in.
        if let Some(window_id) = record.tab_window_id {
            let predecessor = retry(retry_cfg, || {
                store.latest_record_for_window(before, window_id)
            })
            .await
            .context("window predecessor lookup failed")?;
            record.link.source = predecessor.map(|found| found.id);
        }
        return Ok(());
    }

    // Only an otherwise-unclassified navigation in a single-tab window is a
    // new window (rule 4).
    if record.link_transition.is_none() && record.tab_window_length == Some(1) {
        record.link_transition = Some(LinkTransition::NewWindow);
        let predecessor = retry(retry_cfg, || store.latest_record(before))
            .await
            .context("global predecessor lookup failed")?;
        record.link.source = predecessor.map(|found| found.id);
    }

    Ok(())
}
