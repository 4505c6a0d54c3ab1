//! Merging server pages with optimistic local state.
//!
//! The client's mirror of the server is stale by up to one flush interval.
//! Until the server acknowledges a local edit, the local edit wins:
//!
//! - Identifiers submitted locally but not yet admitted by the server are
//!   listed first in the unselected pane, ahead of the server's pages.
//! - Identifiers selected locally are hidden from the unselected pane even if
//!   a server page fetched before the selection still lists them.
//!
//! `total` is the server total plus the local-only count. A brief
//! double-count while a flush is in flight is accepted.

use idpick_core::{Id, Page, matches};
use std::collections::HashSet;

/// Composes the unselected pane.
///
/// `local_extras` are identifiers the server has not reflected yet, in
/// submission order. `server` holds every server item loaded so far.
pub fn compose_unselected(
    local_extras: &[Id],
    selected: &[Id],
    filter: &str,
    server: &Page,
) -> Page {
    let filter = filter.trim();
    let selected: HashSet<Id> = selected.iter().copied().collect();
    let mut seen = HashSet::with_capacity(local_extras.len() + server.items.len());

    let mut items: Vec<Id> = local_extras
        .iter()
        .copied()
        .filter(|id| !selected.contains(id) && matches(filter, *id))
        .filter(|id| seen.insert(*id))
        .collect();
    let local_only = items.len() as u64;

    items.extend(
        server
            .items
            .iter()
            .copied()
            .filter(|id| !selected.contains(id) && seen.insert(*id)),
    );

    Page {
        items,
        total: server.total + local_only,
    }
}

/// Selection entries whose decimal text contains `filter`, in selection
/// order.
pub fn filter_selected(order: &[Id], filter: &str) -> Vec<Id> {
    let filter = filter.trim();
    order
        .iter()
        .copied()
        .filter(|id| matches(filter, *id))
        .collect()
}

/// Visible window of the selected pane: grows by one page every time the
/// scroll sentinel comes into view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectedWindow {
    page_size: usize,
    visible: usize,
}

impl SelectedWindow {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            visible: page_size,
        }
    }

    /// Back to a single page, e.g. after the filter changed.
    pub fn reset(&mut self) {
        self.visible = self.page_size;
    }

    pub fn visible_count(&self) -> usize {
        self.visible
    }

    /// Grows the window if `matching` entries are not all visible yet.
    /// Returns whether it grew.
    pub fn on_sentinel_visible(&mut self, matching: usize) -> bool {
        if self.visible >= matching {
            return false;
        }
        self.visible = self.visible.saturating_add(self.page_size);
        true
    }

    /// The filtered selection truncated to the visible count.
    pub fn view(&self, order: &[Id], filter: &str) -> Vec<Id> {
        let mut items = filter_selected(order, filter);
        items.truncate(self.visible);
        items
    }
}
