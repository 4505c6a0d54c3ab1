//! Headless model of the two-pane picker.
//!
//! [`PickerSession`] holds everything a renderer needs: the optimistic
//! selection order, identifiers submitted but not yet admitted, both filters,
//! the unselected pages loaded so far and the visible window of the selected
//! pane. Every edit is applied locally first and then queued on the
//! scheduler; [`PickerSession::resync`] folds the server's view back in.

use crate::{PickerClient, Result, SelectedWindow, compose_unselected, filter_selected};
use idpick_core::{Id, Page, parse_id};
use indexmap::IndexSet;
use std::collections::HashSet;

/// Result of [`PickerSession::submit_new_id`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing but whitespace was entered.
    Empty,
    /// The text is not a positive integer within the identifier limit.
    Invalid,
    /// The identifier already exists in the dense range.
    InDenseRange,
    /// The identifier is already known, either admitted or queued.
    AlreadyKnown,
    /// The identifier was queued for admission.
    Queued(Id),
}

pub struct PickerSession {
    client: PickerClient,
    max_id: Id,
    selected: Vec<Id>,
    /// Extras the server reported at the last resync.
    known_extras: HashSet<Id>,
    /// Submitted here, not yet reported back by the server.
    local_extras: IndexSet<Id>,
    left_filter: String,
    right_filter: String,
    /// Every server item loaded for the current left filter.
    left: Page,
    right: SelectedWindow,
}

impl PickerSession {
    /// Loads the server state and the first unselected page.
    ///
    /// # Errors
    ///
    /// Propagates a failed read.
    pub async fn load(client: PickerClient) -> Result<Self> {
        let state = client.state().await?;
        let mut session = Self {
            right: SelectedWindow::new(client.page_size()),
            client,
            max_id: state.max_id,
            selected: state.selected_order,
            known_extras: state.extra_ids.into_iter().collect(),
            local_extras: IndexSet::new(),
            left_filter: String::new(),
            right_filter: String::new(),
            left: Page::default(),
        };
        session.reload_left().await?;
        Ok(session)
    }

    pub fn client(&self) -> &PickerClient {
        &self.client
    }

    pub fn max_id(&self) -> Id {
        self.max_id
    }

    /// The optimistic selection order, unfiltered.
    pub fn selected(&self) -> &[Id] {
        &self.selected
    }

    pub fn left_filter(&self) -> &str {
        &self.left_filter
    }

    pub fn right_filter(&self) -> &str {
        &self.right_filter
    }

    /// Identifiers submitted locally that the server has not reported yet.
    pub fn local_extras(&self) -> impl Iterator<Item = Id> + '_ {
        self.local_extras.iter().copied()
    }

    /// Left pane: local-only extras first, then the loaded server items.
    pub fn unselected_view(&self) -> Page {
        let local: Vec<Id> = self.local_extras.iter().copied().collect();
        compose_unselected(&local, &self.selected, &self.left_filter, &self.left)
    }

    /// Right pane: filtered selection truncated to the visible window.
    pub fn selected_view(&self) -> Vec<Id> {
        self.right.view(&self.selected, &self.right_filter)
    }

    /// Sets the left filter and reloads from the first page.
    ///
    /// # Errors
    ///
    /// Propagates a failed read; the loaded items are left empty.
    pub async fn set_left_filter(&mut self, filter: &str) -> Result<()> {
        self.left_filter = filter.trim().to_string();
        self.reload_left().await
    }

    /// Sets the right filter and shrinks the window back to one page.
    pub fn set_right_filter(&mut self, filter: &str) {
        self.right_filter = filter.trim().to_string();
        self.right.reset();
    }

    /// Appends `id` to the selection. Returns `false` if it was already
    /// selected.
    ///
    /// # Errors
    ///
    /// Propagates a failed reload of the left pane. The selection change is
    /// kept and queued regardless.
    pub async fn select(&mut self, id: Id) -> Result<bool> {
        if self.selected.contains(&id) {
            return Ok(false);
        }
        self.selected.push(id);
        self.commit_selection();
        self.reload_left().await?;
        Ok(true)
    }

    /// Removes `id` from the selection. Returns `false` if it was not
    /// selected.
    ///
    /// # Errors
    ///
    /// Propagates a failed reload of the left pane. The selection change is
    /// kept and queued regardless.
    pub async fn deselect(&mut self, id: Id) -> Result<bool> {
        let Some(index) = self.selected.iter().position(|&s| s == id) else {
            return Ok(false);
        };
        self.selected.remove(index);
        self.commit_selection();
        self.reload_left().await?;
        Ok(true)
    }

    /// Moves `from` so it sits immediately before `to`.
    ///
    /// Both must be selected and distinct. The unselected pane is unaffected
    /// and is not reloaded; the right pane shrinks back to one page.
    pub fn move_item(&mut self, from: Id, to: Id) -> bool {
        if from == to {
            return false;
        }
        let (Some(from_index), Some(to_index)) = (
            self.selected.iter().position(|&s| s == from),
            self.selected.iter().position(|&s| s == to),
        ) else {
            return false;
        };

        let item = self.selected.remove(from_index);
        let insert_at = if from_index < to_index {
            to_index - 1
        } else {
            to_index
        };
        self.selected.insert(insert_at, item);
        self.commit_selection();
        true
    }

    /// Validates typed text and queues it as a new extra identifier.
    pub fn submit_new_id(&mut self, raw: &str) -> SubmitOutcome {
        let text = raw.trim();
        if text.is_empty() {
            return SubmitOutcome::Empty;
        }
        let Ok(id) = parse_id(text) else {
            return SubmitOutcome::Invalid;
        };
        if id <= self.max_id {
            return SubmitOutcome::InDenseRange;
        }
        if self.known_extras.contains(&id) || self.local_extras.contains(&id) {
            return SubmitOutcome::AlreadyKnown;
        }
        if !self.client.enqueue_add_item(id) {
            return SubmitOutcome::AlreadyKnown;
        }
        self.local_extras.insert(id);
        tracing::debug!(id, "Queued new identifier");
        SubmitOutcome::Queued(id)
    }

    /// Loads the next left page when the scroll sentinel comes into view.
    /// Returns `false` once every server item has been loaded.
    ///
    /// # Errors
    ///
    /// Propagates a failed read; already loaded items are kept.
    pub async fn on_left_sentinel_visible(&mut self) -> Result<bool> {
        let loaded = self.left.items.len() as u64;
        if loaded >= self.left.total {
            return Ok(false);
        }
        let page = self
            .client
            .unselected_page(&self.left_filter, loaded, self.client.page_size())
            .await?;
        let grew = !page.items.is_empty();
        self.left.items.extend(page.items);
        self.left.total = page.total;
        Ok(grew)
    }

    /// Grows the right pane by one page if more matching entries exist.
    pub fn on_right_sentinel_visible(&mut self) -> bool {
        let matching = filter_selected(&self.selected, &self.right_filter).len();
        self.right.on_sentinel_visible(matching)
    }

    /// Folds the server state back into the session.
    ///
    /// The server's order is adopted only when the server had acknowledged
    /// every local selection change before it took the snapshot, and no
    /// change was made since. Local extras the server now reports are dropped
    /// from the overlay. The left pane is reloaded when either of those
    /// changed it, and the right pane shrinks back to one page when the order
    /// is adopted. Returns whether the selection changed.
    ///
    /// # Errors
    ///
    /// Propagates a failed read.
    pub async fn resync(&mut self) -> Result<bool> {
        let (state, acked_generation) = self.client.state_stamped().await?;
        self.max_id = state.max_id;
        self.known_extras = state.extra_ids.into_iter().collect();
        let overlay = self.local_extras.len();
        let known = &self.known_extras;
        self.local_extras.retain(|id| !known.contains(id));
        let admitted = self.local_extras.len() != overlay;

        let current = acked_generation == self.client.selection_generation();
        let adopted = current && state.selected_order != self.selected;
        if adopted {
            tracing::debug!(len = state.selected_order.len(), "Adopting server selection");
            self.selected = state.selected_order;
            self.right.reset();
        } else if !current {
            tracing::trace!(acked_generation, "Keeping unacknowledged local selection");
        }
        if adopted || admitted {
            self.reload_left().await?;
        }
        Ok(adopted)
    }

    /// Queues the current order and shrinks the right pane back to one page.
    fn commit_selection(&mut self) {
        self.client.enqueue_selection_update(&self.selected);
        self.right.reset();
    }

    async fn reload_left(&mut self) -> Result<()> {
        self.left = Page::default();
        self.left = self
            .client
            .unselected_page(&self.left_filter, 0, self.client.page_size())
            .await?;
        Ok(())
    }
}
