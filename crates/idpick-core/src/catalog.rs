//! The server-owned picker state.
//!
//! [`Catalog`] bundles the [`Domain`] and the [`Selection`] and exposes the
//! only operations allowed to mutate them: bulk intake and selection replace.
//! It holds no interior mutability; a service that handles requests in
//! parallel must guard a single `Catalog` with one lock so that paging never
//! observes a half-applied replace.

use crate::{
    Domain, Error, Id, Page, Selection, coerce_id, engine,
    wire::{BulkResponse, StateResponse},
};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct Catalog {
    domain: Domain,
    selection: Selection,
}

impl Catalog {
    /// Creates an empty catalog over the dense range `[1, max_id]`.
    pub fn new(max_id: Id) -> Self {
        Self {
            domain: Domain::new(max_id),
            selection: Selection::default(),
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Full state snapshot. Extras are listed in ascending order.
    pub fn snapshot(&self) -> StateResponse {
        StateResponse {
            selected_order: self.selection.order().to_vec(),
            extra_ids: self.domain.extras().collect(),
            max_id: self.domain.max_id(),
        }
    }

    /// Admits every valid out-of-range candidate into the extra set.
    ///
    /// - Values that do not coerce are skipped and reported raw.
    /// - Dense-range identifiers are skipped and reported coerced.
    /// - Identifiers already admitted (earlier calls or earlier in this batch)
    ///   are skipped and reported coerced.
    ///
    /// Both lists follow input order. Re-submitting an admitted identifier is
    /// never an error.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(candidates = ids.len()))
    )]
    pub fn admit_bulk(&mut self, ids: &[Value]) -> BulkResponse {
        let mut added = Vec::new();
        let mut skipped = Vec::new();

        for raw in ids {
            match coerce_id(raw).and_then(|id| self.domain.admit_extra(id).map(|ok| (id, ok))) {
                Ok((id, true)) => added.push(id),
                Ok((id, false)) => skipped.push(Value::from(id)),
                Err(Error::InvalidIdentifier { .. }) => skipped.push(raw.clone()),
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(added = added.len(), skipped = skipped.len(), "bulk intake");

        BulkResponse { added, skipped }
    }

    /// Replaces the whole selection with `order`.
    ///
    /// Entries that do not coerce are dropped. Identifiers above `max_id` are
    /// admitted as extras on the way in. Duplicates collapse onto their first
    /// occurrence. Returns the resulting order.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(len = order.len()))
    )]
    pub fn replace_selection(&mut self, order: &[Value]) -> Vec<Id> {
        let ids: Vec<Id> = order.iter().filter_map(|raw| coerce_id(raw).ok()).collect();
        for &id in &ids {
            // Only fails for values `coerce_id` already rejected.
            let _ = self.domain.admit_extra(id);
        }
        self.selection = Selection::from_ids(ids);
        self.selection.order().to_vec()
    }

    /// One page of unselected identifiers: dense range ascending, then
    /// extras ascending.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn page(&self, filter: &str, offset: u64, limit: usize) -> Page {
        engine::page(&self.domain, &self.selection, filter, offset, limit)
    }
}
