use crate::{Error, Id, MAX_ID_LIMIT, Result};
use std::collections::BTreeSet;

/// The identifier universe: the dense range `[1, max_id]` plus a sparse,
/// grow-only set of extra identifiers strictly greater than `max_id`.
///
/// `max_id` is fixed for the lifetime of the domain. Extras are kept in a
/// [`BTreeSet`] so they always enumerate in ascending order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Domain {
    max_id: Id,
    extras: BTreeSet<Id>,
}

impl Domain {
    /// Creates a domain whose dense range is `[1, max_id]`.
    ///
    /// `max_id` is clamped to [`MAX_ID_LIMIT`]. A `max_id` of zero yields an
    /// empty dense range.
    pub fn new(max_id: Id) -> Self {
        Self {
            max_id: max_id.min(MAX_ID_LIMIT),
            extras: BTreeSet::new(),
        }
    }

    /// Upper bound of the dense range.
    pub const fn max_id(&self) -> Id {
        self.max_id
    }

    pub fn contains(&self, id: Id) -> bool {
        (1..=self.max_id).contains(&id) || self.extras.contains(&id)
    }

    pub fn is_extra(&self, id: Id) -> bool {
        self.extras.contains(&id)
    }

    /// Admits `id` into the extra set.
    ///
    /// Returns `Ok(false)` without side effects when `id` already belongs to
    /// the dense range or was admitted before, so repeated calls are safe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if `id` is zero or above
    /// [`MAX_ID_LIMIT`].
    pub fn admit_extra(&mut self, id: Id) -> Result<bool> {
        if id == 0 || id > MAX_ID_LIMIT {
            return Err(Error::invalid(id));
        }
        if id <= self.max_id {
            return Ok(false);
        }
        Ok(self.extras.insert(id))
    }

    /// Number of identifiers in the domain (dense range plus extras).
    pub fn size(&self) -> u64 {
        self.max_id + self.extras.len() as u64
    }

    pub fn extra_count(&self) -> usize {
        self.extras.len()
    }

    /// Extra identifiers in ascending order.
    pub fn extras(&self) -> impl DoubleEndedIterator<Item = Id> + '_ {
        self.extras.iter().copied()
    }
}
