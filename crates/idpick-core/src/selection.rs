use crate::Id;
use std::collections::HashSet;

/// An ordered, duplicate-free sequence of chosen identifiers.
///
/// Alongside the user-visible order, a sorted copy is maintained so the
/// pagination engine can answer rank queries ("how many selected identifiers
/// are `<= x`") in `O(log n)`. The selection is only ever replaced wholesale,
/// so the sorted copy is rebuilt once per replace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    order: Vec<Id>,
    sorted: Vec<Id>,
}

impl Selection {
    /// Builds a selection from `ids`, collapsing duplicates and keeping the
    /// position of each identifier's first occurrence.
    pub fn from_ids(ids: impl IntoIterator<Item = Id>) -> Self {
        let mut seen = HashSet::new();
        let order: Vec<Id> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        let mut sorted = order.clone();
        sorted.sort_unstable();
        Self { order, sorted }
    }

    /// Identifiers in user-defined order.
    pub fn order(&self) -> &[Id] {
        &self.order
    }

    /// Identifiers in ascending order.
    pub fn sorted(&self) -> &[Id] {
        &self.sorted
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: Id) -> bool {
        self.sorted.binary_search(&id).is_ok()
    }

    /// Number of selected identifiers `<= id`.
    pub fn rank(&self, id: Id) -> usize {
        self.sorted.partition_point(|&s| s <= id)
    }
}
