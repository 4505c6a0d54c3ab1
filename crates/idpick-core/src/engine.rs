//! Virtual pagination over the complement of a [`Selection`].
//!
//! The unselected view is never materialized. Its enumeration order is fixed:
//! the dense range ascending, then the extras ascending. `offset` always
//! refers to a position in that enumeration as it stands at query time, which
//! keeps infinite-scroll continuation stable while the selection changes.
//!
//! ## Strategies
//!
//! - **Unfiltered**: the `k`-th unselected dense identifier is located with a
//!   binary search over the sorted selection, then the page is walked forward
//!   skipping selected identifiers. `total` is closed form. Cost is
//!   `O(log s + limit + skipped)` plus a linear pass over the extras.
//! - **Filtered**: a linear scan of the enumeration. Every identifier has to
//!   be tested to produce an exact `total`. Filters containing anything but
//!   ASCII digits cannot match a decimal identifier and short-circuit.

use crate::{Domain, Id, Selection};
use serde::{Deserialize, Serialize};

/// One window of the unselected view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// At most `limit` identifiers, starting at the requested offset.
    pub items: Vec<Id>,
    /// Size of the whole filtered, unselected set.
    pub total: u64,
}

/// Returns `true` if the decimal text of `id` contains `filter`.
///
/// An empty filter matches everything.
pub fn matches(filter: &str, id: Id) -> bool {
    if filter.is_empty() {
        return true;
    }
    let needle = filter.as_bytes();
    let digits = Decimal::new(id);
    digits
        .as_bytes()
        .windows(needle.len())
        .any(|window| window == needle)
}

/// Computes one page of the unselected view.
///
/// `filter` is matched as-is; callers are expected to trim it first.
pub fn page(
    domain: &Domain,
    selection: &Selection,
    filter: &str,
    offset: u64,
    limit: usize,
) -> Page {
    if filter.is_empty() {
        unfiltered(domain, selection, offset, limit)
    } else if filter.bytes().all(|b| b.is_ascii_digit()) {
        filtered(domain, selection, filter, offset, limit)
    } else {
        Page::default()
    }
}

fn unfiltered(domain: &Domain, selection: &Selection, offset: u64, limit: usize) -> Page {
    let max_id = domain.max_id();
    let dense_selected = selection.rank(max_id);
    let dense_free = max_id - dense_selected as u64;
    let extra_selected = selection.len() - dense_selected;
    let extra_free = (domain.extra_count() as u64).saturating_sub(extra_selected as u64);
    let total = dense_free + extra_free;

    let mut items = Vec::with_capacity(limit.min(total.saturating_sub(offset) as usize));

    let extra_offset = if offset < dense_free {
        let selected = &selection.sorted()[..dense_selected];
        let (mut id, mut cursor) = nth_unselected(selected, offset);
        while items.len() < limit && id <= max_id {
            if selected.get(cursor) == Some(&id) {
                cursor += 1;
            } else {
                items.push(id);
            }
            id += 1;
        }
        0
    } else {
        offset - dense_free
    };

    if items.len() < limit {
        let remaining = limit - items.len();
        items.extend(
            domain
                .extras()
                .filter(|&id| !selection.contains(id))
                .skip(usize::try_from(extra_offset).unwrap_or(usize::MAX))
                .take(remaining),
        );
    }

    Page { items, total }
}

fn filtered(
    domain: &Domain,
    selection: &Selection,
    filter: &str,
    offset: u64,
    limit: usize,
) -> Page {
    let max_id = domain.max_id();
    let selected = &selection.sorted()[..selection.rank(max_id)];
    let mut items = Vec::with_capacity(limit.min(64));
    let mut total = 0_u64;

    let mut visit = |id: Id| {
        if matches(filter, id) {
            if total >= offset && items.len() < limit {
                items.push(id);
            }
            total += 1;
        }
    };

    let mut cursor = 0;
    for id in 1..=max_id {
        if selected.get(cursor) == Some(&id) {
            cursor += 1;
            continue;
        }
        visit(id);
    }
    for id in domain.extras() {
        if !selection.contains(id) {
            visit(id);
        }
    }

    Page { items, total }
}

/// Locates the `k`-th (0-based) unselected identifier of the dense range.
///
/// `selected` must be sorted ascending and contain only dense identifiers.
/// Returns the identifier and the index of the first selected identifier
/// greater than it.
///
/// `selected[i] - i` is non-decreasing, and it is the count of unselected
/// identifiers `<= selected[i]` plus one. The answer sits after every
/// selected identifier with `selected[i] - i <= k + 1`.
fn nth_unselected(selected: &[Id], k: u64) -> (Id, usize) {
    let target = k + 1;
    let (mut lo, mut hi) = (0, selected.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if selected[mid] - mid as u64 <= target {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    (target + lo as u64, lo)
}

/// Stack-allocated decimal rendering of an identifier.
struct Decimal {
    buf: [u8; 20],
    start: usize,
}

impl Decimal {
    fn new(mut id: Id) -> Self {
        let mut buf = [0_u8; 20];
        let mut start = buf.len();
        loop {
            start -= 1;
            buf[start] = b'0' + (id % 10) as u8;
            id /= 10;
            if id == 0 {
                break;
            }
        }
        Self { buf, start }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[self.start..]
    }
}

#[cfg(test)]
mod tests;
