use super::*;

fn domain_with(max_id: Id, extras: &[Id]) -> Domain {
    let mut domain = Domain::new(max_id);
    for &id in extras {
        domain.admit_extra(id).unwrap();
    }
    domain
}

/// Reference enumeration: walks the entire domain.
fn brute_force(domain: &Domain, selection: &Selection, filter: &str) -> Vec<Id> {
    (1..=domain.max_id())
        .chain(domain.extras())
        .filter(|&id| !selection.contains(id) && matches(filter, id))
        .collect()
}

#[test]
fn unfiltered_page_skips_selected() {
    let domain = domain_with(10, &[]);
    let selection = Selection::from_ids([2, 4]);
    let page = page(&domain, &selection, "", 0, 3);
    assert_eq!(page.items, vec![1, 3, 5]);
    assert_eq!(page.total, 8);
}

#[test]
fn substring_filter_matches_decimal_text() {
    let domain = domain_with(10, &[]);
    let page = page(&domain, &Selection::default(), "1", 0, 10);
    assert_eq!(page.items, vec![1, 10]);
    assert_eq!(page.total, 2);
}

#[test]
fn full_page_equals_reference_enumeration() {
    let domain = domain_with(50, &[77, 51, 1_000]);
    let selection = Selection::from_ids([50, 1, 77, 13, 14, 15, 49]);
    let expected = brute_force(&domain, &selection, "");
    let total = page(&domain, &selection, "", 0, 0).total;
    assert_eq!(total, expected.len() as u64);

    let full = page(&domain, &selection, "", 0, total as usize);
    assert_eq!(full.items, expected);
    assert_eq!(*full.items.last().unwrap(), 1_000);
}

#[test]
fn every_window_agrees_with_reference() {
    let domain = domain_with(40, &[41, 55, 90]);
    let selection = Selection::from_ids([3, 1, 2, 20, 21, 40, 55, 39]);

    for filter in ["", "1", "5", "40"] {
        let expected = brute_force(&domain, &selection, filter);
        for offset in 0..=expected.len() + 2 {
            for limit in [0, 1, 3, 7, 100] {
                let got = page(&domain, &selection, filter, offset as u64, limit);
                let want: Vec<Id> = expected.iter().copied().skip(offset).take(limit).collect();
                assert_eq!(got.items, want, "filter={filter:?} offset={offset} limit={limit}");
                assert_eq!(got.total, expected.len() as u64);
                assert!(got.items.len() <= limit);
            }
        }
    }
}

#[test]
fn offset_past_the_end_returns_empty_items_with_total() {
    let domain = domain_with(10, &[20]);
    let selection = Selection::from_ids([5]);
    let page = page(&domain, &selection, "", 100, 5);
    assert!(page.items.is_empty());
    assert_eq!(page.total, 10);
}

#[test]
fn zero_limit_still_counts() {
    let domain = domain_with(10, &[]);
    let unfiltered = page(&domain, &Selection::default(), "", 0, 0);
    assert!(unfiltered.items.is_empty());
    assert_eq!(unfiltered.total, 10);

    let filtered = page(&domain, &Selection::default(), "1", 0, 0);
    assert!(filtered.items.is_empty());
    assert_eq!(filtered.total, 2);
}

#[test]
fn empty_dense_range_pages_extras_only() {
    let domain = domain_with(0, &[9, 3]);
    let page = page(&domain, &Selection::default(), "", 0, 10);
    assert_eq!(page.items, vec![3, 9]);
    assert_eq!(page.total, 2);
}

#[test]
fn page_continues_from_dense_into_extras() {
    let domain = domain_with(5, &[8, 6, 7]);
    let selection = Selection::from_ids([5, 7]);
    let page = page(&domain, &selection, "", 3, 3);
    assert_eq!(page.items, vec![4, 6, 8]);
    assert_eq!(page.total, 6);
}

#[test]
fn deep_offset_in_a_large_dense_range() {
    let domain = domain_with(1_000_000, &[]);
    let selection = Selection::from_ids((1..=1_000).map(|i| i * 2));
    // Unselected: 1,3,5,...,1999 (1000 ids) then 2001, 2002, ...
    let page = page(&domain, &selection, "", 999, 3);
    assert_eq!(page.items, vec![1_999, 2_001, 2_002]);
    assert_eq!(page.total, 999_000);
}

#[test]
fn non_digit_filter_never_matches() {
    let domain = domain_with(100, &[]);
    let page = page(&domain, &Selection::default(), "1a", 0, 10);
    assert_eq!(page, Page::default());
}

#[test]
fn nth_unselected_jumps_over_selected_runs() {
    let selected = [2, 4];
    assert_eq!(nth_unselected(&selected, 0), (1, 0));
    assert_eq!(nth_unselected(&selected, 1), (3, 1));
    assert_eq!(nth_unselected(&selected, 2), (5, 2));
    assert_eq!(nth_unselected(&[1, 2, 3], 0), (4, 3));
    assert_eq!(nth_unselected(&[], 9), (10, 0));
}

#[test]
fn matches_is_contiguous_substring() {
    assert!(matches("", 7));
    assert!(matches("23", 1234));
    assert!(!matches("24", 1234));
    assert!(matches("1234", 1234));
    assert!(!matches("12345", 1234));
}
