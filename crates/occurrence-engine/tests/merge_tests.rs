//! Tests for overlap removal, including property-based invariants.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use occurrence_engine::remove_overlaps;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────────

fn at(hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2005, 4, 13)
        .unwrap()
        .and_hms_opt(hour, min, 0)
        .unwrap()
}

// ── Merging ─────────────────────────────────────────────────────────────────

#[test]
fn empty_input_yields_empty_output() {
    assert!(remove_overlaps::<u32>(Vec::new()).is_empty());
}

#[test]
fn disjoint_ranges_come_back_sorted() {
    assert_eq!(
        remove_overlaps(vec![(10, 12), (1, 3), (5, 7)]),
        vec![(1, 3), (5, 7), (10, 12)]
    );
}

#[test]
fn overlapping_ranges_merge() {
    assert_eq!(remove_overlaps(vec![(1, 5), (3, 8)]), vec![(1, 8)]);
}

#[test]
fn touching_ranges_merge() {
    assert_eq!(remove_overlaps(vec![(5, 7), (7, 12)]), vec![(5, 12)]);
}

#[test]
fn contained_range_is_absorbed() {
    assert_eq!(remove_overlaps(vec![(1, 10), (2, 3), (4, 6)]), vec![(1, 10)]);
}

#[test]
fn chain_of_overlaps_collapses() {
    // Each range only overlaps its neighbour, yet all end up in one.
    assert_eq!(
        remove_overlaps(vec![(6, 9), (1, 3), (2, 5), (4, 7), (20, 21)]),
        vec![(1, 9), (20, 21)]
    );
}

#[test]
fn datetime_ranges_merge() {
    let merged = remove_overlaps(vec![
        (at(14, 0), at(15, 0)),
        (at(9, 0), at(10, 30)),
        (at(10, 0), at(11, 0)),
        (at(15, 0), at(15, 30)),
    ]);

    assert_eq!(
        merged,
        vec![(at(9, 0), at(11, 0)), (at(14, 0), at(15, 30))]
    );
}

// ── Properties ──────────────────────────────────────────────────────────────

fn arb_ranges() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0i64..1_000, 0i64..100), 0..40)
        .prop_map(|pairs| pairs.into_iter().map(|(start, len)| (start, start + len)).collect())
}

fn covered(ranges: &[(i64, i64)], point: i64) -> bool {
    ranges.iter().any(|&(s, e)| s <= point && point < e)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

    #[test]
    fn merged_ranges_are_sorted_and_separated(ranges in arb_ranges()) {
        let merged = remove_overlaps(ranges);
        for pair in merged.windows(2) {
            prop_assert!(pair[0].1 < pair[1].0, "ranges touch or overlap: {:?}", pair);
        }
    }

    #[test]
    fn merging_preserves_coverage(ranges in arb_ranges()) {
        let merged = remove_overlaps(ranges.clone());
        for point in 0..1_100 {
            prop_assert_eq!(covered(&ranges, point), covered(&merged, point), "point {}", point);
        }
    }

    #[test]
    fn merging_is_idempotent(ranges in arb_ranges()) {
        let once = remove_overlaps(ranges);
        let twice = remove_overlaps(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merging_datetimes_keeps_endpoints(ranges in arb_ranges()) {
        let base = at(0, 0);
        let spans: Vec<(NaiveDateTime, NaiveDateTime)> = ranges
            .iter()
            .map(|&(s, e)| (base + Duration::minutes(s), base + Duration::minutes(e)))
            .collect();

        let expected: Vec<(NaiveDateTime, NaiveDateTime)> = remove_overlaps(ranges)
            .into_iter()
            .map(|(s, e)| (base + Duration::minutes(s), base + Duration::minutes(e)))
            .collect();
        prop_assert_eq!(remove_overlaps(spans), expected);
    }
}
