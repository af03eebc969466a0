//! Interval merging -- collapse overlapping or touching ranges.

/// Merge overlapping or adjacent `(start, end)` ranges.
///
/// Ranges are sorted by start, then swept: a range whose start is at or
/// before the current end extends it, otherwise the current range is emitted.
/// The result is sorted, pairwise disjoint, has no touching neighbours, and
/// covers exactly the union of the input.
///
/// ```
/// use occurrence_engine::remove_overlaps;
///
/// assert_eq!(remove_overlaps(vec![(5, 7), (7, 12)]), vec![(5, 12)]);
/// assert_eq!(remove_overlaps(vec![(14, 18), (5, 10), (7, 12)]), vec![(5, 12), (14, 18)]);
/// ```
pub fn remove_overlaps<T: Ord + Copy>(mut ranges: Vec<(T, T)>) -> Vec<(T, T)> {
    if ranges.is_empty() {
        return ranges;
    }

    // Sort by start time (then by end for stability).
    ranges.sort_unstable();

    let mut merged: Vec<(T, T)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                // Overlapping or adjacent: extend the current range.
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
}
