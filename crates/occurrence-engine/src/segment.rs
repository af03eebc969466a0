//! Day segmentation -- split occurrences where they cross midnight or the
//! edges of a period.

use chrono::NaiveTime;

use crate::expander::Occurrence;
use crate::period::{Period, Timed};

/// Split occurrences so that every fragment fits within a single day and
/// within `period`.
///
/// Each occurrence is first clipped to the period, then cut at every
/// midnight strictly inside the clipped range. Fragments keep referring to
/// the original event and come out in chronological order per input
/// occurrence. Fragments that do not intersect `period` are dropped, so an
/// occurrence lying wholly outside it disappears.
///
/// Segmenting already segmented output against the same period returns it
/// unchanged.
pub fn segment_occurrences(period: &Period, occurrences: &[Occurrence]) -> Vec<Occurrence> {
    let mut fragments = Vec::new();

    for occurrence in occurrences {
        let start = match period.begin {
            Some(begin) => occurrence.start.max(begin),
            None => occurrence.start,
        };
        let end = match period.end {
            Some(end) => occurrence.end().min(end),
            None => occurrence.end(),
        };
        if end < start {
            continue;
        }

        let mut cursor = start;
        loop {
            let midnight = cursor
                .date()
                .succ_opt()
                .map(|next| next.and_time(NaiveTime::MIN))
                .filter(|midnight| *midnight < end);
            let fragment_end = midnight.unwrap_or(end);
            let fragment = Occurrence::new(
                cursor,
                fragment_end - cursor,
                occurrence.original.clone(),
            );
            if period.intersects(&fragment) {
                fragments.push(fragment);
            }
            match midnight {
                Some(midnight) => cursor = midnight,
                None => break,
            }
        }
    }

    fragments
}
