//! Greedy interval partitioning: assign time-overlapping entries of one
//! visual row group to the lowest-numbered free lane. Processing in
//! ascending start order makes the greedy choice optimal, so the lane count
//! equals the maximum number of simultaneously overlapping intervals.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

/// Fallback span for an interval with no end date. Open-ended work must not
/// monopolize every later lane.
const DEFAULT_OPEN_SPAN_DAYS: i64 = 2;

/// One interval to place. `end: None` means open-ended and is treated as
/// `start + DEFAULT_OPEN_SPAN_DAYS`.
#[derive(Debug, Clone, Copy)]
pub struct LaneInterval {
    pub id: Uuid,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

/// Result of packing one row group.
#[derive(Debug, Clone, Default)]
pub struct LaneLayout {
    pub assignment: HashMap<Uuid, usize>,
    pub lane_count: usize,
}

impl LaneLayout {
    pub fn lane_of(&self, id: Uuid) -> usize {
        self.assignment.get(&id).copied().unwrap_or(0)
    }
}

/// Pack `intervals` into lanes. Two intervals may share a lane only when one
/// ends at least `min_gap` before the other starts; anything closer counts
/// as touching and is kept apart.
pub fn pack_lanes(intervals: &[LaneInterval], min_gap: Duration) -> LaneLayout {
    let mut ordered: Vec<(Uuid, NaiveDate, NaiveDate)> = intervals
        .iter()
        .map(|iv| {
            let end = iv
                .end
                .unwrap_or(iv.start + Duration::days(DEFAULT_OPEN_SPAN_DAYS))
                .max(iv.start);
            (iv.id, iv.start, end)
        })
        .collect();
    // Ties broken by id so the packing is deterministic across runs.
    ordered.sort_by_key(|(id, start, _)| (*start, *id));

    let mut layout = LaneLayout::default();
    // Per lane: end date of the last interval placed in it.
    let mut lane_ends: Vec<NaiveDate> = Vec::new();

    for (id, start, end) in ordered {
        // `NaiveDate + Duration` would truncate a sub-day gap, so the gap is
        // compared against the exact date difference instead.
        let lane = lane_ends
            .iter()
            .position(|lane_end| start - *lane_end >= min_gap);
        match lane {
            Some(idx) => {
                lane_ends[idx] = end;
                layout.assignment.insert(id, idx);
            }
            None => {
                lane_ends.push(end);
                layout.assignment.insert(id, lane_ends.len() - 1);
            }
        }
    }
    layout.lane_count = lane_ends.len();
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn iv(id: Uuid, start: NaiveDate, end: NaiveDate) -> LaneInterval {
        LaneInterval {
            id,
            start,
            end: Some(end),
        }
    }

    #[test]
    fn overlapping_pair_takes_two_lanes() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let layout = pack_lanes(
            &[
                iv(a, d(2024, 1, 1), d(2024, 1, 3)),
                iv(b, d(2024, 1, 2), d(2024, 1, 4)),
            ],
            Duration::zero(),
        );
        assert_eq!(layout.lane_of(a), 0);
        assert_eq!(layout.lane_of(b), 1);
        assert_eq!(layout.lane_count, 2);
    }

    #[test]
    fn first_lane_is_reused_after_it_frees_up() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let layout = pack_lanes(
            &[
                iv(a, d(2024, 1, 1), d(2024, 1, 3)),
                iv(b, d(2024, 1, 4), d(2024, 1, 6)),
                iv(c, d(2024, 1, 2), d(2024, 1, 5)),
            ],
            Duration::zero(),
        );
        assert_eq!(layout.lane_of(a), 0);
        assert_eq!(layout.lane_of(b), 0);
        assert_eq!(layout.lane_of(c), 1);
        assert_eq!(layout.lane_count, 2);
    }

    #[test]
    fn min_gap_keeps_touching_intervals_apart() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let pair = [
            iv(a, d(2024, 1, 1), d(2024, 1, 3)),
            iv(b, d(2024, 1, 3), d(2024, 1, 5)),
        ];
        let snug = pack_lanes(&pair, Duration::zero());
        assert_eq!(snug.lane_count, 1);
        let gapped = pack_lanes(&pair, Duration::hours(12));
        assert_eq!(gapped.lane_count, 2);
    }

    #[test]
    fn open_ended_interval_spans_the_default_only() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let layout = pack_lanes(
            &[
                LaneInterval {
                    id: a,
                    start: d(2024, 1, 1),
                    end: None,
                },
                iv(b, d(2024, 1, 10), d(2024, 1, 12)),
            ],
            Duration::zero(),
        );
        // The open interval closed after two days, so b fits back in lane 0.
        assert_eq!(layout.lane_of(b), 0);
        assert_eq!(layout.lane_count, 1);
    }

    /// Brute-force maximum overlap of the gap-padded intervals. A padded
    /// interval covers `at` when it started by then and has not yet been
    /// clear of `at` for at least `gap`.
    fn max_concurrent(spans: &[(NaiveDate, NaiveDate)], gap: Duration) -> usize {
        let mut best = 0;
        for (probe_start, _) in spans {
            let at = *probe_start;
            let n = spans
                .iter()
                .filter(|(s, e)| *s <= at && at - *e < gap)
                .count();
            best = best.max(n);
        }
        best
    }

    proptest! {
        #[test]
        fn lane_count_is_minimal_and_lanes_never_overlap(
            raw in prop::collection::vec((0i64..60, 1i64..10), 1..40)
        ) {
            let gap = Duration::hours(12);
            let intervals: Vec<LaneInterval> = raw
                .iter()
                .map(|(off, len)| {
                    let start = d(2024, 1, 1) + Duration::days(*off);
                    iv(Uuid::new_v4(), start, start + Duration::days(*len))
                })
                .collect();
            let layout = pack_lanes(&intervals, gap);

            // No two intervals in one lane may come within `gap` of each other.
            for x in &intervals {
                for y in &intervals {
                    if x.id != y.id && layout.lane_of(x.id) == layout.lane_of(y.id) {
                        let (xe, ye) = (x.end.unwrap(), y.end.unwrap());
                        let disjoint = y.start - xe >= gap || x.start - ye >= gap;
                        prop_assert!(disjoint, "lane shared by overlapping intervals");
                    }
                }
            }

            let spans: Vec<_> = intervals.iter().map(|i| (i.start, i.end.unwrap())).collect();
            prop_assert_eq!(layout.lane_count, max_concurrent(&spans, gap));
        }
    }
}
