//! Drag-to-reschedule state machine for entry bars.
//!
//! `Idle -> (Moving | ResizingStart | ResizingEnd) -> Idle`, driven by
//! abstract pointer x-coordinates so it can be exercised without a rendering
//! surface. Pixel deltas become whole-day deltas through the viewport
//! day-width; the caller renders the preview dates while the gesture is live
//! and commits (or reverts) the released result.

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

/// Total pointer travel below which a release counts as a click, not a drag.
const CLICK_THRESHOLD_PX: f32 = 4.0;

/// Which part of the bar was grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabKind {
    Move,
    ResizeStart,
    ResizeEnd,
}

/// Transient gesture state; exists only while the pointer button is held.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub entry_id: Uuid,
    pub kind: GrabKind,
    origin_x: f32,
    start_at_grab: NaiveDate,
    end_at_grab: NaiveDate,
}

/// What a completed gesture amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Displacement stayed under the click threshold: navigation intent.
    Click { entry_id: Uuid },
    /// The gesture produced new dates to persist. `prev_*` are the dates at
    /// gesture start, kept for rollback when the commit fails.
    Commit {
        entry_id: Uuid,
        new_start: NaiveDate,
        new_end: NaiveDate,
        prev_start: NaiveDate,
        prev_end: NaiveDate,
    },
    /// A real drag that settled back on the original dates.
    Unchanged,
}

/// One controller per viewport; at most one bar gesture at a time.
#[derive(Debug, Clone, Default)]
pub struct DragReschedule {
    session: Option<DragSession>,
}

impl DragReschedule {
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Id of the entry under gesture, if any. Used to route external entry
    /// refreshes around the in-flight preview.
    pub fn active_entry(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.entry_id)
    }

    /// Begin a gesture, replacing any previous session.
    pub fn begin(
        &mut self,
        entry_id: Uuid,
        kind: GrabKind,
        pointer_x: f32,
        start: NaiveDate,
        end: NaiveDate,
    ) {
        self.session = Some(DragSession {
            entry_id,
            kind,
            origin_x: pointer_x,
            start_at_grab: start,
            end_at_grab: end,
        });
    }

    /// Dates the bar should preview for the current pointer position. The
    /// source of truth is never touched here.
    pub fn preview(&self, pointer_x: f32, day_width: f32) -> Option<(NaiveDate, NaiveDate)> {
        let s = self.session.as_ref()?;
        Some(apply_delta(s, delta_days(s, pointer_x, day_width)))
    }

    /// Finish the gesture and report what it was.
    pub fn release(&mut self, pointer_x: f32, day_width: f32) -> ReleaseOutcome {
        let Some(s) = self.session.take() else {
            return ReleaseOutcome::Unchanged;
        };
        if (pointer_x - s.origin_x).abs() < CLICK_THRESHOLD_PX {
            return ReleaseOutcome::Click {
                entry_id: s.entry_id,
            };
        }
        let (new_start, new_end) = apply_delta(&s, delta_days(&s, pointer_x, day_width));
        if new_start == s.start_at_grab && new_end == s.end_at_grab {
            return ReleaseOutcome::Unchanged;
        }
        ReleaseOutcome::Commit {
            entry_id: s.entry_id,
            new_start,
            new_end,
            prev_start: s.start_at_grab,
            prev_end: s.end_at_grab,
        }
    }

    /// Abandon the gesture without producing an outcome.
    pub fn cancel(&mut self) {
        self.session = None;
    }
}

fn delta_days(s: &DragSession, pointer_x: f32, day_width: f32) -> i64 {
    ((pointer_x - s.origin_x) / day_width.max(f32::EPSILON)).round() as i64
}

/// Apply a whole-day delta to the grabbed edge(s), keeping the duration at
/// one day minimum: the moving edge is clamped, never the anchored one.
fn apply_delta(s: &DragSession, days: i64) -> (NaiveDate, NaiveDate) {
    let delta = Duration::days(days);
    match s.kind {
        GrabKind::Move => (s.start_at_grab + delta, s.end_at_grab + delta),
        GrabKind::ResizeStart => {
            let new_start = (s.start_at_grab + delta).min(s.end_at_grab - Duration::days(1));
            (new_start, s.end_at_grab)
        }
        GrabKind::ResizeEnd => {
            let new_end = (s.end_at_grab + delta).max(s.start_at_grab + Duration::days(1));
            (s.start_at_grab, new_end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn begin(kind: GrabKind) -> (DragReschedule, Uuid) {
        let id = Uuid::new_v4();
        let mut drag = DragReschedule::default();
        drag.begin(id, kind, 100.0, d(2024, 3, 1), d(2024, 3, 5));
        (drag, id)
    }

    #[test]
    fn move_by_three_day_widths_commits_shifted_dates() {
        let (mut drag, id) = begin(GrabKind::Move);
        // 20 px per day, dragged exactly 3 days to the right.
        assert_eq!(
            drag.release(160.0, 20.0),
            ReleaseOutcome::Commit {
                entry_id: id,
                new_start: d(2024, 3, 4),
                new_end: d(2024, 3, 8),
                prev_start: d(2024, 3, 1),
                prev_end: d(2024, 3, 5),
            }
        );
        assert!(!drag.is_active());
    }

    #[test]
    fn resize_start_clamps_to_one_day_floor() {
        let (mut drag, id) = begin(GrabKind::ResizeStart);
        // +6 days is more than the available duration; the start edge stops
        // one day short of the end.
        assert_eq!(
            drag.release(220.0, 20.0),
            ReleaseOutcome::Commit {
                entry_id: id,
                new_start: d(2024, 3, 4),
                new_end: d(2024, 3, 5),
                prev_start: d(2024, 3, 1),
                prev_end: d(2024, 3, 5),
            }
        );
    }

    #[test]
    fn resize_end_never_crosses_the_start() {
        let (mut drag, _) = begin(GrabKind::ResizeEnd);
        let outcome = drag.release(100.0 - 20.0 * 30.0, 20.0);
        match outcome {
            ReleaseOutcome::Commit {
                new_start, new_end, ..
            } => {
                assert_eq!(new_start, d(2024, 3, 1));
                assert_eq!(new_end, d(2024, 3, 2));
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn tiny_displacement_is_a_click() {
        let (mut drag, id) = begin(GrabKind::Move);
        assert_eq!(drag.release(102.5, 20.0), ReleaseOutcome::Click { entry_id: id });
    }

    #[test]
    fn real_drag_landing_on_origin_is_unchanged() {
        let (mut drag, _) = begin(GrabKind::Move);
        // 7 px at 20 px/day: past the click threshold, rounds to zero days.
        assert_eq!(drag.release(107.0, 20.0), ReleaseOutcome::Unchanged);
    }

    #[test]
    fn preview_shifts_without_committing() {
        let (drag, _) = begin(GrabKind::Move);
        assert_eq!(
            drag.preview(140.0, 20.0),
            Some((d(2024, 3, 3), d(2024, 3, 7)))
        );
        assert!(drag.is_active());
    }

    #[test]
    fn cancel_discards_the_session() {
        let (mut drag, _) = begin(GrabKind::Move);
        drag.cancel();
        assert_eq!(drag.release(500.0, 20.0), ReleaseOutcome::Unchanged);
    }
}
