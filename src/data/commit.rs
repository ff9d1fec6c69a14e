//! Optimistic reschedule commits.
//!
//! The working entry set is updated before the store is asked to persist, so
//! the bar lands where the user dropped it immediately. A store failure
//! reverts the working copy to the pre-gesture dates; the view must never be
//! left showing a position no source of truth agrees with.

use chrono::NaiveDate;
use log::warn;
use uuid::Uuid;

use crate::data::store::{EntryStore, StoreError};
use crate::model::TimelineEntry;

/// Apply a completed reschedule gesture to `entries` and persist it through
/// `store`. On failure the entry is rolled back and the error returned for
/// the host UI to surface.
#[allow(clippy::too_many_arguments)]
pub fn commit_reschedule(
    store: &mut dyn EntryStore,
    entries: &mut [TimelineEntry],
    id: Uuid,
    new_start: NaiveDate,
    new_end: NaiveDate,
    prev_start: NaiveDate,
    prev_end: NaiveDate,
) -> Result<(), StoreError> {
    let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
        return Err(StoreError::UnknownEntry(id));
    };

    entry.start = new_start;
    entry.end = new_end;
    entry.normalize();

    if let Err(err) = store.update_entry_dates(id, new_start, new_end) {
        warn!("reschedule of {id} failed, reverting: {err}");
        entry.start = prev_start;
        entry.end = prev_end;
        return Err(err);
    }
    Ok(())
}

/// Reconcile a fresh snapshot from the store with the working set.
/// External writes win for every entry except the one with a live gesture,
/// whose local preview dates are preserved until the gesture resolves.
pub fn merge_refresh(
    working: &mut Vec<TimelineEntry>,
    fresh: Vec<TimelineEntry>,
    in_flight: Option<Uuid>,
) {
    let preserved = in_flight.and_then(|id| {
        working
            .iter()
            .find(|e| e.id == id)
            .map(|e| (e.id, e.start, e.end))
    });
    *working = fresh;
    if let Some((id, start, end)) = preserved {
        if let Some(entry) = working.iter_mut().find(|e| e.id == id) {
            entry.start = start;
            entry.end = end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryKind;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Store double that can be told to reject updates.
    struct FlakyStore {
        fail: bool,
        committed: Vec<(Uuid, NaiveDate, NaiveDate)>,
    }

    impl EntryStore for FlakyStore {
        fn list_entries(&self) -> Result<Vec<TimelineEntry>, StoreError> {
            Ok(Vec::new())
        }

        fn update_entry_dates(
            &mut self,
            id: Uuid,
            new_start: NaiveDate,
            new_end: NaiveDate,
        ) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::UnknownEntry(id));
            }
            self.committed.push((id, new_start, new_end));
            Ok(())
        }
    }

    fn working_entry() -> TimelineEntry {
        TimelineEntry::new(EntryKind::Project, "P", d(2024, 3, 1), d(2024, 3, 5))
    }

    #[test]
    fn successful_commit_updates_entry_and_store() {
        let mut store = FlakyStore {
            fail: false,
            committed: Vec::new(),
        };
        let mut entries = vec![working_entry()];
        let id = entries[0].id;

        commit_reschedule(
            &mut store,
            &mut entries,
            id,
            d(2024, 3, 4),
            d(2024, 3, 8),
            d(2024, 3, 1),
            d(2024, 3, 5),
        )
        .unwrap();

        assert_eq!(entries[0].start, d(2024, 3, 4));
        assert_eq!(entries[0].end, d(2024, 3, 8));
        assert_eq!(store.committed, vec![(id, d(2024, 3, 4), d(2024, 3, 8))]);
    }

    #[test]
    fn failed_commit_rolls_back_to_pre_gesture_dates() {
        let mut store = FlakyStore {
            fail: true,
            committed: Vec::new(),
        };
        let mut entries = vec![working_entry()];
        let id = entries[0].id;

        let result = commit_reschedule(
            &mut store,
            &mut entries,
            id,
            d(2024, 3, 4),
            d(2024, 3, 8),
            d(2024, 3, 1),
            d(2024, 3, 5),
        );

        assert!(result.is_err());
        assert_eq!(entries[0].start, d(2024, 3, 1));
        assert_eq!(entries[0].end, d(2024, 3, 5));
        assert!(store.committed.is_empty());
    }

    #[test]
    fn refresh_preserves_only_the_in_flight_entry() {
        let mut a = working_entry();
        let b = TimelineEntry::new(EntryKind::Service, "S", d(2024, 4, 1), d(2024, 4, 2));
        // Local preview has moved `a` while its gesture is live.
        a.start = d(2024, 3, 10);
        a.end = d(2024, 3, 14);
        let mut working = vec![a.clone(), b.clone()];

        let mut fresh_a = a.clone();
        fresh_a.start = d(2024, 3, 1);
        fresh_a.end = d(2024, 3, 5);
        let mut fresh_b = b.clone();
        fresh_b.title = "S (renamed externally)".into();

        merge_refresh(&mut working, vec![fresh_a, fresh_b], Some(a.id));

        // Gesture entry keeps its preview dates, everything else takes the
        // external write.
        assert_eq!(working[0].start, d(2024, 3, 10));
        assert_eq!(working[1].title, "S (renamed externally)");

        // With no gesture in flight the external write wins everywhere.
        let mut working2 = vec![a.clone()];
        let mut fresh2 = a.clone();
        fresh2.start = d(2024, 3, 1);
        merge_refresh(&mut working2, vec![fresh2], None);
        assert_eq!(working2[0].start, d(2024, 3, 1));
    }
}
