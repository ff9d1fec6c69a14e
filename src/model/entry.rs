use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of schedulable item an entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A fleet project (vehicle build) with milestone-driven phases.
    Project,
    /// A production order, usually nested under a project.
    Production,
    /// A service visit; overlapping visits share the service row via lanes.
    Service,
}

/// Named milestone dates attached to project and service entries.
///
/// Absent milestones are simply skipped by phase derivation; they are never
/// defaulted to "today".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestones {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chassis_delivery: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_delivery: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_handover: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    /// End of the service window (service entries only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_end: Option<NaiveDate>,
}

impl Milestones {
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> {
        [
            self.chassis_delivery,
            self.body_delivery,
            self.customer_handover,
            self.deadline,
            self.service_end,
        ]
        .into_iter()
        .flatten()
    }

    /// Earliest milestone that is actually set.
    pub fn earliest(&self) -> Option<NaiveDate> {
        self.iter().min()
    }

    /// Later of the two delivery milestones, if at least one is set.
    pub fn last_delivery(&self) -> Option<NaiveDate> {
        match (self.chassis_delivery, self.body_delivery) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// One schedulable item on the timeline.
///
/// Entries are owned by the external store; the engine only ever produces
/// `(id, new_start, new_end)` deltas back through the commit path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: Uuid,
    pub kind: EntryKind,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Creation/closing anchor used as the start of the initiation phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Milestones::is_empty")]
    pub milestones: Milestones,
    /// Grouping parent (production order under a project). Drives
    /// expand/collapse only, never lane packing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

impl TimelineEntry {
    pub fn new(
        kind: EntryKind,
        title: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        let mut entry = Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            start,
            end,
            created: None,
            milestones: Milestones::default(),
            parent_id: None,
        };
        entry.normalize();
        entry
    }

    /// Enforce `end >= start` by swapping a reversed pair. A consumer that
    /// supplies a negative-width interval gets it corrected, not rendered.
    pub fn normalize(&mut self) {
        if self.end < self.start {
            std::mem::swap(&mut self.start, &mut self.end);
        }
    }

    /// Duration in whole days, floored to 1 so the bar stays visible and
    /// draggable.
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reversed_interval_is_swapped() {
        let e = TimelineEntry::new(EntryKind::Project, "P", d(2024, 3, 10), d(2024, 3, 1));
        assert_eq!(e.start, d(2024, 3, 1));
        assert_eq!(e.end, d(2024, 3, 10));
    }

    #[test]
    fn zero_duration_floors_to_one_day() {
        let e = TimelineEntry::new(EntryKind::Service, "S", d(2024, 1, 5), d(2024, 1, 5));
        assert_eq!(e.duration_days(), 1);
    }

    #[test]
    fn earliest_milestone_skips_absent_dates() {
        let m = Milestones {
            body_delivery: Some(d(2024, 5, 1)),
            deadline: Some(d(2024, 4, 1)),
            ..Default::default()
        };
        assert_eq!(m.earliest(), Some(d(2024, 4, 1)));
        assert_eq!(m.last_delivery(), Some(d(2024, 5, 1)));
        assert_eq!(Milestones::default().earliest(), None);
    }

    #[test]
    fn dates_serialize_as_iso_days() {
        let e = TimelineEntry::new(EntryKind::Project, "P", d(2024, 3, 1), d(2024, 3, 5));
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"2024-03-01\""));
        assert!(json.contains("\"2024-03-05\""));
    }
}
