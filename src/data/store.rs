//! The external entry source. The engine only ever sees the two operations
//! on [`EntryStore`]; everything behind them (file layout, future remote
//! backends) is replaceable.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{EntryKind, Milestones, TimelineEntry};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid store file: {0}")]
    Format(#[from] serde_json::Error),
    #[error("unknown entry {0}")]
    UnknownEntry(Uuid),
}

/// Boundary contract to the persistence layer.
pub trait EntryStore {
    /// Snapshot of all entries to render. May be called at any time.
    fn list_entries(&self) -> Result<Vec<TimelineEntry>, StoreError>;

    /// Persist new dates for one entry. Called exactly once per completed
    /// reschedule gesture.
    fn update_entry_dates(
        &mut self,
        id: Uuid,
        new_start: NaiveDate,
        new_end: NaiveDate,
    ) -> Result<(), StoreError>;
}

/// Raw row as found in a store file. Dates come in as strings so one bad row
/// can be skipped without aborting the rest of the load.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    id: Option<Uuid>,
    kind: EntryKind,
    title: String,
    start: String,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    milestones: Option<RawMilestones>,
    #[serde(default)]
    parent_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMilestones {
    #[serde(default)]
    chassis_delivery: Option<String>,
    #[serde(default)]
    body_delivery: Option<String>,
    #[serde(default)]
    customer_handover: Option<String>,
    #[serde(default)]
    deadline: Option<String>,
    #[serde(default)]
    service_end: Option<String>,
}

/// Parse a calendar date from the handful of serializations the source data
/// uses. Full timestamps are truncated to the day.
fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    None
}

fn opt_day(raw: &Option<String>) -> Option<NaiveDate> {
    raw.as_deref().and_then(parse_day)
}

impl RawEntry {
    /// Convert a raw row, or explain why it must be skipped.
    fn into_entry(self) -> Result<TimelineEntry, String> {
        let start = parse_day(&self.start)
            .ok_or_else(|| format!("unparsable start date '{}'", self.start))?;
        let end = match &self.end {
            Some(raw) => {
                parse_day(raw).ok_or_else(|| format!("unparsable end date '{raw}'"))?
            }
            None => start,
        };
        let m = self.milestones.unwrap_or_default();
        let mut entry = TimelineEntry {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            kind: self.kind,
            title: self.title,
            start,
            end,
            created: opt_day(&self.created),
            milestones: Milestones {
                chassis_delivery: opt_day(&m.chassis_delivery),
                body_delivery: opt_day(&m.body_delivery),
                customer_handover: opt_day(&m.customer_handover),
                deadline: opt_day(&m.deadline),
                service_end: opt_day(&m.service_end),
            },
            parent_id: self.parent_id,
        };
        entry.normalize();
        Ok(entry)
    }
}

/// JSON-file-backed store, the default backend for the desktop app.
pub struct JsonStore {
    path: Option<PathBuf>,
    entries: Vec<TimelineEntry>,
}

impl JsonStore {
    /// Start from the generated demo fleet, not yet tied to a file.
    pub fn sample() -> Self {
        Self {
            path: None,
            entries: sample_fleet(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load a store file. Rows with unparsable dates are skipped with a
    /// warning; they never abort the rest of the set.
    pub fn load(path: PathBuf) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let raw: Vec<RawEntry> = serde_json::from_str(&text)?;
        let total = raw.len();
        let mut entries = Vec::with_capacity(total);
        for row in raw {
            match row.into_entry() {
                Ok(entry) => entries.push(entry),
                Err(reason) => warn!("skipping entry row: {reason}"),
            }
        }
        info!("loaded {} of {} entries from {}", entries.len(), total, path.display());
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    pub fn save_as(&mut self, path: PathBuf) -> Result<(), StoreError> {
        self.path = Some(path);
        self.save()
    }

    fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        info!("saved {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }
}

impl EntryStore for JsonStore {
    fn list_entries(&self) -> Result<Vec<TimelineEntry>, StoreError> {
        Ok(self.entries.clone())
    }

    fn update_entry_dates(
        &mut self,
        id: Uuid,
        new_start: NaiveDate,
        new_end: NaiveDate,
    ) -> Result<(), StoreError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::UnknownEntry(id))?;
        entry.start = new_start;
        entry.end = new_end;
        entry.normalize();
        self.save()
    }
}

/// Demo fleet used before a store file is opened: two projects with
/// milestones, production orders under the first, and deliberately
/// overlapping service visits so the lane stacking is visible.
pub fn sample_fleet() -> Vec<TimelineEntry> {
    let today = chrono::Local::now().date_naive();
    let day = chrono::Duration::days;

    let mut bus_12 = TimelineEntry::new(
        EntryKind::Project,
        "Bus 12 — Airport shuttle",
        today - day(20),
        today + day(45),
    );
    bus_12.created = Some(today - day(20));
    bus_12.milestones = Milestones {
        chassis_delivery: Some(today - day(5)),
        body_delivery: Some(today + day(4)),
        customer_handover: Some(today + day(40)),
        deadline: Some(today + day(45)),
        ..Default::default()
    };

    let mut chassis_po = TimelineEntry::new(
        EntryKind::Production,
        "PO-1041 Chassis prep",
        today - day(5),
        today + day(6),
    );
    chassis_po.parent_id = Some(bus_12.id);
    let mut body_po = TimelineEntry::new(
        EntryKind::Production,
        "PO-1042 Body fitting",
        today + day(2),
        today + day(16),
    );
    body_po.parent_id = Some(bus_12.id);
    let mut electrics_po = TimelineEntry::new(
        EntryKind::Production,
        "PO-1043 Electrics",
        today + day(4),
        today + day(12),
    );
    electrics_po.parent_id = Some(bus_12.id);

    let mut truck_7 = TimelineEntry::new(
        EntryKind::Project,
        "Truck 7 — Refrigerated box",
        today - day(2),
        today + day(70),
    );
    truck_7.created = Some(today - day(2));
    truck_7.milestones = Milestones {
        chassis_delivery: Some(today + day(14)),
        deadline: Some(today + day(70)),
        ..Default::default()
    };

    let mut visit_a = TimelineEntry::new(
        EntryKind::Service,
        "Service — Unit 31 brake check",
        today + day(1),
        today + day(3),
    );
    visit_a.milestones.service_end = Some(today + day(3));
    let mut visit_b = TimelineEntry::new(
        EntryKind::Service,
        "Service — Unit 18 tachograph",
        today + day(2),
        today + day(4),
    );
    visit_b.milestones.service_end = Some(today + day(4));
    // No recorded end: the engine gives it the default service span.
    let visit_c = TimelineEntry::new(
        EntryKind::Service,
        "Service — Unit 44 inspection",
        today + day(8),
        today + day(8),
    );

    vec![
        bus_12, chassis_po, body_po, electrics_po, truck_7, visit_a, visit_b, visit_c,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_day_accepts_timestamps_and_truncates() {
        let want = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_day("2024-03-05"), Some(want));
        assert_eq!(parse_day("05.03.2024"), Some(want));
        assert_eq!(parse_day("2024-03-05T14:30:00Z"), Some(want));
        assert_eq!(parse_day("2024-03-05T14:30:00+01:00"), Some(want));
        assert_eq!(parse_day("not a date"), None);
    }

    #[test]
    fn malformed_row_is_skipped_not_fatal() {
        let raw = RawEntry {
            id: None,
            kind: EntryKind::Project,
            title: "broken".into(),
            start: "soon".into(),
            end: None,
            created: None,
            milestones: None,
            parent_id: None,
        };
        assert!(raw.into_entry().is_err());
    }

    #[test]
    fn raw_entry_normalizes_reversed_dates() {
        let raw = RawEntry {
            id: None,
            kind: EntryKind::Production,
            title: "reversed".into(),
            start: "2024-04-10".into(),
            end: Some("2024-04-01".into()),
            created: None,
            milestones: None,
            parent_id: None,
        };
        let entry = raw.into_entry().unwrap();
        assert!(entry.start <= entry.end);
    }

    #[test]
    fn sample_fleet_has_overlapping_service_visits() {
        let entries = sample_fleet();
        let services: Vec<_> = entries
            .iter()
            .filter(|e| e.kind == EntryKind::Service)
            .collect();
        assert!(services.len() >= 2);
        assert!(services
            .iter()
            .any(|a| services.iter().any(|b| a.id != b.id && a.start <= b.end && b.start <= a.end)));
    }

    #[test]
    fn update_unknown_entry_reports_error() {
        let mut store = JsonStore::sample();
        let id = Uuid::new_v4();
        let today = chrono::Local::now().date_naive();
        assert!(matches!(
            store.update_entry_dates(id, today, today),
            Err(StoreError::UnknownEntry(_))
        ));
    }
}
