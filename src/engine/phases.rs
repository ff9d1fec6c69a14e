//! Milestone-driven phase derivation for entry bars.
//!
//! Phases are colored sub-intervals computed from the milestone dates, never
//! stored. A missing milestone silently skips exactly the phases that depend
//! on it; it is never substituted with today's date.

use chrono::{Duration, NaiveDate};

use crate::model::{EntryKind, TimelineEntry};

/// Fixed post-delivery assembly window.
const ASSEMBLY_BUFFER_DAYS: i64 = 14;
/// Fixed review window appended after assembly.
const REVIEW_BUFFER_DAYS: i64 = 7;
/// Span of a service visit with no recorded end milestone.
const SERVICE_DEFAULT_DAYS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseLabel {
    Initiation,
    Preparation,
    Assembly,
    Review,
    Service,
}

impl PhaseLabel {
    pub fn name(self) -> &'static str {
        match self {
            PhaseLabel::Initiation => "Initiation",
            PhaseLabel::Preparation => "Preparation",
            PhaseLabel::Assembly => "Assembly",
            PhaseLabel::Review => "Review",
            PhaseLabel::Service => "Service",
        }
    }
}

/// One derived sub-interval of an entry's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub label: PhaseLabel,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Compute the ordered phase list for an entry.
pub fn derive_phases(entry: &TimelineEntry) -> Vec<Phase> {
    match entry.kind {
        EntryKind::Service => service_phases(entry),
        EntryKind::Project => project_phases(entry),
        // Production orders are plain bars with no milestone semantics.
        EntryKind::Production => Vec::new(),
    }
}

fn service_phases(entry: &TimelineEntry) -> Vec<Phase> {
    let end = entry
        .milestones
        .service_end
        .unwrap_or(entry.start + Duration::days(SERVICE_DEFAULT_DAYS))
        .max(entry.start);
    vec![Phase {
        label: PhaseLabel::Service,
        start: entry.start,
        end,
    }]
}

fn project_phases(entry: &TimelineEntry) -> Vec<Phase> {
    let m = &entry.milestones;
    let mut phases = Vec::new();

    // Initiation runs from the creation anchor to the earliest milestone,
    // and only when the anchor actually precedes it.
    if let (Some(created), Some(earliest)) = (entry.created, m.earliest()) {
        if created < earliest {
            phases.push(Phase {
                label: PhaseLabel::Initiation,
                start: created,
                end: earliest,
            });
        }
    }

    // Preparation spans the two delivery milestones in whichever order they
    // occur; it needs both.
    if let (Some(chassis), Some(body)) = (m.chassis_delivery, m.body_delivery) {
        phases.push(Phase {
            label: PhaseLabel::Preparation,
            start: chassis.min(body),
            end: chassis.max(body),
        });
    }

    // Fixed assembly + review buffers chained after the later delivery.
    // These model the standard post-delivery window and are emitted whenever
    // any delivery milestone exists, independent of real-world progress.
    if let Some(delivered) = m.last_delivery() {
        let assembly_end = delivered + Duration::days(ASSEMBLY_BUFFER_DAYS);
        phases.push(Phase {
            label: PhaseLabel::Assembly,
            start: delivered,
            end: assembly_end,
        });
        phases.push(Phase {
            label: PhaseLabel::Review,
            start: assembly_end,
            end: assembly_end + Duration::days(REVIEW_BUFFER_DAYS),
        });
    }

    phases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Milestones;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn project(created: Option<NaiveDate>, milestones: Milestones) -> TimelineEntry {
        let mut e = TimelineEntry::new(EntryKind::Project, "P", d(2024, 1, 1), d(2024, 6, 1));
        e.created = created;
        e.milestones = milestones;
        e
    }

    fn labels(phases: &[Phase]) -> Vec<PhaseLabel> {
        phases.iter().map(|p| p.label).collect()
    }

    #[test]
    fn full_milestone_set_yields_all_project_phases() {
        let e = project(
            Some(d(2024, 1, 5)),
            Milestones {
                chassis_delivery: Some(d(2024, 2, 10)),
                body_delivery: Some(d(2024, 2, 1)),
                customer_handover: Some(d(2024, 4, 1)),
                deadline: Some(d(2024, 4, 15)),
                ..Default::default()
            },
        );
        let phases = derive_phases(&e);
        assert_eq!(
            labels(&phases),
            vec![
                PhaseLabel::Initiation,
                PhaseLabel::Preparation,
                PhaseLabel::Assembly,
                PhaseLabel::Review,
            ]
        );
        // Preparation takes min..max of the deliveries regardless of order.
        assert_eq!(phases[1].start, d(2024, 2, 1));
        assert_eq!(phases[1].end, d(2024, 2, 10));
        // 14-day assembly from the later delivery, then 7-day review.
        assert_eq!(phases[2].start, d(2024, 2, 10));
        assert_eq!(phases[2].end, d(2024, 2, 24));
        assert_eq!(phases[3].start, d(2024, 2, 24));
        assert_eq!(phases[3].end, d(2024, 3, 2));
    }

    #[test]
    fn missing_body_delivery_skips_preparation_only() {
        let e = project(
            Some(d(2024, 1, 5)),
            Milestones {
                chassis_delivery: Some(d(2024, 2, 10)),
                ..Default::default()
            },
        );
        assert_eq!(
            labels(&derive_phases(&e)),
            vec![PhaseLabel::Initiation, PhaseLabel::Assembly, PhaseLabel::Review]
        );
    }

    #[test]
    fn anchor_after_first_milestone_emits_no_initiation() {
        let e = project(
            Some(d(2024, 3, 1)),
            Milestones {
                chassis_delivery: Some(d(2024, 2, 10)),
                ..Default::default()
            },
        );
        assert!(!labels(&derive_phases(&e)).contains(&PhaseLabel::Initiation));
    }

    #[test]
    fn no_milestones_means_no_phases() {
        let e = project(Some(d(2024, 1, 5)), Milestones::default());
        assert!(derive_phases(&e).is_empty());
    }

    #[test]
    fn service_phase_defaults_its_end() {
        let mut e = TimelineEntry::new(EntryKind::Service, "S", d(2024, 5, 1), d(2024, 5, 1));
        let phases = derive_phases(&e);
        assert_eq!(
            phases,
            vec![Phase {
                label: PhaseLabel::Service,
                start: d(2024, 5, 1),
                end: d(2024, 5, 3),
            }]
        );

        e.milestones.service_end = Some(d(2024, 5, 6));
        assert_eq!(derive_phases(&e)[0].end, d(2024, 5, 6));
    }

    #[test]
    fn production_entries_have_no_phases() {
        let e = TimelineEntry::new(EntryKind::Production, "PO", d(2024, 1, 1), d(2024, 2, 1));
        assert!(derive_phases(&e).is_empty());
    }
}
