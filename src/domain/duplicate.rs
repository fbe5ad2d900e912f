use crate::domain::models::{EmployeeShift, TimeRange};
use crate::domain::shift_time::{resolve_shift_time_range, time_to_minutes};
use crate::domain::time_slots::TimeSlotCatalog;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateStatus {
    None,
    Partial,
    Full,
}

impl DuplicateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Partial => "partial",
            Self::Full => "full",
        }
    }
}

/// Slot ids a stored shift occupies: its `time_slot`, or, for a shift with
/// explicit times, every catalog slot its range intersects.
pub fn occupied_slot_ids(shift: &EmployeeShift, catalog: &TimeSlotCatalog) -> Vec<String> {
    if let Some(slot_id) = shift.time_slot.as_deref().filter(|slot| !slot.is_empty()) {
        let explicit = shift.start_time.is_some() && shift.end_time.is_some();
        if !explicit {
            return vec![slot_id.to_string()];
        }
    }
    let range = resolve_shift_time_range(shift, catalog);
    if range.is_unresolved() {
        return Vec::new();
    }
    catalog.slot_ids_overlapping(&range.start_time, &range.end_time)
}

fn existing_slot_ids<'a>(
    shifts: &'a [EmployeeShift],
    employee_id: &'a str,
    date: &'a str,
    catalog: &'a TimeSlotCatalog,
) -> impl Iterator<Item = (&'a EmployeeShift, Vec<String>)> {
    shifts
        .iter()
        .filter(move |shift| shift.employee_id == employee_id && shift.date == date)
        .map(move |shift| (shift, occupied_slot_ids(shift, catalog)))
}

/// Classifies how much of `time_slot_ids` is already taken by the
/// employee's shifts on `date`. An empty candidate set is always `None`.
pub fn check_duplicate(
    shifts: &[EmployeeShift],
    employee_id: &str,
    date: &str,
    time_slot_ids: &[String],
    catalog: &TimeSlotCatalog,
) -> DuplicateStatus {
    let candidates = time_slot_ids
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>();
    if candidates.is_empty() {
        return DuplicateStatus::None;
    }

    let occupied = existing_slot_ids(shifts, employee_id, date, catalog)
        .flat_map(|(_, slot_ids)| slot_ids)
        .collect::<HashSet<_>>();
    let overlap = candidates
        .iter()
        .filter(|candidate| occupied.contains(**candidate))
        .count();

    if overlap == 0 {
        DuplicateStatus::None
    } else if overlap == candidates.len() {
        DuplicateStatus::Full
    } else {
        DuplicateStatus::Partial
    }
}

/// Ids of the employee's shifts on `date` that occupy at least one of the
/// candidate slots.
pub fn overlapping_shift_ids(
    shifts: &[EmployeeShift],
    employee_id: &str,
    date: &str,
    time_slot_ids: &[String],
    catalog: &TimeSlotCatalog,
) -> Vec<String> {
    let candidates = time_slot_ids
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>();
    existing_slot_ids(shifts, employee_id, date, catalog)
        .filter(|(_, slot_ids)| {
            slot_ids
                .iter()
                .any(|slot_id| candidates.contains(slot_id.as_str()))
        })
        .map(|(shift, _)| shift.id.clone())
        .collect()
}

/// Ids of the employee's shifts on `date` whose resolved range shares time
/// with `range`, leaving out `exclude_id`. Touching bounds do not conflict;
/// an unresolvable `range` conflicts with nothing.
pub fn conflicting_shift_ids(
    shifts: &[EmployeeShift],
    employee_id: &str,
    date: &str,
    range: &TimeRange,
    exclude_id: Option<&str>,
    catalog: &TimeSlotCatalog,
) -> Vec<String> {
    let (Some(start), Some(end)) = (
        time_to_minutes(&range.start_time),
        time_to_minutes(&range.end_time),
    ) else {
        return Vec::new();
    };
    shifts
        .iter()
        .filter(|shift| shift.employee_id == employee_id && shift.date == date)
        .filter(|shift| exclude_id != Some(shift.id.as_str()))
        .filter(|shift| {
            let existing = resolve_shift_time_range(*shift, catalog);
            match (
                time_to_minutes(&existing.start_time),
                time_to_minutes(&existing.end_time),
            ) {
                (Some(existing_start), Some(existing_end)) => {
                    existing_start < end && start < existing_end
                }
                _ => false,
            }
        })
        .map(|shift| shift.id.clone())
        .collect()
}
