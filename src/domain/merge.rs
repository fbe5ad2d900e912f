use crate::domain::models::{Employee, EmployeeShift, ShiftStatus, TimeRange};
use crate::domain::shift_time::resolve_shift_time_range;
use crate::domain::time_slots::TimeSlotCatalog;
use serde::Serialize;

/// A run of back-to-back shifts with the same status, drawn as one bar.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MergedBlock {
    pub start_time: String,
    pub end_time: String,
    pub status: ShiftStatus,
    pub shift_ids: Vec<String>,
}

impl MergedBlock {
    pub fn first_shift_id(&self) -> Option<&str> {
        self.shift_ids.first().map(String::as_str)
    }

    pub fn last_shift_id(&self) -> Option<&str> {
        self.shift_ids.last().map(String::as_str)
    }
}

// Shifts without resolvable bounds never take part in merging.
fn resolved_for_date<'a>(
    employee: &'a Employee,
    date: &'a str,
    catalog: &TimeSlotCatalog,
) -> Vec<(&'a EmployeeShift, TimeRange)> {
    let mut resolved = employee
        .shifts_on(date)
        .map(|shift| (shift, resolve_shift_time_range(shift, catalog)))
        .filter(|(_, range)| !range.is_unresolved())
        .collect::<Vec<_>>();
    // "HH:MM" is fixed width, so string order is time order.
    resolved.sort_by(|(_, left), (_, right)| left.start_time.cmp(&right.start_time));
    resolved
}

/// True when at least one pair of adjacent shifts on `date` shares a status
/// and touches with no gap.
pub fn needs_merging(employee: &Employee, date: &str, catalog: &TimeSlotCatalog) -> bool {
    let resolved = resolved_for_date(employee, date, catalog);
    if resolved.len() < 2 {
        return false;
    }
    resolved.windows(2).any(|pair| {
        let (first, first_range) = &pair[0];
        let (second, second_range) = &pair[1];
        first.status == second.status && first_range.end_time == second_range.start_time
    })
}

pub fn merged_blocks(employee: &Employee, date: &str, catalog: &TimeSlotCatalog) -> Vec<MergedBlock> {
    let mut blocks: Vec<MergedBlock> = Vec::new();
    for (shift, range) in resolved_for_date(employee, date, catalog) {
        if let Some(last) = blocks.last_mut() {
            if last.status == shift.status && last.end_time == range.start_time {
                last.end_time = range.end_time;
                last.shift_ids.push(shift.id.clone());
                continue;
            }
        }
        blocks.push(MergedBlock {
            start_time: range.start_time,
            end_time: range.end_time,
            status: shift.status,
            shift_ids: vec![shift.id.clone()],
        });
    }
    blocks
}
