use crate::domain::duplicate::{DuplicateStatus, check_duplicate, overlapping_shift_ids};
use crate::domain::models::{EmployeeShift, NewShift, ShiftStatus, ShiftTemplate};
use crate::domain::shift_time::is_valid_time_range;
use crate::domain::time_slots::TimeSlotCatalog;
use crate::infrastructure::error::ScheduleError;
use crate::infrastructure::shift_repository::ShiftMutations;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkAssignmentRequest {
    pub employee_id: String,
    pub dates: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    pub notes: Option<String>,
}

impl BulkAssignmentRequest {
    /// Copies employee, times and notes from the template. The generated
    /// shifts keep no link to it.
    pub fn from_template(template: &ShiftTemplate, dates: Vec<String>) -> Self {
        Self {
            employee_id: template.employee_id.clone(),
            dates,
            start_time: template.start_time.clone(),
            end_time: template.end_time.clone(),
            notes: template.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignmentOutcome {
    pub success_count: usize,
    pub skip_count: usize,
}

impl BulkAssignmentOutcome {
    pub fn summary(&self) -> String {
        match (self.success_count, self.skip_count) {
            (0, 0) => "No dates were assigned".to_string(),
            (success, 0) => format!("Assigned {success} date(s)"),
            (0, skipped) => format!("Skipped {skipped} date(s) already covered"),
            (success, skipped) => format!(
                "Assigned {success} date(s), skipped {skipped} date(s) already covered"
            ),
        }
    }
}

/// Dates between `from` and `to` (inclusive) falling on one of the
/// template's weekdays.
pub fn expand_template_dates(template: &ShiftTemplate, from: NaiveDate, to: NaiveDate) -> Vec<String> {
    from.iter_days()
        .take_while(|date| *date <= to)
        .filter(|date| template.applies_on(date.weekday()))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .collect()
}

/// Applies one time range to every requested date, in the given order.
///
/// Each date is classified against `snapshot`, the employee's shifts as
/// they were before the run, so a date listed twice is assigned twice.
/// Fully covered dates are skipped; partially covered dates have their
/// overlapping shifts removed first. One `working` shift is added per
/// catalog slot inside the range.
pub fn assign_bulk<M: ShiftMutations + ?Sized>(
    catalog: &TimeSlotCatalog,
    snapshot: &[EmployeeShift],
    request: &BulkAssignmentRequest,
    mutations: &M,
) -> Result<BulkAssignmentOutcome, ScheduleError> {
    if !is_valid_time_range(&request.start_time, &request.end_time) {
        return Err(ScheduleError::InvalidRequest(format!(
            "bulk range {}-{} is not a valid shift duration",
            request.start_time, request.end_time
        )));
    }
    let slot_ids = catalog.slot_ids_within(&request.start_time, &request.end_time);
    if slot_ids.is_empty() {
        return Err(ScheduleError::InvalidRequest(format!(
            "bulk range {}-{} contains no time slot",
            request.start_time, request.end_time
        )));
    }

    let mut outcome = BulkAssignmentOutcome::default();
    for date in &request.dates {
        let status = check_duplicate(snapshot, &request.employee_id, date, &slot_ids, catalog);
        match status {
            DuplicateStatus::Full => {
                tracing::debug!(employee_id = %request.employee_id, date = %date, "bulk skip: already covered");
                outcome.skip_count += 1;
                continue;
            }
            DuplicateStatus::Partial => {
                let overlapping =
                    overlapping_shift_ids(snapshot, &request.employee_id, date, &slot_ids, catalog);
                mutations.delete_multiple_shifts(&request.employee_id, &overlapping)?;
            }
            DuplicateStatus::None => {}
        }

        for slot_id in &slot_ids {
            let shift = NewShift::in_slot(
                request.employee_id.clone(),
                date.clone(),
                slot_id.clone(),
                ShiftStatus::Working,
            )
            .with_notes(request.notes.clone());
            mutations.add_shift(&request.employee_id, shift)?;
        }
        tracing::debug!(
            employee_id = %request.employee_id,
            date = %date,
            duplicate = status.as_str(),
            slots = slot_ids.len(),
            "bulk assigned"
        );
        outcome.success_count += 1;
    }
    Ok(outcome)
}
