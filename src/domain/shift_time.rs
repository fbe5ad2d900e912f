use crate::domain::models::{EmployeeShift, NewShift, TimeRange};
use crate::domain::time_slots::TimeSlotCatalog;

/// Read access to the time fields of a shift, stored or not yet stored.
pub trait ShiftTiming {
    fn start_time(&self) -> Option<&str>;
    fn end_time(&self) -> Option<&str>;
    fn time_slot(&self) -> Option<&str>;
}

impl ShiftTiming for EmployeeShift {
    fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    fn time_slot(&self) -> Option<&str> {
        self.time_slot.as_deref()
    }
}

impl ShiftTiming for NewShift {
    fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    fn time_slot(&self) -> Option<&str> {
        self.time_slot.as_deref()
    }
}

/// Effective start/end of a shift.
///
/// An explicit `start_time`/`end_time` pair wins over `time_slot`; a slot id
/// missing from the catalog resolves like an absent one, to an empty range.
pub fn resolve_shift_time_range<S: ShiftTiming + ?Sized>(
    shift: &S,
    catalog: &TimeSlotCatalog,
) -> TimeRange {
    let explicit_start = shift.start_time().filter(|value| !value.is_empty());
    let explicit_end = shift.end_time().filter(|value| !value.is_empty());
    if let (Some(start), Some(end)) = (explicit_start, explicit_end) {
        return TimeRange::new(start, end);
    }

    shift
        .time_slot()
        .filter(|slot_id| !slot_id.is_empty())
        .map(|slot_id| catalog.time_range_from_slot_id(slot_id))
        .unwrap_or_else(TimeRange::empty)
}

/// True iff the resolved end lies strictly after the resolved start on the
/// same day. A span past midnight is invalid here; overnight work is stored
/// as one record per date.
pub fn is_valid_shift_duration<S: ShiftTiming + ?Sized>(
    shift: &S,
    catalog: &TimeSlotCatalog,
) -> bool {
    let range = resolve_shift_time_range(shift, catalog);
    is_valid_time_range(&range.start_time, &range.end_time)
}

pub fn is_valid_time_range(start_time: &str, end_time: &str) -> bool {
    if start_time.is_empty() || end_time.is_empty() {
        return false;
    }
    match (time_to_minutes(start_time), time_to_minutes(end_time)) {
        (Some(start), Some(end)) => end > start,
        _ => false,
    }
}

pub fn time_to_minutes(value: &str) -> Option<u32> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours = hours.parse::<u32>().ok()?;
    let minutes = minutes.parse::<u32>().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

pub fn minutes_to_time(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
