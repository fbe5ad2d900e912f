//! Multi-day ("day-crossing") shifts.
//!
//! A shift running past midnight is stored as one record per covered date.
//! Every record carries a notes suffix such as `[day-crossing:origin]`, and
//! records written by this crate also carry an explicit [`SeriesLink`].
//! Lookup prefers the series id and falls back to matching the tag-stripped
//! notes, which is the only link older records have.

use crate::domain::models::{
    DayCrossingSeriesId, Employee, EmployeeShift, NewShift, SeriesLink, SeriesPosition,
    ShiftStatus, parse_date, validate_hhmm, validate_non_empty,
};
use chrono::Days;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

const TAG_NAME: &str = "day-crossing";
const DAY_FIRST_MINUTE: &str = "00:00";
const DAY_LAST_MINUTE: &str = "23:59";
const MAX_SERIES_DAYS: u64 = 31;

static DAY_CROSSING_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\[day-crossing:(origin|terminal|day-\d+)\]\s*$")
        .expect("valid day-crossing tag pattern")
});

pub fn day_crossing_tag(position: SeriesPosition) -> String {
    format!("[{TAG_NAME}:{}]", position.as_tag_value())
}

pub fn tag_notes(base_notes: &str, position: SeriesPosition) -> String {
    let base = base_notes.trim();
    let tag = day_crossing_tag(position);
    if base.is_empty() {
        tag
    } else {
        format!("{base} {tag}")
    }
}

pub fn has_day_crossing_tag(notes: &str) -> bool {
    DAY_CROSSING_TAG.is_match(notes)
}

pub fn parse_day_crossing_tag(notes: &str) -> Option<SeriesPosition> {
    DAY_CROSSING_TAG
        .captures(notes)
        .and_then(|captures| captures.get(1))
        .and_then(|value| SeriesPosition::parse_tag_value(value.as_str()))
}

/// Notes as the user wrote them, without the day-crossing suffix.
pub fn strip_day_crossing_tag(notes: &str) -> String {
    DAY_CROSSING_TAG.replace(notes, "").into_owned()
}

/// Every tagged shift of `employee_id` whose stripped notes equal
/// `base_notes` exactly, ordered by date.
///
/// Two unrelated series with identical notes are indistinguishable here;
/// use [`series_members`] when the records carry a series id.
pub fn get_related_day_crossing_shifts<'a>(
    employees: &'a [Employee],
    employee_id: &str,
    base_notes: &str,
) -> Vec<&'a EmployeeShift> {
    employees
        .iter()
        .find(|employee| employee.id == employee_id)
        .map(|employee| related_by_notes(employee, base_notes))
        .unwrap_or_default()
}

fn related_by_notes<'a>(employee: &'a Employee, base_notes: &str) -> Vec<&'a EmployeeShift> {
    let mut related = employee
        .shifts
        .iter()
        .filter(|shift| {
            shift.notes.as_deref().is_some_and(|notes| {
                has_day_crossing_tag(notes) && strip_day_crossing_tag(notes) == base_notes
            })
        })
        .collect::<Vec<_>>();
    related.sort_by(|left, right| left.date.cmp(&right.date));
    related
}

pub fn series_members(employee: &Employee, series_id: DayCrossingSeriesId) -> Vec<&EmployeeShift> {
    let mut members = employee
        .shifts
        .iter()
        .filter(|shift| shift.series.is_some_and(|link| link.series_id == series_id))
        .collect::<Vec<_>>();
    members.sort_by(|left, right| left.date.cmp(&right.date));
    members
}

/// The whole series `shift` belongs to, itself included. Empty when the
/// shift is not part of a day-crossing series.
pub fn related_shifts_of<'a>(employee: &'a Employee, shift: &EmployeeShift) -> Vec<&'a EmployeeShift> {
    if let Some(link) = shift.series {
        return series_members(employee, link.series_id);
    }
    match shift.notes.as_deref() {
        Some(notes) if has_day_crossing_tag(notes) => {
            related_by_notes(employee, &strip_day_crossing_tag(notes))
        }
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCrossingSeries {
    pub id: DayCrossingSeriesId,
    pub employee_id: String,
    pub base_notes: String,
    pub start_date: String,
    pub end_date: String,
}

/// Day-crossing series keyed by id. Ids are allocated above every id seen
/// so far and are never reused, even after a series is removed.
#[derive(Debug, Clone, Default)]
pub struct DayCrossingSeriesTable {
    entries: BTreeMap<DayCrossingSeriesId, DayCrossingSeries>,
    next_id: u64,
}

impl DayCrossingSeriesTable {
    /// Rebuilds the table from the series links found on stored shifts.
    pub fn rebuild<'a>(employees: impl IntoIterator<Item = &'a Employee>) -> Self {
        let mut table = Self::default();
        for employee in employees {
            for shift in &employee.shifts {
                let Some(link) = shift.series else {
                    continue;
                };
                table.next_id = table.next_id.max(link.series_id.0.saturating_add(1));
                let entry = table
                    .entries
                    .entry(link.series_id)
                    .or_insert_with(|| DayCrossingSeries {
                        id: link.series_id,
                        employee_id: shift.employee_id.clone(),
                        base_notes: shift
                            .notes
                            .as_deref()
                            .map(strip_day_crossing_tag)
                            .unwrap_or_default(),
                        start_date: shift.date.clone(),
                        end_date: shift.date.clone(),
                    });
                if shift.date < entry.start_date {
                    entry.start_date = shift.date.clone();
                }
                if shift.date > entry.end_date {
                    entry.end_date = shift.date.clone();
                }
            }
        }
        table
    }

    pub fn allocate(
        &mut self,
        employee_id: &str,
        base_notes: &str,
        start_date: &str,
        end_date: &str,
    ) -> DayCrossingSeriesId {
        let id = DayCrossingSeriesId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.entries.insert(
            id,
            DayCrossingSeries {
                id,
                employee_id: employee_id.to_string(),
                base_notes: base_notes.to_string(),
                start_date: start_date.to_string(),
                end_date: end_date.to_string(),
            },
        );
        id
    }

    pub fn get(&self, id: DayCrossingSeriesId) -> Option<&DayCrossingSeries> {
        self.entries.get(&id)
    }

    pub fn remove(&mut self, id: DayCrossingSeriesId) -> Option<DayCrossingSeries> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn for_employee<'a>(
        &'a self,
        employee_id: &'a str,
    ) -> impl Iterator<Item = &'a DayCrossingSeries> {
        self.entries
            .values()
            .filter(move |series| series.employee_id == employee_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCrossingRequest {
    pub employee_id: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub status: ShiftStatus,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
}

/// Splits a span ending on a later date into one record per covered date:
/// the origin runs from `start_time` to 23:59, middle days cover the whole
/// day and the terminal runs from 00:00 to `end_time`.
pub fn plan_day_crossing_shift(
    request: &DayCrossingRequest,
    series_id: Option<DayCrossingSeriesId>,
) -> Result<Vec<NewShift>, String> {
    validate_non_empty(&request.employee_id, "day_crossing.employee_id")?;
    validate_hhmm(&request.start_time, "day_crossing.start_time")?;
    validate_hhmm(&request.end_time, "day_crossing.end_time")?;
    let start_date = parse_date(&request.start_date)
        .ok_or_else(|| "day_crossing.start_date must be YYYY-MM-DD".to_string())?;
    let end_date = parse_date(&request.end_date)
        .ok_or_else(|| "day_crossing.end_date must be YYYY-MM-DD".to_string())?;
    if end_date <= start_date {
        return Err("day_crossing.end_date must be after day_crossing.start_date".to_string());
    }
    if request.start_time.as_str() >= DAY_LAST_MINUTE {
        return Err("day_crossing.start_time must be before 23:59".to_string());
    }
    if request.end_time.as_str() <= DAY_FIRST_MINUTE {
        return Err("day_crossing.end_time must be after 00:00".to_string());
    }

    let span_days = (end_date - start_date).num_days() as u64 + 1;
    if span_days > MAX_SERIES_DAYS {
        return Err(format!(
            "day-crossing shift spans {span_days} days, limit is {MAX_SERIES_DAYS}"
        ));
    }

    let base_notes = request
        .notes
        .as_deref()
        .map(strip_day_crossing_tag)
        .unwrap_or_default();

    let mut planned = Vec::with_capacity(span_days as usize);
    for offset in 0..span_days {
        let date = start_date
            .checked_add_days(Days::new(offset))
            .ok_or_else(|| "day-crossing shift runs past the supported calendar".to_string())?;
        let (position, start_time, end_time) = if offset == 0 {
            (SeriesPosition::Origin, request.start_time.as_str(), DAY_LAST_MINUTE)
        } else if offset + 1 == span_days {
            (SeriesPosition::Terminal, DAY_FIRST_MINUTE, request.end_time.as_str())
        } else {
            (
                SeriesPosition::Day(offset as u32 + 1),
                DAY_FIRST_MINUTE,
                DAY_LAST_MINUTE,
            )
        };

        planned.push(NewShift {
            employee_id: request.employee_id.clone(),
            date: date.format("%Y-%m-%d").to_string(),
            start_time: Some(start_time.to_string()),
            end_time: Some(end_time.to_string()),
            time_slot: None,
            status: request.status,
            customer_name: request.customer_name.clone(),
            notes: Some(tag_notes(&base_notes, position)),
            series: series_id.map(|series_id| SeriesLink {
                series_id,
                position,
            }),
        });
    }
    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(start_date: &str, end_date: &str) -> DayCrossingRequest {
        DayCrossingRequest {
            employee_id: "emp-yamada".to_string(),
            start_date: start_date.to_string(),
            start_time: "22:00".to_string(),
            end_date: end_date.to_string(),
            end_time: "06:00".to_string(),
            status: ShiftStatus::Working,
            customer_name: None,
            notes: Some("Night haul to Osaka".to_string()),
        }
    }

    fn employee_with(shifts: Vec<NewShift>) -> Employee {
        let mut employee = Employee::new("emp-yamada", "Yamada", "driver");
        employee.shifts = shifts
            .into_iter()
            .enumerate()
            .map(|(index, shift)| shift.into_shift(format!("sft-{index}")))
            .collect();
        employee
    }

    #[test]
    fn strip_removes_only_the_suffix() {
        assert_eq!(
            strip_day_crossing_tag("Night haul [day-crossing:origin]"),
            "Night haul"
        );
        assert_eq!(strip_day_crossing_tag("Night haul [day-crossing:day-2]"), "Night haul");
        assert_eq!(strip_day_crossing_tag("[day-crossing:terminal]"), "");
        assert_eq!(
            strip_day_crossing_tag("[day-crossing:origin] in the middle"),
            "[day-crossing:origin] in the middle"
        );
        assert_eq!(strip_day_crossing_tag("plain note"), "plain note");
    }

    #[test]
    fn parse_reads_the_position() {
        assert_eq!(
            parse_day_crossing_tag("x [day-crossing:day-4]"),
            Some(SeriesPosition::Day(4))
        );
        assert_eq!(parse_day_crossing_tag("x"), None);
    }

    #[test]
    fn plan_splits_three_day_span() {
        let planned = plan_day_crossing_shift(
            &request("2025-03-10", "2025-03-12"),
            Some(DayCrossingSeriesId(7)),
        )
        .expect("valid span");

        assert_eq!(planned.len(), 3);
        assert_eq!(planned[0].date, "2025-03-10");
        assert_eq!(planned[0].start_time.as_deref(), Some("22:00"));
        assert_eq!(planned[0].end_time.as_deref(), Some("23:59"));
        assert_eq!(
            planned[0].notes.as_deref(),
            Some("Night haul to Osaka [day-crossing:origin]")
        );
        assert_eq!(planned[1].notes.as_deref(), Some("Night haul to Osaka [day-crossing:day-2]"));
        assert_eq!(planned[1].start_time.as_deref(), Some("00:00"));
        assert_eq!(planned[2].date, "2025-03-12");
        assert_eq!(planned[2].end_time.as_deref(), Some("06:00"));
        assert_eq!(
            planned[2].series,
            Some(SeriesLink {
                series_id: DayCrossingSeriesId(7),
                position: SeriesPosition::Terminal,
            })
        );
    }

    #[test]
    fn plan_rejects_same_day_and_midnight_end() {
        assert!(plan_day_crossing_shift(&request("2025-03-10", "2025-03-10"), None).is_err());

        let mut midnight = request("2025-03-10", "2025-03-11");
        midnight.end_time = "00:00".to_string();
        assert!(plan_day_crossing_shift(&midnight, None).is_err());
    }

    #[test]
    fn plan_does_not_double_tag_notes() {
        let mut tagged = request("2025-03-10", "2025-03-11");
        tagged.notes = Some("Night haul [day-crossing:origin]".to_string());
        let planned = plan_day_crossing_shift(&tagged, None).expect("valid span");
        assert_eq!(planned[1].notes.as_deref(), Some("Night haul [day-crossing:terminal]"));
    }

    #[test]
    fn related_lookup_matches_stripped_notes_exactly() {
        let mut shifts = plan_day_crossing_shift(&request("2025-03-10", "2025-03-11"), None)
            .expect("valid span");
        shifts.push(NewShift::with_times(
            "emp-yamada",
            "2025-03-10",
            "09:00",
            "12:00",
            ShiftStatus::Working,
        )
        .with_notes(Some("Night haul to Osaka".to_string())));
        let employees = vec![employee_with(shifts)];

        let related =
            get_related_day_crossing_shifts(&employees, "emp-yamada", "Night haul to Osaka");
        assert_eq!(related.len(), 2);
        assert!(
            related
                .iter()
                .all(|shift| shift.notes.as_deref().is_some_and(has_day_crossing_tag))
        );

        assert!(get_related_day_crossing_shifts(&employees, "emp-yamada", "Night haul").is_empty());
        assert!(get_related_day_crossing_shifts(&employees, "emp-other", "Night haul to Osaka").is_empty());
    }

    #[test]
    fn related_lookup_is_empty_without_day_crossing_shifts() {
        let employees = vec![employee_with(vec![NewShift::in_slot(
            "emp-yamada",
            "2025-03-10",
            "slot-09",
            ShiftStatus::Working,
        )])];
        assert!(get_related_day_crossing_shifts(&employees, "emp-yamada", "").is_empty());
    }

    #[test]
    fn series_id_separates_series_with_identical_notes() {
        let mut shifts = plan_day_crossing_shift(
            &request("2025-03-10", "2025-03-11"),
            Some(DayCrossingSeriesId(0)),
        )
        .expect("first series");
        shifts.extend(
            plan_day_crossing_shift(
                &request("2025-03-20", "2025-03-21"),
                Some(DayCrossingSeriesId(1)),
            )
            .expect("second series"),
        );
        let employee = employee_with(shifts);
        let origin = &employee.shifts[0];

        let by_series = related_shifts_of(&employee, origin);
        assert_eq!(by_series.len(), 2);
        assert!(by_series.iter().all(|shift| shift.date.starts_with("2025-03-1")));

        let mut untracked = origin.clone();
        untracked.series = None;
        assert_eq!(related_shifts_of(&employee, &untracked).len(), 4);
    }

    #[test]
    fn series_table_allocates_and_rebuilds() {
        let mut table = DayCrossingSeriesTable::default();
        let first = table.allocate("emp-yamada", "Night haul", "2025-03-10", "2025-03-11");
        let second = table.allocate("emp-yamada", "Night haul", "2025-03-20", "2025-03-21");
        assert_ne!(first, second);
        assert_eq!(table.len(), 2);
        assert!(table.remove(first).is_some());
        assert!(table.get(first).is_none());
        assert_eq!(table.len(), 1);

        let shifts = plan_day_crossing_shift(
            &request("2025-03-10", "2025-03-12"),
            Some(DayCrossingSeriesId(3)),
        )
        .expect("valid span");
        let employee = employee_with(shifts);
        let rebuilt = DayCrossingSeriesTable::rebuild([&employee]);
        let series = rebuilt.get(DayCrossingSeriesId(3)).expect("rebuilt series");
        assert_eq!(series.start_date, "2025-03-10");
        assert_eq!(series.end_date, "2025-03-12");
        assert_eq!(series.base_notes, "Night haul to Osaka");
        assert_eq!(rebuilt.for_employee("emp-yamada").count(), 1);
    }

    #[test]
    fn rebuild_handles_sparse_and_huge_ids() {
        let huge = DayCrossingSeriesId(u64::MAX - 1);
        let mut shifts = plan_day_crossing_shift(&request("2025-03-10", "2025-03-11"), Some(huge))
            .expect("valid span");
        shifts.extend(
            plan_day_crossing_shift(
                &request("2025-04-01", "2025-04-02"),
                Some(DayCrossingSeriesId(40)),
            )
            .expect("valid span"),
        );
        let employee = employee_with(shifts);

        let mut rebuilt = DayCrossingSeriesTable::rebuild([&employee]);
        assert_eq!(rebuilt.len(), 2);
        assert!(rebuilt.get(huge).is_some());
        let next = rebuilt.allocate("emp-yamada", "Return trip", "2025-05-01", "2025-05-02");
        assert_ne!(next, huge);
        assert_ne!(next, DayCrossingSeriesId(40));
        assert_eq!(rebuilt.len(), 3);
    }

    proptest! {
        #[test]
        fn tagging_then_stripping_returns_trimmed_base(
            base in "[A-Za-z0-9 ,.]{0,24}",
            day in 2u32..30u32
        ) {
            for position in [SeriesPosition::Origin, SeriesPosition::Day(day), SeriesPosition::Terminal] {
                let tagged = tag_notes(&base, position);
                prop_assert_eq!(strip_day_crossing_tag(&tagged), base.trim());
                prop_assert_eq!(parse_day_crossing_tag(&tagged), Some(position));
            }
        }
    }
}
