use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Status of a single shift record. `Working` is the confirmed value that
/// bulk assignment and drag-to-create always produce.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Working,
    Tentative,
    Off,
    Leave,
}

impl ShiftStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::Tentative => "tentative",
            Self::Off => "off",
            Self::Leave => "leave",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "working" => Some(Self::Working),
            "tentative" => Some(Self::Tentative),
            "off" => Some(Self::Off),
            "leave" => Some(Self::Leave),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    pub id: String,
    pub label: String,
    pub start: String,
    pub end: String,
}

impl TimeSlot {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "time_slot.id")?;
        validate_hhmm(&self.start, "time_slot.start")?;
        validate_hhmm(&self.end, "time_slot.end")?;
        if self.end <= self.start {
            return Err(format!(
                "time_slot.end must be after time_slot.start ({})",
                self.id
            ));
        }
        Ok(())
    }
}

/// Resolved start/end of a shift. Both fields are empty when the shift
/// carries neither an explicit pair nor a known time slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TimeRange {
    pub start_time: String,
    pub end_time: String,
}

impl TimeRange {
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_unresolved(&self) -> bool {
        self.start_time.is_empty() || self.end_time.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DayCrossingSeriesId(pub u64);

/// Place of one record inside a day-crossing series. `Day(k)` counts from
/// the origin, which is day 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SeriesPosition {
    Origin,
    Day(u32),
    Terminal,
}

impl SeriesPosition {
    pub fn as_tag_value(self) -> String {
        match self {
            Self::Origin => "origin".to_string(),
            Self::Day(day) => format!("day-{day}"),
            Self::Terminal => "terminal".to_string(),
        }
    }

    pub fn parse_tag_value(value: &str) -> Option<Self> {
        match value.trim() {
            "origin" => Some(Self::Origin),
            "terminal" => Some(Self::Terminal),
            other => other
                .strip_prefix("day-")
                .and_then(|day| day.parse::<u32>().ok())
                .map(Self::Day),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeriesLink {
    pub series_id: DayCrossingSeriesId,
    pub position: SeriesPosition,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmployeeShift {
    pub id: String,
    pub employee_id: String,
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_slot: Option<String>,
    pub status: ShiftStatus,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesLink>,
}

impl EmployeeShift {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "shift.id")?;
        validate_non_empty(&self.employee_id, "shift.employee_id")?;
        validate_date(&self.date, "shift.date")?;
        validate_optional_times(
            self.start_time.as_deref(),
            self.end_time.as_deref(),
            self.time_slot.as_deref(),
        )
    }

    pub fn without_id(&self) -> NewShift {
        NewShift {
            employee_id: self.employee_id.clone(),
            date: self.date.clone(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            time_slot: self.time_slot.clone(),
            status: self.status,
            customer_name: self.customer_name.clone(),
            notes: self.notes.clone(),
            series: self.series,
        }
    }
}

/// A shift whose id has not been allocated yet. The persistence layer
/// assigns the id when the shift is added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewShift {
    pub employee_id: String,
    pub date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_slot: Option<String>,
    pub status: ShiftStatus,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesLink>,
}

impl NewShift {
    pub fn in_slot(
        employee_id: impl Into<String>,
        date: impl Into<String>,
        time_slot: impl Into<String>,
        status: ShiftStatus,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            date: date.into(),
            start_time: None,
            end_time: None,
            time_slot: Some(time_slot.into()),
            status,
            customer_name: None,
            notes: None,
            series: None,
        }
    }

    pub fn with_times(
        employee_id: impl Into<String>,
        date: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        status: ShiftStatus,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            date: date.into(),
            start_time: Some(start_time.into()),
            end_time: Some(end_time.into()),
            time_slot: None,
            status,
            customer_name: None,
            notes: None,
            series: None,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn into_shift(self, id: impl Into<String>) -> EmployeeShift {
        EmployeeShift {
            id: id.into(),
            employee_id: self.employee_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            time_slot: self.time_slot,
            status: self.status,
            customer_name: self.customer_name,
            notes: self.notes,
            series: self.series,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.employee_id, "shift.employee_id")?;
        validate_date(&self.date, "shift.date")?;
        validate_optional_times(
            self.start_time.as_deref(),
            self.end_time.as_deref(),
            self.time_slot.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub position: String,
    pub status: EmployeeStatus,
    #[serde(default)]
    pub shifts: Vec<EmployeeShift>,
}

impl Employee {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: position.into(),
            status: EmployeeStatus::Active,
            shifts: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "employee.id")?;
        validate_non_empty(&self.name, "employee.name")?;
        for shift in &self.shifts {
            shift.validate()?;
            if shift.employee_id != self.id {
                return Err(format!(
                    "shift {} belongs to employee {}, not {}",
                    shift.id, shift.employee_id, self.id
                ));
            }
        }
        Ok(())
    }

    pub fn shifts_on<'a>(&'a self, date: &'a str) -> impl Iterator<Item = &'a EmployeeShift> {
        self.shifts.iter().filter(move |shift| shift.date == date)
    }

    pub fn find_shift(&self, shift_id: &str) -> Option<&EmployeeShift> {
        self.shifts.iter().find(|shift| shift.id == shift_id)
    }
}

/// Reusable assignment pattern. Shifts generated from a template keep no
/// reference back to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShiftTemplate {
    pub id: String,
    pub name: String,
    pub employee_id: String,
    pub start_time: String,
    pub end_time: String,
    pub weekdays: Vec<String>,
    pub notes: Option<String>,
}

impl ShiftTemplate {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "template.id")?;
        validate_non_empty(&self.name, "template.name")?;
        validate_non_empty(&self.employee_id, "template.employee_id")?;
        validate_hhmm(&self.start_time, "template.start_time")?;
        validate_hhmm(&self.end_time, "template.end_time")?;
        if self.end_time <= self.start_time {
            return Err("template.end_time must be after template.start_time".to_string());
        }
        for day in &self.weekdays {
            if parse_weekday(day).is_none() {
                return Err(format!("template.weekdays[] has unknown day '{day}'"));
            }
        }
        Ok(())
    }

    pub fn applies_on(&self, weekday: Weekday) -> bool {
        self.weekdays
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(weekday_name(weekday)))
    }
}

fn validate_optional_times(
    start_time: Option<&str>,
    end_time: Option<&str>,
    time_slot: Option<&str>,
) -> Result<(), String> {
    if let Some(start) = start_time {
        validate_hhmm(start, "shift.start_time")?;
    }
    if let Some(end) = end_time {
        validate_hhmm(end, "shift.end_time")?;
    }
    let has_explicit_pair = start_time.is_some() && end_time.is_some();
    let has_slot = time_slot.map(str::trim).is_some_and(|slot| !slot.is_empty());
    if !has_explicit_pair && !has_slot {
        return Err("shift needs start_time and end_time, or a time_slot".to_string());
    }
    Ok(())
}

pub(crate) fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_hhmm(value: &str, field_name: &str) -> Result<(), String> {
    let mut split = value.split(':');
    let Some(hour_str) = split.next() else {
        return Err(format!("{field_name} must be HH:MM"));
    };
    let Some(minute_str) = split.next() else {
        return Err(format!("{field_name} must be HH:MM"));
    };
    if split.next().is_some() || hour_str.len() != 2 || minute_str.len() != 2 {
        return Err(format!("{field_name} must be HH:MM"));
    }

    let hour = hour_str
        .parse::<u8>()
        .map_err(|_| format!("{field_name} must be HH:MM"))?;
    let minute = minute_str
        .parse::<u8>()
        .map_err(|_| format!("{field_name} must be HH:MM"))?;
    if hour > 23 || minute > 59 {
        return Err(format!("{field_name} must be HH:MM"));
    }
    Ok(())
}

pub(crate) fn validate_date(value: &str, field_name: &str) -> Result<(), String> {
    parse_date(value).ok_or_else(|| format!("{field_name} must be YYYY-MM-DD"))?;
    Ok(())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn parse_weekday(value: &str) -> Option<Weekday> {
    [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
    .into_iter()
    .find(|weekday| weekday_name(*weekday).eq_ignore_ascii_case(value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_shift() -> EmployeeShift {
        EmployeeShift {
            id: "sft-1".to_string(),
            employee_id: "emp-yamada".to_string(),
            date: "2025-03-10".to_string(),
            start_time: Some("09:00".to_string()),
            end_time: Some("12:00".to_string()),
            time_slot: None,
            status: ShiftStatus::Working,
            customer_name: Some("Sato Logistics".to_string()),
            notes: Some("Loading dock".to_string()),
            series: None,
        }
    }

    fn sample_template() -> ShiftTemplate {
        ShiftTemplate {
            id: "tpl-1".to_string(),
            name: "Weekday day shift".to_string(),
            employee_id: "emp-yamada".to_string(),
            start_time: "09:00".to_string(),
            end_time: "17:00".to_string(),
            weekdays: vec!["Monday".to_string(), "wednesday".to_string()],
            notes: None,
        }
    }

    #[test]
    fn shift_validate_accepts_explicit_pair() {
        assert!(sample_shift().validate().is_ok());
    }

    #[test]
    fn shift_validate_requires_pair_or_slot() {
        let mut shift = sample_shift();
        shift.end_time = None;
        assert!(shift.validate().is_err());

        shift.time_slot = Some("slot-09".to_string());
        assert!(shift.validate().is_ok());
    }

    #[test]
    fn shift_validate_rejects_bad_date_and_time() {
        let mut shift = sample_shift();
        shift.date = "2025/03/10".to_string();
        assert!(shift.validate().is_err());

        let mut shift = sample_shift();
        shift.start_time = Some("9:00".to_string());
        assert!(shift.validate().is_err());
    }

    #[test]
    fn employee_validate_rejects_foreign_shift() {
        let mut employee = Employee::new("emp-yamada", "Yamada", "driver");
        let mut shift = sample_shift();
        shift.employee_id = "emp-suzuki".to_string();
        employee.shifts.push(shift);
        assert!(employee.validate().is_err());
    }

    #[test]
    fn template_validate_and_weekday_matching() {
        let template = sample_template();
        assert!(template.validate().is_ok());
        assert!(template.applies_on(Weekday::Mon));
        assert!(template.applies_on(Weekday::Wed));
        assert!(!template.applies_on(Weekday::Tue));

        let mut broken = sample_template();
        broken.weekdays.push("Someday".to_string());
        assert!(broken.validate().is_err());
    }

    #[test]
    fn series_position_tag_values_parse_back() {
        assert_eq!(SeriesPosition::Day(3).as_tag_value(), "day-3");
        assert_eq!(
            SeriesPosition::parse_tag_value("day-3"),
            Some(SeriesPosition::Day(3))
        );
        assert_eq!(
            SeriesPosition::parse_tag_value("terminal"),
            Some(SeriesPosition::Terminal)
        );
        assert_eq!(SeriesPosition::parse_tag_value("day-x"), None);
    }

    #[test]
    fn new_shift_into_shift_keeps_fields() {
        let shift = sample_shift();
        let rebuilt = shift.without_id().into_shift("sft-1");
        assert_eq!(rebuilt, shift);
    }

    #[test]
    fn status_strings_parse_case_insensitively() {
        assert_eq!(ShiftStatus::parse("Working"), Some(ShiftStatus::Working));
        assert_eq!(ShiftStatus::parse("nope"), None);
        assert_eq!(EmployeeStatus::parse(" inactive "), Some(EmployeeStatus::Inactive));
    }
}
