use crate::domain::models::{
    DayCrossingSeriesId, Employee, EmployeeShift, EmployeeStatus, NewShift, SeriesLink,
    SeriesPosition, ShiftStatus, validate_non_empty,
};
use crate::infrastructure::error::ScheduleError;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_id(prefix: &str) -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{sequence}", Utc::now().timestamp_micros())
}

/// The four mutation entry points the scheduling engine calls. The
/// implementor allocates ids and owns persistence.
pub trait ShiftMutations {
    fn add_shift(&self, employee_id: &str, shift: NewShift) -> Result<EmployeeShift, ScheduleError>;
    fn update_shift(&self, employee_id: &str, shift: &EmployeeShift) -> Result<(), ScheduleError>;
    fn delete_shift(&self, employee_id: &str, shift_id: &str) -> Result<bool, ScheduleError>;

    fn delete_multiple_shifts(
        &self,
        employee_id: &str,
        shift_ids: &[String],
    ) -> Result<usize, ScheduleError> {
        let mut removed = 0;
        for shift_id in shift_ids {
            if self.delete_shift(employee_id, shift_id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

pub trait ShiftRepository: ShiftMutations + Send + Sync {
    /// Inserts or updates the employee profile. Shifts are only changed
    /// through [`ShiftMutations`].
    fn save_employee(&self, employee: &Employee) -> Result<(), ScheduleError>;
    fn get_employee(&self, employee_id: &str) -> Result<Option<Employee>, ScheduleError>;
    fn list_employees(&self) -> Result<Vec<Employee>, ScheduleError>;
}

fn check_new_shift(employee_id: &str, shift: &NewShift) -> Result<(), ScheduleError> {
    if shift.employee_id != employee_id {
        return Err(ScheduleError::InvalidShift(format!(
            "shift belongs to employee {}, not {employee_id}",
            shift.employee_id
        )));
    }
    shift.validate().map_err(ScheduleError::InvalidShift)
}

fn check_stored_shift(employee_id: &str, shift: &EmployeeShift) -> Result<(), ScheduleError> {
    if shift.employee_id != employee_id {
        return Err(ScheduleError::InvalidShift(format!(
            "shift {} belongs to employee {}, not {employee_id}",
            shift.id, shift.employee_id
        )));
    }
    shift.validate().map_err(ScheduleError::InvalidShift)
}

#[derive(Debug, Default)]
pub struct InMemoryShiftRepository {
    employees: Mutex<HashMap<String, Employee>>,
}

impl InMemoryShiftRepository {
    pub fn with_employees(employees: impl IntoIterator<Item = Employee>) -> Self {
        Self {
            employees: Mutex::new(
                employees
                    .into_iter()
                    .map(|employee| (employee.id.clone(), employee))
                    .collect(),
            ),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Employee>>, ScheduleError> {
        self.employees.lock().map_err(|error| {
            ScheduleError::InvalidConfig(format!("shift repository lock poisoned: {error}"))
        })
    }
}

impl ShiftMutations for InMemoryShiftRepository {
    fn add_shift(&self, employee_id: &str, shift: NewShift) -> Result<EmployeeShift, ScheduleError> {
        check_new_shift(employee_id, &shift)?;
        let mut employees = self.lock()?;
        let employee = employees
            .get_mut(employee_id)
            .ok_or_else(|| ScheduleError::EmployeeNotFound(employee_id.to_string()))?;
        let stored = shift.into_shift(next_id("sft"));
        employee.shifts.push(stored.clone());
        Ok(stored)
    }

    fn update_shift(&self, employee_id: &str, shift: &EmployeeShift) -> Result<(), ScheduleError> {
        check_stored_shift(employee_id, shift)?;
        let mut employees = self.lock()?;
        let employee = employees
            .get_mut(employee_id)
            .ok_or_else(|| ScheduleError::EmployeeNotFound(employee_id.to_string()))?;
        let existing = employee
            .shifts
            .iter_mut()
            .find(|candidate| candidate.id == shift.id)
            .ok_or_else(|| ScheduleError::ShiftNotFound(shift.id.clone()))?;
        *existing = shift.clone();
        Ok(())
    }

    fn delete_shift(&self, employee_id: &str, shift_id: &str) -> Result<bool, ScheduleError> {
        let mut employees = self.lock()?;
        let Some(employee) = employees.get_mut(employee_id) else {
            return Ok(false);
        };
        let before = employee.shifts.len();
        employee.shifts.retain(|shift| shift.id != shift_id);
        Ok(employee.shifts.len() != before)
    }

    fn delete_multiple_shifts(
        &self,
        employee_id: &str,
        shift_ids: &[String],
    ) -> Result<usize, ScheduleError> {
        let targets = shift_ids.iter().map(String::as_str).collect::<HashSet<_>>();
        let mut employees = self.lock()?;
        let Some(employee) = employees.get_mut(employee_id) else {
            return Ok(0);
        };
        let before = employee.shifts.len();
        employee
            .shifts
            .retain(|shift| !targets.contains(shift.id.as_str()));
        Ok(before - employee.shifts.len())
    }
}

impl ShiftRepository for InMemoryShiftRepository {
    fn save_employee(&self, employee: &Employee) -> Result<(), ScheduleError> {
        validate_non_empty(&employee.id, "employee.id")
            .map_err(ScheduleError::InvalidRequest)?;
        let mut employees = self.lock()?;
        match employees.get_mut(&employee.id) {
            Some(existing) => {
                existing.name = employee.name.clone();
                existing.position = employee.position.clone();
                existing.status = employee.status;
            }
            None => {
                let mut profile = employee.clone();
                profile.shifts.clear();
                employees.insert(employee.id.clone(), profile);
            }
        }
        Ok(())
    }

    fn get_employee(&self, employee_id: &str) -> Result<Option<Employee>, ScheduleError> {
        let employees = self.lock()?;
        Ok(employees.get(employee_id).cloned())
    }

    fn list_employees(&self) -> Result<Vec<Employee>, ScheduleError> {
        let employees = self.lock()?;
        let mut listed = employees.values().cloned().collect::<Vec<_>>();
        listed.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(listed)
    }
}

#[derive(Debug, Clone)]
pub struct SqliteShiftRepository {
    db_path: PathBuf,
}

struct ShiftRow {
    id: String,
    employee_id: String,
    date: String,
    start_time: Option<String>,
    end_time: Option<String>,
    time_slot: Option<String>,
    status: String,
    customer_name: Option<String>,
    notes: Option<String>,
    series_id: Option<i64>,
    series_position: Option<String>,
}

impl ShiftRow {
    fn into_shift(self) -> Result<EmployeeShift, ScheduleError> {
        let status = ShiftStatus::parse(&self.status).ok_or_else(|| {
            ScheduleError::InvalidShift(format!(
                "unknown status '{}' on shift {}",
                self.status, self.id
            ))
        })?;
        let series = match (self.series_id, self.series_position.as_deref()) {
            (Some(raw_id), Some(position)) => Some(SeriesLink {
                series_id: u64::try_from(raw_id).map(DayCrossingSeriesId).map_err(|_| {
                    ScheduleError::InvalidShift(format!(
                        "invalid series id {raw_id} on shift {}",
                        self.id
                    ))
                })?,
                position: SeriesPosition::parse_tag_value(position).ok_or_else(|| {
                    ScheduleError::InvalidShift(format!(
                        "unknown series position '{position}' on shift {}",
                        self.id
                    ))
                })?,
            }),
            _ => None,
        };
        Ok(EmployeeShift {
            id: self.id,
            employee_id: self.employee_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            time_slot: self.time_slot,
            status,
            customer_name: self.customer_name,
            notes: self.notes,
            series,
        })
    }
}

const SHIFT_COLUMNS: &str = "id, employee_id, date, start_time, end_time, time_slot, status, \
                             customer_name, notes, series_id, series_position";

impl SqliteShiftRepository {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, ScheduleError> {
        let connection = Connection::open(&self.db_path)?;
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(connection)
    }

    fn load_shifts(
        connection: &Connection,
        employee_id: &str,
    ) -> Result<Vec<EmployeeShift>, ScheduleError> {
        let mut statement = connection.prepare(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE employee_id = ?1 ORDER BY date, rowid"
        ))?;
        let rows = statement.query_map(params![employee_id], |row| {
            Ok(ShiftRow {
                id: row.get(0)?,
                employee_id: row.get(1)?,
                date: row.get(2)?,
                start_time: row.get(3)?,
                end_time: row.get(4)?,
                time_slot: row.get(5)?,
                status: row.get(6)?,
                customer_name: row.get(7)?,
                notes: row.get(8)?,
                series_id: row.get(9)?,
                series_position: row.get(10)?,
            })
        })?;

        let mut shifts = Vec::new();
        for row in rows {
            shifts.push(row?.into_shift()?);
        }
        Ok(shifts)
    }

    fn load_employee(
        connection: &Connection,
        employee_id: &str,
    ) -> Result<Option<Employee>, ScheduleError> {
        let row: Option<(String, String, String, String)> = connection
            .query_row(
                "SELECT id, name, position, status FROM employees WHERE id = ?1",
                params![employee_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;
        let Some((id, name, position, status_raw)) = row else {
            return Ok(None);
        };
        let status = EmployeeStatus::parse(&status_raw).ok_or_else(|| {
            ScheduleError::InvalidRequest(format!(
                "unknown employee status '{status_raw}' for {id}"
            ))
        })?;
        let shifts = Self::load_shifts(connection, &id)?;
        Ok(Some(Employee {
            id,
            name,
            position,
            status,
            shifts,
        }))
    }

    fn series_columns(
        shift_series: Option<SeriesLink>,
    ) -> Result<(Option<i64>, Option<String>), ScheduleError> {
        let Some(link) = shift_series else {
            return Ok((None, None));
        };
        let series_id = i64::try_from(link.series_id.0).map_err(|_| {
            ScheduleError::InvalidShift(format!(
                "series id {} does not fit the database",
                link.series_id.0
            ))
        })?;
        Ok((Some(series_id), Some(link.position.as_tag_value())))
    }
}

impl ShiftMutations for SqliteShiftRepository {
    fn add_shift(&self, employee_id: &str, shift: NewShift) -> Result<EmployeeShift, ScheduleError> {
        check_new_shift(employee_id, &shift)?;
        let connection = self.connect()?;
        let exists: Option<String> = connection
            .query_row(
                "SELECT id FROM employees WHERE id = ?1",
                params![employee_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(ScheduleError::EmployeeNotFound(employee_id.to_string()));
        }

        let stored = shift.into_shift(next_id("sft"));
        let (series_id, series_position) = Self::series_columns(stored.series)?;
        connection.execute(
            &format!(
                "INSERT INTO shifts ({SHIFT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                stored.id,
                stored.employee_id,
                stored.date,
                stored.start_time,
                stored.end_time,
                stored.time_slot,
                stored.status.as_str(),
                stored.customer_name,
                stored.notes,
                series_id,
                series_position,
            ],
        )?;
        Ok(stored)
    }

    fn update_shift(&self, employee_id: &str, shift: &EmployeeShift) -> Result<(), ScheduleError> {
        check_stored_shift(employee_id, shift)?;
        let connection = self.connect()?;
        let (series_id, series_position) = Self::series_columns(shift.series)?;
        let changed = connection.execute(
            "UPDATE shifts SET
               date = ?3,
               start_time = ?4,
               end_time = ?5,
               time_slot = ?6,
               status = ?7,
               customer_name = ?8,
               notes = ?9,
               series_id = ?10,
               series_position = ?11
             WHERE id = ?1 AND employee_id = ?2",
            params![
                shift.id,
                employee_id,
                shift.date,
                shift.start_time,
                shift.end_time,
                shift.time_slot,
                shift.status.as_str(),
                shift.customer_name,
                shift.notes,
                series_id,
                series_position,
            ],
        )?;
        if changed == 0 {
            return Err(ScheduleError::ShiftNotFound(shift.id.clone()));
        }
        Ok(())
    }

    fn delete_shift(&self, employee_id: &str, shift_id: &str) -> Result<bool, ScheduleError> {
        let connection = self.connect()?;
        let changed = connection.execute(
            "DELETE FROM shifts WHERE id = ?1 AND employee_id = ?2",
            params![shift_id, employee_id],
        )?;
        Ok(changed > 0)
    }

    fn delete_multiple_shifts(
        &self,
        employee_id: &str,
        shift_ids: &[String],
    ) -> Result<usize, ScheduleError> {
        let mut connection = self.connect()?;
        let transaction = connection.transaction()?;
        let mut removed = 0;
        for shift_id in shift_ids {
            removed += transaction.execute(
                "DELETE FROM shifts WHERE id = ?1 AND employee_id = ?2",
                params![shift_id, employee_id],
            )?;
        }
        transaction.commit()?;
        Ok(removed)
    }
}

impl ShiftRepository for SqliteShiftRepository {
    fn save_employee(&self, employee: &Employee) -> Result<(), ScheduleError> {
        validate_non_empty(&employee.id, "employee.id")
            .map_err(ScheduleError::InvalidRequest)?;
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO employees (id, name, position, status)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
               name = excluded.name,
               position = excluded.position,
               status = excluded.status",
            params![
                employee.id,
                employee.name,
                employee.position,
                employee.status.as_str()
            ],
        )?;
        Ok(())
    }

    fn get_employee(&self, employee_id: &str) -> Result<Option<Employee>, ScheduleError> {
        let connection = self.connect()?;
        Self::load_employee(&connection, employee_id)
    }

    fn list_employees(&self) -> Result<Vec<Employee>, ScheduleError> {
        let connection = self.connect()?;
        let ids = {
            let mut statement = connection.prepare("SELECT id FROM employees ORDER BY id")?;
            let rows = statement.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        let mut employees = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(employee) = Self::load_employee(&connection, &id)? {
                employees.push(employee);
            }
        }
        Ok(employees)
    }
}
