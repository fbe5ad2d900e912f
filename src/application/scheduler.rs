use crate::application::bootstrap::bootstrap_workspace;
use crate::application::bulk_assignment::{
    BulkAssignmentOutcome, BulkAssignmentRequest, assign_bulk,
};
use crate::application::interaction::{
    CalendarInteraction, DropTarget, GestureOutcome, ResizeDirection, ShiftEdit,
};
use crate::domain::day_crossing::{
    DayCrossingRequest, DayCrossingSeries, DayCrossingSeriesTable, plan_day_crossing_shift,
    related_shifts_of, strip_day_crossing_tag,
};
use crate::domain::duplicate::{DuplicateStatus, check_duplicate, conflicting_shift_ids};
use crate::domain::merge::{MergedBlock, merged_blocks, needs_merging};
use crate::domain::models::{DayCrossingSeriesId, Employee, EmployeeShift, NewShift, TimeRange};
use crate::domain::shift_time::{is_valid_shift_duration, resolve_shift_time_range};
use crate::domain::time_slots::TimeSlotCatalog;
use crate::domain::visual_style::{ShiftVisualStyle, get_shift_visual_style};
use crate::infrastructure::activity_log::ActivityLog;
use crate::infrastructure::error::ScheduleError;
use crate::infrastructure::shift_repository::{
    ShiftMutations, ShiftRepository, SqliteShiftRepository,
};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
struct RuntimeState {
    interaction: CalendarInteraction,
    series: DayCrossingSeriesTable,
}

/// Single-editor scheduling session: the slot catalog, a shift repository,
/// the gesture state of the calendar and the activity log.
///
/// Every committed mutation goes through the repository and is recorded in
/// the activity log; failures are logged and returned unchanged.
pub struct ShiftScheduler<R: ShiftRepository> {
    catalog: Arc<TimeSlotCatalog>,
    repository: Arc<R>,
    runtime: Mutex<RuntimeState>,
    log: ActivityLog,
}

impl ShiftScheduler<SqliteShiftRepository> {
    /// Bootstraps `workspace_root` and opens its shift database.
    pub fn open(workspace_root: &Path) -> Result<Self, ScheduleError> {
        let bootstrap = bootstrap_workspace(workspace_root)?;
        let repository = SqliteShiftRepository::new(&bootstrap.database_path);
        Self::new(
            bootstrap.catalog,
            bootstrap.grid_step_minutes,
            repository,
            ActivityLog::in_dir(&bootstrap.logs_dir),
        )
    }
}

impl<R: ShiftRepository> ShiftScheduler<R> {
    pub fn new(
        catalog: TimeSlotCatalog,
        grid_step_minutes: u32,
        repository: R,
        log: ActivityLog,
    ) -> Result<Self, ScheduleError> {
        let catalog = Arc::new(catalog);
        let series = DayCrossingSeriesTable::rebuild(&repository.list_employees()?);
        Ok(Self {
            runtime: Mutex::new(RuntimeState {
                interaction: CalendarInteraction::new(Arc::clone(&catalog), grid_step_minutes),
                series,
            }),
            catalog,
            repository: Arc::new(repository),
            log,
        })
    }

    pub fn catalog(&self) -> &TimeSlotCatalog {
        &self.catalog
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn activity_log(&self) -> &ActivityLog {
        &self.log
    }

    fn lock_runtime(&self) -> Result<MutexGuard<'_, RuntimeState>, ScheduleError> {
        self.runtime.lock().map_err(|error| {
            ScheduleError::InvalidConfig(format!("scheduler state lock poisoned: {error}"))
        })
    }

    fn logged<T>(&self, command: &str, result: Result<T, ScheduleError>) -> Result<T, ScheduleError> {
        if let Err(error) = &result {
            self.log.error(command, &error.to_string());
        }
        result
    }

    fn record_change(&self) -> Result<(), ScheduleError> {
        self.lock_runtime()?.interaction.record_change();
        Ok(())
    }

    pub fn employee(&self, employee_id: &str) -> Result<Employee, ScheduleError> {
        self.repository
            .get_employee(employee_id)?
            .ok_or_else(|| ScheduleError::EmployeeNotFound(employee_id.to_string()))
    }

    pub fn list_employees(&self) -> Result<Vec<Employee>, ScheduleError> {
        self.repository.list_employees()
    }

    pub fn save_employee(&self, employee: &Employee) -> Result<(), ScheduleError> {
        let result = employee
            .validate()
            .map_err(ScheduleError::InvalidShift)
            .and_then(|_| self.repository.save_employee(employee));
        self.logged("save_employee", result)?;
        self.log
            .info("save_employee", &format!("saved employee {}", employee.id));
        Ok(())
    }

    pub fn add_shift(&self, employee_id: &str, shift: NewShift) -> Result<EmployeeShift, ScheduleError> {
        let result = if is_valid_shift_duration(&shift, &self.catalog) {
            self.repository.add_shift(employee_id, shift)
        } else {
            Err(ScheduleError::InvalidShift(format!(
                "shift on {} has no valid duration",
                shift.date
            )))
        };
        let added = self.logged("add_shift", result)?;
        self.record_change()?;
        self.log.info(
            "add_shift",
            &format!("added {} for {employee_id} on {}", added.id, added.date),
        );
        Ok(added)
    }

    pub fn update_shift(&self, employee_id: &str, shift: &EmployeeShift) -> Result<(), ScheduleError> {
        let result = if is_valid_shift_duration(shift, &self.catalog) {
            self.repository.update_shift(employee_id, shift)
        } else {
            Err(ScheduleError::InvalidShift(format!(
                "shift {} has no valid duration",
                shift.id
            )))
        };
        self.logged("update_shift", result)?;
        self.record_change()?;
        self.log
            .info("update_shift", &format!("updated {} for {employee_id}", shift.id));
        Ok(())
    }

    pub fn delete_shift(&self, employee_id: &str, shift_id: &str) -> Result<bool, ScheduleError> {
        let removed = self.logged(
            "delete_shift",
            self.repository.delete_shift(employee_id, shift_id),
        )?;
        if removed {
            self.record_change()?;
            self.log
                .info("delete_shift", &format!("deleted {shift_id} for {employee_id}"));
        }
        Ok(removed)
    }

    pub fn delete_multiple_shifts(
        &self,
        employee_id: &str,
        shift_ids: &[String],
    ) -> Result<usize, ScheduleError> {
        let removed = self.logged(
            "delete_multiple_shifts",
            self.repository.delete_multiple_shifts(employee_id, shift_ids),
        )?;
        if removed > 0 {
            self.record_change()?;
            self.log.info(
                "delete_multiple_shifts",
                &format!("deleted {removed} shift(s) for {employee_id}"),
            );
        }
        Ok(removed)
    }

    /// Runs a bulk assignment against the employee's current shifts.
    pub fn assign_bulk(
        &self,
        request: &BulkAssignmentRequest,
    ) -> Result<BulkAssignmentOutcome, ScheduleError> {
        let result = self.employee(&request.employee_id).and_then(|employee| {
            assign_bulk(
                &self.catalog,
                &employee.shifts,
                request,
                self.repository.as_ref(),
            )
        });
        let outcome = self.logged("assign_bulk", result)?;
        if outcome.success_count > 0 {
            self.record_change()?;
        }
        self.log.info(
            "assign_bulk",
            &format!("{}: {}", request.employee_id, outcome.summary()),
        );
        Ok(outcome)
    }

    pub fn check_duplicate(
        &self,
        employee_id: &str,
        date: &str,
        time_slot_ids: &[String],
    ) -> Result<DuplicateStatus, ScheduleError> {
        let employee = self.employee(employee_id)?;
        Ok(check_duplicate(
            &employee.shifts,
            employee_id,
            date,
            time_slot_ids,
            &self.catalog,
        ))
    }

    pub fn needs_merging(&self, employee_id: &str, date: &str) -> Result<bool, ScheduleError> {
        Ok(needs_merging(&self.employee(employee_id)?, date, &self.catalog))
    }

    pub fn merged_blocks(&self, employee_id: &str, date: &str) -> Result<Vec<MergedBlock>, ScheduleError> {
        Ok(merged_blocks(&self.employee(employee_id)?, date, &self.catalog))
    }

    /// Stores a span ending on a later date as one tagged record per date,
    /// all linked to a freshly allocated series id. Records already added
    /// are removed again if a later one fails.
    pub fn create_day_crossing_shift(
        &self,
        request: &DayCrossingRequest,
    ) -> Result<Vec<EmployeeShift>, ScheduleError> {
        let result = self.employee(&request.employee_id).and_then(|_| {
            let mut runtime = self.lock_runtime()?;
            let base_notes = request
                .notes
                .as_deref()
                .map(strip_day_crossing_tag)
                .unwrap_or_default();
            let series_id = runtime.series.allocate(
                &request.employee_id,
                base_notes.trim(),
                &request.start_date,
                &request.end_date,
            );
            match plan_day_crossing_shift(request, Some(series_id)) {
                Ok(planned) => Ok((series_id, planned)),
                Err(error) => {
                    runtime.series.remove(series_id);
                    Err(ScheduleError::InvalidRequest(error))
                }
            }
        });
        let (series_id, planned) = self.logged("create_day_crossing_shift", result)?;

        let mut added: Vec<EmployeeShift> = Vec::with_capacity(planned.len());
        for shift in planned {
            match self.repository.add_shift(&request.employee_id, shift) {
                Ok(stored) => added.push(stored),
                Err(error) => {
                    self.roll_back_series(&request.employee_id, series_id, &added)?;
                    return self.logged("create_day_crossing_shift", Err(error));
                }
            }
        }

        self.record_change()?;
        self.log.info(
            "create_day_crossing_shift",
            &format!(
                "added {} record(s) for {} from {} to {}",
                added.len(),
                request.employee_id,
                request.start_date,
                request.end_date
            ),
        );
        Ok(added)
    }

    // The series id is only released once its records are gone; records a
    // failed rollback leaves behind keep a valid series entry.
    fn roll_back_series(
        &self,
        employee_id: &str,
        series_id: DayCrossingSeriesId,
        added: &[EmployeeShift],
    ) -> Result<(), ScheduleError> {
        let added_ids = added.iter().map(|shift| shift.id.clone()).collect::<Vec<_>>();
        match self.repository.delete_multiple_shifts(employee_id, &added_ids) {
            Ok(_) => {
                self.lock_runtime()?.series.remove(series_id);
            }
            Err(rollback_error) => {
                self.log.error(
                    "create_day_crossing_shift",
                    &format!(
                        "rollback of series {} left {} record(s) for {employee_id}: {rollback_error}",
                        series_id.0,
                        added_ids.len()
                    ),
                );
                self.record_change()?;
            }
        }
        Ok(())
    }

    /// Every record of the series `shift_id` belongs to, ordered by date.
    pub fn related_day_crossing_shifts(
        &self,
        employee_id: &str,
        shift_id: &str,
    ) -> Result<Vec<EmployeeShift>, ScheduleError> {
        let employee = self.employee(employee_id)?;
        let shift = employee
            .find_shift(shift_id)
            .ok_or_else(|| ScheduleError::ShiftNotFound(shift_id.to_string()))?;
        Ok(related_shifts_of(&employee, shift)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Deletes every record of the series `shift_id` belongs to.
    pub fn delete_day_crossing_series(
        &self,
        employee_id: &str,
        shift_id: &str,
    ) -> Result<usize, ScheduleError> {
        let related = self.logged(
            "delete_day_crossing_series",
            self.related_day_crossing_shifts(employee_id, shift_id),
        )?;
        if related.is_empty() {
            return self.logged(
                "delete_day_crossing_series",
                Err(ScheduleError::InvalidRequest(format!(
                    "shift {shift_id} is not part of a day-crossing series"
                ))),
            );
        }
        let ids = related.iter().map(|shift| shift.id.clone()).collect::<Vec<_>>();
        let removed = self.delete_multiple_shifts(employee_id, &ids)?;

        let mut runtime = self.lock_runtime()?;
        for series_id in related.iter().filter_map(|shift| shift.series).map(|link| link.series_id) {
            runtime.series.remove(series_id);
        }
        Ok(removed)
    }

    pub fn day_crossing_series(&self, employee_id: &str) -> Result<Vec<DayCrossingSeries>, ScheduleError> {
        Ok(self
            .lock_runtime()?
            .series
            .for_employee(employee_id)
            .cloned()
            .collect())
    }

    pub fn begin_drag(&self, employee_id: &str, date: &str, time: &str) -> Result<(), ScheduleError> {
        let employee = self.employee(employee_id)?;
        self.lock_runtime()?
            .interaction
            .begin_drag(&employee, date, time)
    }

    pub fn begin_resize(
        &self,
        employee_id: &str,
        date: &str,
        block_index: usize,
        direction: ResizeDirection,
    ) -> Result<(), ScheduleError> {
        let employee = self.employee(employee_id)?;
        self.lock_runtime()?
            .interaction
            .begin_resize(&employee, date, block_index, direction)
    }

    pub fn move_pointer(&self, time: &str) -> Result<(), ScheduleError> {
        self.lock_runtime()?.interaction.move_pointer(time)
    }

    pub fn cancel_gesture(&self) -> Result<bool, ScheduleError> {
        Ok(self.lock_runtime()?.interaction.cancel())
    }

    pub fn gesture_preview(&self) -> Result<Option<TimeRange>, ScheduleError> {
        Ok(self.lock_runtime()?.interaction.preview())
    }

    /// How the range under an active drag compares with the dragged
    /// employee's shifts. `None` outside a drag.
    pub fn drag_preview_duplicate(&self) -> Result<Option<DuplicateStatus>, ScheduleError> {
        let (drag, preview) = {
            let runtime = self.lock_runtime()?;
            match (runtime.interaction.drag_state(), runtime.interaction.preview()) {
                (Some(drag), Some(preview)) => (drag.clone(), preview),
                _ => return Ok(None),
            }
        };
        let slot_ids = self
            .catalog
            .slot_ids_within(&preview.start_time, &preview.end_time);
        self.check_duplicate(&drag.current_employee, &drag.date, &slot_ids)
            .map(Some)
    }

    /// Ends the active gesture and applies a committed edit through the
    /// repository. An edit overlapping another shift of the employee is not
    /// applied: a drag comes back `Cancelled`, a resize `Reverted`. The
    /// unsaved flag is only set once the repository accepted the edit.
    pub fn release_gesture(&self, target: DropTarget) -> Result<GestureOutcome, ScheduleError> {
        let outcome = self.lock_runtime()?.interaction.end_gesture(target)?;
        let edit = match outcome {
            GestureOutcome::Committed(edit) => edit,
            other => return Ok(other),
        };
        if let Some(rejected) = self.logged("release_gesture", self.reject_overlap(&edit))? {
            return Ok(rejected);
        }

        let result = match &edit {
            ShiftEdit::Create { employee_id, shift } => self
                .repository
                .add_shift(employee_id, shift.clone())
                .map(|stored| format!("drag created {} for {employee_id}", stored.id)),
            ShiftEdit::Update { employee_id, shift } => self
                .repository
                .update_shift(employee_id, shift)
                .map(|_| format!("resize updated {} for {employee_id}", shift.id)),
        };
        let message = self.logged("release_gesture", result)?;
        self.record_change()?;
        self.log.info("release_gesture", &message);
        Ok(GestureOutcome::Committed(edit))
    }

    fn reject_overlap(&self, edit: &ShiftEdit) -> Result<Option<GestureOutcome>, ScheduleError> {
        let (employee_id, date, range, own_id) = match edit {
            ShiftEdit::Create { employee_id, shift } => (
                employee_id,
                &shift.date,
                resolve_shift_time_range(shift, &self.catalog),
                None,
            ),
            ShiftEdit::Update { employee_id, shift } => (
                employee_id,
                &shift.date,
                resolve_shift_time_range(shift, &self.catalog),
                Some(shift.id.as_str()),
            ),
        };
        let employee = self.employee(employee_id)?;
        let conflicts =
            conflicting_shift_ids(&employee.shifts, employee_id, date, &range, own_id, &self.catalog);
        if conflicts.is_empty() {
            return Ok(None);
        }

        self.log.error(
            "release_gesture",
            &format!(
                "{}-{} on {date} overlaps {}",
                range.start_time,
                range.end_time,
                conflicts.join(", ")
            ),
        );
        let rejected = match edit {
            ShiftEdit::Create { .. } => GestureOutcome::Cancelled,
            ShiftEdit::Update { shift, .. } => GestureOutcome::Reverted {
                shift_id: shift.id.clone(),
                original: employee
                    .find_shift(&shift.id)
                    .map(|stored| resolve_shift_time_range(stored, &self.catalog))
                    .unwrap_or_else(TimeRange::empty),
            },
        };
        Ok(Some(rejected))
    }

    pub fn has_unsaved_changes(&self) -> Result<bool, ScheduleError> {
        Ok(self.lock_runtime()?.interaction.has_unsaved_changes())
    }

    pub fn mark_saved(&self) -> Result<(), ScheduleError> {
        self.lock_runtime()?.interaction.mark_saved();
        self.log.info("mark_saved", "changes confirmed as saved");
        Ok(())
    }

    pub fn shift_visual_style(&self, shift: &EmployeeShift) -> Result<ShiftVisualStyle, ScheduleError> {
        let unsaved = self.has_unsaved_changes()?;
        Ok(get_shift_visual_style(shift.status, unsaved))
    }
}
