//! Drag-to-create and bar-resize gestures on the shift calendar.
//!
//! [`CalendarInteraction`] holds at most one gesture at a time and only moves
//! between states through its methods (or [`CalendarInteraction::handle`]).
//! A gesture always ends in `Idle`, whether it was committed, reverted or
//! cancelled. Commits produce a [`ShiftEdit`]; applying it is up to the
//! caller.

use crate::domain::merge::merged_blocks;
use crate::domain::models::{
    Employee, EmployeeShift, NewShift, ShiftStatus, TimeRange, parse_date,
};
use crate::domain::shift_time::{
    is_valid_time_range, minutes_to_time, resolve_shift_time_range, time_to_minutes,
};
use crate::domain::time_slots::TimeSlotCatalog;
use crate::infrastructure::error::ScheduleError;
use serde::Serialize;
use std::sync::Arc;

const LAST_MINUTE_OF_DAY: u32 = 23 * 60 + 59;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResizeDirection {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragState {
    pub current_employee: String,
    pub date: String,
    pub start_time: String,
    pub current_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarResizeState {
    pub employee_id: String,
    pub date: String,
    pub block_index: usize,
    pub direction: ResizeDirection,
    pub original_start_time: String,
    pub original_end_time: String,
    pub current_time: String,
    target: EmployeeShift,
}

impl BarResizeState {
    pub fn shift_id(&self) -> &str {
        &self.target.id
    }

    pub fn original_range(&self) -> TimeRange {
        TimeRange::new(
            self.original_start_time.clone(),
            self.original_end_time.clone(),
        )
    }

    pub fn proposed_range(&self) -> TimeRange {
        match self.direction {
            ResizeDirection::Start => {
                TimeRange::new(self.current_time.clone(), self.original_end_time.clone())
            }
            ResizeDirection::End => {
                TimeRange::new(self.original_start_time.clone(), self.current_time.clone())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging(DragState),
    Resizing(BarResizeState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Cell { employee_id: String, date: String },
    Outside,
}

impl DropTarget {
    pub fn cell(employee_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self::Cell {
            employee_id: employee_id.into(),
            date: date.into(),
        }
    }

    fn is_cell(&self, employee_id: &str, date: &str) -> bool {
        matches!(
            self,
            Self::Cell { employee_id: target_employee, date: target_date }
                if target_employee == employee_id && target_date == date
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftEdit {
    Create { employee_id: String, shift: NewShift },
    Update { employee_id: String, shift: EmployeeShift },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    Committed(ShiftEdit),
    /// The resize would have produced an invalid shift; the bar keeps its
    /// original bounds.
    Reverted {
        shift_id: String,
        original: TimeRange,
    },
    Cancelled,
}

#[derive(Debug, Clone)]
pub enum InteractionEvent<'a> {
    PressEmptyCell {
        employee: &'a Employee,
        date: &'a str,
        time: &'a str,
    },
    PressBarEdge {
        employee: &'a Employee,
        date: &'a str,
        block_index: usize,
        direction: ResizeDirection,
    },
    PointerMoved {
        time: &'a str,
    },
    Released {
        target: DropTarget,
    },
    Cancel,
    ShiftsDeleted,
    Saved,
}

#[derive(Debug, Clone)]
pub struct CalendarInteraction {
    catalog: Arc<TimeSlotCatalog>,
    step_minutes: u32,
    gesture: Gesture,
    has_unsaved_changes: bool,
}

impl CalendarInteraction {
    pub fn new(catalog: Arc<TimeSlotCatalog>, step_minutes: u32) -> Self {
        Self {
            catalog,
            step_minutes: step_minutes.max(1),
            gesture: Gesture::Idle,
            has_unsaved_changes: false,
        }
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    pub fn drag_state(&self) -> Option<&DragState> {
        match &self.gesture {
            Gesture::Dragging(state) => Some(state),
            _ => None,
        }
    }

    pub fn resize_state(&self) -> Option<&BarResizeState> {
        match &self.gesture {
            Gesture::Resizing(state) => Some(state),
            _ => None,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn step_minutes(&self) -> u32 {
        self.step_minutes
    }

    /// Range the active gesture would commit, for live preview.
    pub fn preview(&self) -> Option<TimeRange> {
        match &self.gesture {
            Gesture::Idle => None,
            Gesture::Dragging(state) => Some(self.drag_range(state)),
            Gesture::Resizing(state) => Some(state.proposed_range()),
        }
    }

    fn ensure_idle(&self) -> Result<(), ScheduleError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(ScheduleError::GestureInProgress)
        }
    }

    fn parse_time(time: &str) -> Result<u32, ScheduleError> {
        time_to_minutes(time)
            .filter(|minutes| *minutes <= LAST_MINUTE_OF_DAY)
            .ok_or_else(|| ScheduleError::InvalidRequest(format!("invalid time '{time}'")))
    }

    pub fn begin_drag(
        &mut self,
        employee: &Employee,
        date: &str,
        time: &str,
    ) -> Result<(), ScheduleError> {
        self.ensure_idle()?;
        if parse_date(date).is_none() {
            return Err(ScheduleError::InvalidRequest(format!("invalid date '{date}'")));
        }
        let pressed = Self::parse_time(time)?;
        let occupied = employee.shifts_on(date).any(|shift| {
            let range = resolve_shift_time_range(shift, &self.catalog);
            match (time_to_minutes(&range.start_time), time_to_minutes(&range.end_time)) {
                (Some(start), Some(end)) => start <= pressed && pressed < end,
                _ => false,
            }
        });
        if occupied {
            return Err(ScheduleError::InvalidRequest(format!(
                "cell {date} {time} of {} is already occupied",
                employee.id
            )));
        }

        tracing::debug!(employee_id = %employee.id, date, time, "drag started");
        self.gesture = Gesture::Dragging(DragState {
            current_employee: employee.id.clone(),
            date: date.to_string(),
            start_time: minutes_to_time(pressed),
            current_time: minutes_to_time(pressed),
        });
        Ok(())
    }

    /// Starts resizing one edge of the `block_index`-th merged bar of the
    /// employee's day. The start edge moves the first shift of the bar, the
    /// end edge moves the last one.
    pub fn begin_resize(
        &mut self,
        employee: &Employee,
        date: &str,
        block_index: usize,
        direction: ResizeDirection,
    ) -> Result<(), ScheduleError> {
        self.ensure_idle()?;
        let blocks = merged_blocks(employee, date, &self.catalog);
        let block = blocks.get(block_index).ok_or_else(|| {
            ScheduleError::InvalidRequest(format!(
                "no block {block_index} for {} on {date}",
                employee.id
            ))
        })?;
        let target_id = match direction {
            ResizeDirection::Start => block.first_shift_id(),
            ResizeDirection::End => block.last_shift_id(),
        }
        .ok_or_else(|| ScheduleError::InvalidRequest("empty block".to_string()))?;
        let target = employee
            .find_shift(target_id)
            .ok_or_else(|| ScheduleError::ShiftNotFound(target_id.to_string()))?;

        let original = resolve_shift_time_range(target, &self.catalog);
        let current_time = match direction {
            ResizeDirection::Start => original.start_time.clone(),
            ResizeDirection::End => original.end_time.clone(),
        };

        tracing::debug!(employee_id = %employee.id, date, block_index, ?direction, "resize started");
        self.gesture = Gesture::Resizing(BarResizeState {
            employee_id: employee.id.clone(),
            date: date.to_string(),
            block_index,
            direction,
            original_start_time: original.start_time,
            original_end_time: original.end_time,
            current_time,
            target: target.clone(),
        });
        Ok(())
    }

    pub fn move_pointer(&mut self, time: &str) -> Result<(), ScheduleError> {
        let minutes = Self::parse_time(time)?;
        let current = match &mut self.gesture {
            Gesture::Idle => return Err(ScheduleError::NoActiveGesture),
            Gesture::Dragging(state) => &mut state.current_time,
            Gesture::Resizing(state) => &mut state.current_time,
        };
        *current = minutes_to_time(minutes);
        Ok(())
    }

    /// Ends the active gesture over `target` and marks a committed edit as
    /// unsaved. The gesture state is cleared in every case.
    pub fn release(&mut self, target: DropTarget) -> Result<GestureOutcome, ScheduleError> {
        let outcome = self.end_gesture(target)?;
        if matches!(outcome, GestureOutcome::Committed(_)) {
            self.has_unsaved_changes = true;
        }
        Ok(outcome)
    }

    /// Ends the active gesture over `target` without touching the unsaved
    /// flag. For callers that apply the edit first and call
    /// [`CalendarInteraction::record_change`] once it is stored.
    pub fn end_gesture(&mut self, target: DropTarget) -> Result<GestureOutcome, ScheduleError> {
        let outcome = match std::mem::take(&mut self.gesture) {
            Gesture::Idle => return Err(ScheduleError::NoActiveGesture),
            Gesture::Dragging(state) => self.finish_drag(state, &target),
            Gesture::Resizing(state) => self.finish_resize(state, &target),
        };
        tracing::debug!(?outcome, "gesture released");
        Ok(outcome)
    }

    fn drag_range(&self, state: &DragState) -> TimeRange {
        let (Some(anchor), Some(current)) = (
            time_to_minutes(&state.start_time),
            time_to_minutes(&state.current_time),
        ) else {
            return TimeRange::empty();
        };
        let start = anchor.min(current);
        let mut end = anchor.max(current);
        if end == start {
            end = start + self.step_minutes;
        }
        TimeRange::new(
            minutes_to_time(start),
            minutes_to_time(end.min(LAST_MINUTE_OF_DAY)),
        )
    }

    fn finish_drag(&self, state: DragState, target: &DropTarget) -> GestureOutcome {
        if !target.is_cell(&state.current_employee, &state.date) {
            return GestureOutcome::Cancelled;
        }
        let range = self.drag_range(&state);
        if !is_valid_time_range(&range.start_time, &range.end_time) {
            return GestureOutcome::Cancelled;
        }
        GestureOutcome::Committed(ShiftEdit::Create {
            employee_id: state.current_employee.clone(),
            shift: NewShift::with_times(
                state.current_employee,
                state.date,
                range.start_time,
                range.end_time,
                ShiftStatus::Working,
            ),
        })
    }

    fn finish_resize(&self, state: BarResizeState, target: &DropTarget) -> GestureOutcome {
        if !target.is_cell(&state.employee_id, &state.date) {
            return GestureOutcome::Cancelled;
        }
        let proposed = state.proposed_range();
        if !is_valid_time_range(&proposed.start_time, &proposed.end_time) {
            return GestureOutcome::Reverted {
                shift_id: state.target.id.clone(),
                original: state.original_range(),
            };
        }
        if proposed == state.original_range() {
            return GestureOutcome::Cancelled;
        }

        let mut updated = state.target;
        updated.start_time = Some(proposed.start_time);
        updated.end_time = Some(proposed.end_time);
        updated.time_slot = None;
        GestureOutcome::Committed(ShiftEdit::Update {
            employee_id: state.employee_id,
            shift: updated,
        })
    }

    /// Drops the active gesture without any effect. Returns whether a
    /// gesture was active.
    pub fn cancel(&mut self) -> bool {
        let was_active = !self.is_idle();
        self.gesture = Gesture::Idle;
        if was_active {
            tracing::debug!("gesture cancelled");
        }
        was_active
    }

    /// Marks a committed change made outside a gesture (a delete or a form
    /// edit).
    pub fn record_change(&mut self) {
        self.has_unsaved_changes = true;
    }

    /// The owning page confirmed persistence.
    pub fn mark_saved(&mut self) {
        self.has_unsaved_changes = false;
    }

    pub fn handle(
        &mut self,
        event: InteractionEvent<'_>,
    ) -> Result<Option<GestureOutcome>, ScheduleError> {
        match event {
            InteractionEvent::PressEmptyCell {
                employee,
                date,
                time,
            } => self.begin_drag(employee, date, time).map(|_| None),
            InteractionEvent::PressBarEdge {
                employee,
                date,
                block_index,
                direction,
            } => self
                .begin_resize(employee, date, block_index, direction)
                .map(|_| None),
            InteractionEvent::PointerMoved { time } => self.move_pointer(time).map(|_| None),
            InteractionEvent::Released { target } => self.release(target).map(Some),
            InteractionEvent::Cancel => Ok(self.cancel().then_some(GestureOutcome::Cancelled)),
            InteractionEvent::ShiftsDeleted => {
                self.record_change();
                Ok(None)
            }
            InteractionEvent::Saved => {
                self.mark_saved();
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE: &str = "2025-03-10";

    fn interaction() -> CalendarInteraction {
        CalendarInteraction::new(Arc::new(TimeSlotCatalog::default()), 30)
    }

    fn employee(shifts: Vec<NewShift>) -> Employee {
        let mut employee = Employee::new("emp-yamada", "Yamada", "driver");
        employee.shifts = shifts
            .into_iter()
            .enumerate()
            .map(|(index, shift)| shift.into_shift(format!("sft-{index}")))
            .collect();
        employee
    }

    fn working(start: &str, end: &str) -> NewShift {
        NewShift::with_times("emp-yamada", DATE, start, end, ShiftStatus::Working)
    }

    #[test]
    fn cancelled_drag_changes_nothing() {
        let employee = employee(vec![working("09:00", "12:00")]);
        let before = employee.clone();
        let mut interaction = interaction();

        interaction.begin_drag(&employee, DATE, "13:00").expect("begin drag");
        interaction.move_pointer("15:00").expect("move");
        assert!(interaction.cancel());

        assert!(interaction.is_idle());
        assert!(!interaction.has_unsaved_changes());
        assert_eq!(employee, before);
    }

    #[test]
    fn release_outside_cancels_drag() {
        let employee = employee(vec![]);
        let mut interaction = interaction();
        interaction.begin_drag(&employee, DATE, "13:00").expect("begin drag");
        let outcome = interaction.release(DropTarget::Outside).expect("release");
        assert_eq!(outcome, GestureOutcome::Cancelled);
        assert!(interaction.is_idle());
        assert!(!interaction.has_unsaved_changes());
    }

    #[test]
    fn committed_drag_emits_create_and_sets_unsaved() {
        let employee = employee(vec![]);
        let mut interaction = interaction();
        interaction.begin_drag(&employee, DATE, "15:00").expect("begin drag");
        interaction.move_pointer("13:00").expect("move");
        assert_eq!(interaction.preview(), Some(TimeRange::new("13:00", "15:00")));

        let outcome = interaction
            .release(DropTarget::cell("emp-yamada", DATE))
            .expect("release");
        let GestureOutcome::Committed(ShiftEdit::Create { employee_id, shift }) = outcome else {
            panic!("expected create, got {outcome:?}");
        };
        assert_eq!(employee_id, "emp-yamada");
        assert_eq!(shift.start_time.as_deref(), Some("13:00"));
        assert_eq!(shift.end_time.as_deref(), Some("15:00"));
        assert_eq!(shift.status, ShiftStatus::Working);
        assert!(interaction.has_unsaved_changes());
        assert!(interaction.drag_state().is_none());
    }

    #[test]
    fn click_without_move_creates_one_grid_step() {
        let employee = employee(vec![]);
        let mut interaction = interaction();
        interaction.begin_drag(&employee, DATE, "10:00").expect("begin drag");
        let outcome = interaction
            .release(DropTarget::cell("emp-yamada", DATE))
            .expect("release");
        let GestureOutcome::Committed(ShiftEdit::Create { shift, .. }) = outcome else {
            panic!("expected create");
        };
        assert_eq!(shift.end_time.as_deref(), Some("10:30"));
    }

    #[test]
    fn drag_cannot_start_on_occupied_cell() {
        let employee = employee(vec![working("09:00", "12:00")]);
        let mut interaction = interaction();
        let result = interaction.begin_drag(&employee, DATE, "10:30");
        assert!(matches!(result, Err(ScheduleError::InvalidRequest(_))));
        assert!(interaction.is_idle());
        assert!(interaction.begin_drag(&employee, DATE, "12:00").is_ok());
    }

    #[test]
    fn drag_rejects_invalid_date() {
        let employee = employee(vec![]);
        let mut interaction = interaction();
        let result = interaction.begin_drag(&employee, "2025-13-45", "09:00");
        assert!(matches!(result, Err(ScheduleError::InvalidRequest(_))));
        assert!(interaction.is_idle());
    }

    #[test]
    fn end_gesture_leaves_unsaved_flag_to_caller() {
        let employee = employee(vec![]);
        let mut interaction = interaction();
        interaction.begin_drag(&employee, DATE, "09:00").expect("begin drag");
        let outcome = interaction
            .end_gesture(DropTarget::cell("emp-yamada", DATE))
            .expect("end gesture");
        assert!(matches!(outcome, GestureOutcome::Committed(ShiftEdit::Create { .. })));
        assert!(interaction.is_idle());
        assert!(!interaction.has_unsaved_changes());
    }

    #[test]
    fn only_one_gesture_at_a_time() {
        let employee = employee(vec![working("09:00", "12:00")]);
        let mut interaction = interaction();
        interaction.begin_drag(&employee, DATE, "14:00").expect("begin drag");

        let resize = interaction.begin_resize(&employee, DATE, 0, ResizeDirection::End);
        assert!(matches!(resize, Err(ScheduleError::GestureInProgress)));
        let drag = interaction.begin_drag(&employee, DATE, "16:00");
        assert!(matches!(drag, Err(ScheduleError::GestureInProgress)));
        assert_eq!(
            interaction.drag_state().map(|state| state.start_time.as_str()),
            Some("14:00")
        );
    }

    #[test]
    fn release_without_gesture_is_an_error() {
        let mut interaction = interaction();
        assert!(matches!(
            interaction.release(DropTarget::Outside),
            Err(ScheduleError::NoActiveGesture)
        ));
        assert!(matches!(
            interaction.move_pointer("10:00"),
            Err(ScheduleError::NoActiveGesture)
        ));
        assert!(!interaction.cancel());
    }

    #[test]
    fn committed_resize_emits_update_with_explicit_times() {
        let employee = employee(vec![NewShift::in_slot(
            "emp-yamada",
            DATE,
            "slot-09",
            ShiftStatus::Working,
        )]);
        let mut interaction = interaction();
        interaction
            .begin_resize(&employee, DATE, 0, ResizeDirection::End)
            .expect("begin resize");
        let state = interaction.resize_state().expect("resizing");
        assert_eq!(state.original_start_time, "09:00");
        assert_eq!(state.original_end_time, "10:00");

        interaction.move_pointer("11:30").expect("move");
        let outcome = interaction
            .release(DropTarget::cell("emp-yamada", DATE))
            .expect("release");
        let GestureOutcome::Committed(ShiftEdit::Update { shift, .. }) = outcome else {
            panic!("expected update, got {outcome:?}");
        };
        assert_eq!(shift.id, "sft-0");
        assert_eq!(shift.start_time.as_deref(), Some("09:00"));
        assert_eq!(shift.end_time.as_deref(), Some("11:30"));
        assert_eq!(shift.time_slot, None);
        assert!(interaction.has_unsaved_changes());
    }

    #[test]
    fn invalid_resize_reverts_to_original_bounds() {
        let employee = employee(vec![working("09:00", "12:00")]);
        let mut interaction = interaction();
        interaction
            .begin_resize(&employee, DATE, 0, ResizeDirection::Start)
            .expect("begin resize");
        interaction.move_pointer("12:30").expect("move past end");

        let outcome = interaction
            .release(DropTarget::cell("emp-yamada", DATE))
            .expect("release");
        assert_eq!(
            outcome,
            GestureOutcome::Reverted {
                shift_id: "sft-0".to_string(),
                original: TimeRange::new("09:00", "12:00"),
            }
        );
        assert!(interaction.is_idle());
        assert!(!interaction.has_unsaved_changes());
    }

    #[test]
    fn resize_edges_pick_first_and_last_shift_of_merged_bar() {
        let employee = employee(vec![working("09:00", "10:00"), working("10:00", "11:00")]);
        let mut interaction = interaction();

        interaction
            .begin_resize(&employee, DATE, 0, ResizeDirection::Start)
            .expect("begin start resize");
        assert_eq!(interaction.resize_state().map(BarResizeState::shift_id), Some("sft-0"));
        interaction.cancel();

        interaction
            .begin_resize(&employee, DATE, 0, ResizeDirection::End)
            .expect("begin end resize");
        assert_eq!(interaction.resize_state().map(BarResizeState::shift_id), Some("sft-1"));

        assert!(interaction.cancel());
        assert!(matches!(
            interaction.begin_resize(&employee, DATE, 3, ResizeDirection::End),
            Err(ScheduleError::InvalidRequest(_))
        ));
    }

    #[test]
    fn unsaved_flag_is_monotonic_until_saved() {
        let employee = employee(vec![]);
        let mut interaction = interaction();
        interaction.begin_drag(&employee, DATE, "08:00").expect("begin");
        interaction
            .release(DropTarget::cell("emp-yamada", DATE))
            .expect("release");
        assert!(interaction.has_unsaved_changes());

        interaction.begin_drag(&employee, DATE, "18:00").expect("begin again");
        interaction.cancel();
        assert!(interaction.has_unsaved_changes());

        interaction.mark_saved();
        assert!(!interaction.has_unsaved_changes());
    }

    #[test]
    fn events_drive_the_same_transitions() {
        let employee = employee(vec![]);
        let mut interaction = interaction();

        let pressed = interaction
            .handle(InteractionEvent::PressEmptyCell {
                employee: &employee,
                date: DATE,
                time: "09:00",
            })
            .expect("press");
        assert_eq!(pressed, None);
        interaction
            .handle(InteractionEvent::PointerMoved { time: "11:00" })
            .expect("move");
        let released = interaction
            .handle(InteractionEvent::Released {
                target: DropTarget::cell("emp-yamada", DATE),
            })
            .expect("release");
        assert!(matches!(
            released,
            Some(GestureOutcome::Committed(ShiftEdit::Create { .. }))
        ));

        interaction.handle(InteractionEvent::Saved).expect("saved");
        assert!(!interaction.has_unsaved_changes());
        interaction
            .handle(InteractionEvent::ShiftsDeleted)
            .expect("deleted");
        assert!(interaction.has_unsaved_changes());
        assert_eq!(interaction.handle(InteractionEvent::Cancel).expect("cancel"), None);
    }
}
