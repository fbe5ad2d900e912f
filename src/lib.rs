//! Employee shift scheduling engine.
//!
//! Shifts are per-employee, per-date time blocks resolved against an
//! immutable [`TimeSlotCatalog`]. The crate classifies overlaps for bulk
//! assignment, merges back-to-back blocks for display, keeps multi-day
//! shifts together as one series and models drag/resize editing with an
//! unsaved-changes flag. Persistence is reached through [`ShiftMutations`].

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::bootstrap::{BootstrapResult, bootstrap_workspace};
pub use application::bulk_assignment::{
    BulkAssignmentOutcome, BulkAssignmentRequest, assign_bulk, expand_template_dates,
};
pub use application::interaction::{
    BarResizeState, CalendarInteraction, DragState, DropTarget, Gesture, GestureOutcome,
    InteractionEvent, ResizeDirection, ShiftEdit,
};
pub use application::scheduler::ShiftScheduler;
pub use domain::day_crossing::{
    DayCrossingRequest, DayCrossingSeries, DayCrossingSeriesTable,
    get_related_day_crossing_shifts, parse_day_crossing_tag, plan_day_crossing_shift,
    strip_day_crossing_tag,
};
pub use domain::duplicate::{
    DuplicateStatus, check_duplicate, conflicting_shift_ids, overlapping_shift_ids,
};
pub use domain::merge::{MergedBlock, merged_blocks, needs_merging};
pub use domain::models::{
    DayCrossingSeriesId, Employee, EmployeeShift, EmployeeStatus, NewShift, SeriesLink,
    SeriesPosition, ShiftStatus, ShiftTemplate, TimeRange, TimeSlot,
};
pub use domain::shift_time::{is_valid_shift_duration, resolve_shift_time_range};
pub use domain::time_slots::TimeSlotCatalog;
pub use domain::visual_style::{ShiftVisualStyle, get_shift_visual_style};
pub use infrastructure::activity_log::ActivityLog;
pub use infrastructure::error::ScheduleError;
pub use infrastructure::shift_repository::{
    InMemoryShiftRepository, ShiftMutations, ShiftRepository, SqliteShiftRepository,
};
