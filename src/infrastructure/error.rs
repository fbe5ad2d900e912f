use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Invalid shift: {0}")]
    InvalidShift(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("employee not found: {0}")]
    EmployeeNotFound(String),
    #[error("shift not found: {0}")]
    ShiftNotFound(String),
    #[error("another gesture is already in progress")]
    GestureInProgress,
    #[error("no gesture is in progress")]
    NoActiveGesture,
}
