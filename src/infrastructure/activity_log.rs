use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const ACTIVITY_LOG_FILE: &str = "activity.log";

/// JSON-lines log of committed schedule mutations, one object per line.
/// Write failures are swallowed: logging never fails an edit.
#[derive(Debug)]
pub struct ActivityLog {
    path: Option<PathBuf>,
    guard: Mutex<()>,
}

impl ActivityLog {
    pub fn in_dir(logs_dir: &Path) -> Self {
        Self {
            path: Some(logs_dir.join(ACTIVITY_LOG_FILE)),
            guard: Mutex::new(()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            path: None,
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, command: &str, message: &str) {
        tracing::info!(command, message, "shift activity");
        self.append("info", command, message);
    }

    pub fn error(&self, command: &str, message: &str) {
        tracing::warn!(command, message, "shift activity failed");
        self.append("error", command, message);
    }

    fn append(&self, level: &str, command: &str, message: &str) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        let Ok(_guard) = self.guard.lock() else {
            return;
        };
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn appends_one_json_object_per_line() {
        let dir = std::env::temp_dir().join(format!("shiftboard-log-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        let log = ActivityLog::in_dir(&dir);

        log.info("add_shift", "added sft-1 for emp-yamada");
        log.error("bulk_assign", "employee not found");

        let raw = fs::read_to_string(log.path().expect("enabled log")).expect("read log");
        let lines = raw
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).expect("json line"))
            .collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["level"], "info");
        assert_eq!(lines[0]["command"], "add_shift");
        assert_eq!(lines[1]["level"], "error");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn disabled_log_writes_nothing() {
        let log = ActivityLog::disabled();
        log.info("add_shift", "ignored");
        assert!(log.path().is_none());
    }
}
