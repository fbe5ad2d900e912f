use crate::infrastructure::error::ScheduleError;
use rusqlite::Connection;
use std::path::Path;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");
const SCHEMA_VERSION: i64 = 1;

/// Creates the employee/shift tables if needed and stamps the schema
/// version. A database written by a newer schema is refused.
pub fn initialize_database(path: &Path) -> Result<(), ScheduleError> {
    let connection = Connection::open(path)?;
    let version: i64 = connection.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version > SCHEMA_VERSION {
        return Err(ScheduleError::InvalidConfig(format!(
            "unsupported database schema {version} in {}",
            path.display()
        )));
    }
    connection.execute_batch(SCHEMA_SQL)?;
    connection.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn initialize_is_idempotent_and_rejects_newer_schema() {
        let dir = std::env::temp_dir().join(format!("shiftboard-storage-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("schema.sqlite");

        initialize_database(&path).expect("first init");
        initialize_database(&path).expect("second init");

        let connection = Connection::open(&path).expect("open");
        connection
            .pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .expect("bump version");
        drop(connection);
        assert!(matches!(
            initialize_database(&path),
            Err(ScheduleError::InvalidConfig(_))
        ));

        let _ = fs::remove_dir_all(&dir);
    }
}
