use crate::domain::time_slots::TimeSlotCatalog;
use crate::infrastructure::config::{
    ensure_default_configs, load_configs, load_time_slot_catalog, read_app_name,
    read_grid_step_minutes,
};
use crate::infrastructure::error::ScheduleError;
use crate::infrastructure::storage::initialize_database;
use std::fs;
use std::path::{Path, PathBuf};

const DATABASE_FILE: &str = "shiftboard.sqlite";

#[derive(Debug)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub config_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub database_path: PathBuf,
    pub app_name: String,
    pub grid_step_minutes: u32,
    pub catalog: TimeSlotCatalog,
}

/// Prepares `config/`, `state/` and `logs/` under `workspace_root`, writes
/// missing default configs and migrates the shift database.
pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, ScheduleError> {
    let config_dir = workspace_root.join("config");
    let state_dir = workspace_root.join("state");
    let logs_dir = workspace_root.join("logs");
    let database_path = state_dir.join(DATABASE_FILE);

    fs::create_dir_all(&config_dir)?;
    fs::create_dir_all(&state_dir)?;
    fs::create_dir_all(&logs_dir)?;

    ensure_default_configs(&config_dir)?;
    let _ = load_configs(&config_dir)?;
    let catalog = load_time_slot_catalog(&config_dir)?;
    let app_name = read_app_name(&config_dir)?;
    let grid_step_minutes = read_grid_step_minutes(&config_dir)?;
    initialize_database(&database_path)?;

    tracing::info!(
        workspace = %workspace_root.display(),
        slots = catalog.len(),
        "workspace ready"
    );

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        config_dir,
        logs_dir,
        database_path,
        app_name,
        grid_step_minutes,
        catalog,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_layout_and_defaults() {
        let root = std::env::temp_dir().join(format!("shiftboard-bootstrap-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);

        let result = bootstrap_workspace(&root).expect("bootstrap");
        assert!(result.config_dir.join("app.json").exists());
        assert!(result.config_dir.join("time_slots.json").exists());
        assert!(result.logs_dir.is_dir());
        assert!(result.database_path.exists());
        assert_eq!(result.app_name, "Shiftboard");
        assert_eq!(result.grid_step_minutes, 30);
        assert_eq!(result.catalog, TimeSlotCatalog::default());

        bootstrap_workspace(&root).expect("second bootstrap");
        let _ = fs::remove_dir_all(&root);
    }
}
