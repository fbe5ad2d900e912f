use crate::domain::models::TimeSlot;
use crate::domain::time_slots::TimeSlotCatalog;
use crate::infrastructure::error::ScheduleError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const TIME_SLOTS_JSON: &str = "time_slots.json";
const DEFAULT_APP_NAME: &str = "Shiftboard";
const DEFAULT_GRID_STEP_MINUTES: u32 = 30;
const MAX_GRID_STEP_MINUTES: u64 = 240;

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigBundle {
    pub app: serde_json::Value,
    pub time_slots: serde_json::Value,
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    let catalog = TimeSlotCatalog::default();
    HashMap::from([
        (
            APP_JSON,
            serde_json::json!({
                "schema": 1,
                "appName": DEFAULT_APP_NAME,
                "gridStepMinutes": DEFAULT_GRID_STEP_MINUTES
            }),
        ),
        (
            TIME_SLOTS_JSON,
            serde_json::json!({
                "schema": 1,
                "slots": catalog.slots()
            }),
        ),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), ScheduleError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, ScheduleError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| {
            ScheduleError::InvalidConfig(format!("missing schema in {}", path.display()))
        })?;
    if schema != 1 {
        return Err(ScheduleError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_configs(config_dir: &Path) -> Result<ConfigBundle, ScheduleError> {
    Ok(ConfigBundle {
        app: read_config(&config_dir.join(APP_JSON))?,
        time_slots: read_config(&config_dir.join(TIME_SLOTS_JSON))?,
    })
}

pub fn read_app_name(config_dir: &Path) -> Result<String, ScheduleError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let name = app
        .get("appName")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_APP_NAME);
    Ok(name.to_string())
}

/// Width of one calendar cell in minutes; drag gestures snap to it.
pub fn read_grid_step_minutes(config_dir: &Path) -> Result<u32, ScheduleError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let Some(raw) = app.get("gridStepMinutes") else {
        return Ok(DEFAULT_GRID_STEP_MINUTES);
    };
    let step = raw
        .as_u64()
        .filter(|step| (1..=MAX_GRID_STEP_MINUTES).contains(step))
        .ok_or_else(|| {
            ScheduleError::InvalidConfig(format!(
                "gridStepMinutes must be between 1 and {MAX_GRID_STEP_MINUTES}, got {raw}"
            ))
        })?;
    Ok(step as u32)
}

pub fn load_time_slot_catalog(config_dir: &Path) -> Result<TimeSlotCatalog, ScheduleError> {
    let path = config_dir.join(TIME_SLOTS_JSON);
    let config = read_config(&path)?;
    let slots = config.get("slots").cloned().ok_or_else(|| {
        ScheduleError::InvalidConfig(format!("missing slots in {}", path.display()))
    })?;
    let slots: Vec<TimeSlot> = serde_json::from_value(slots)?;
    TimeSlotCatalog::new(slots).map_err(|error| {
        ScheduleError::InvalidConfig(format!("{error} in {}", path.display()))
    })
}
