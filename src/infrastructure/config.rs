use crate::infrastructure::clock::parse_timezone;
use crate::infrastructure::error::InfraError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const TAGS_JSON: &str = "tags.json";
const DEFAULT_HISTORY_WEEKS: u32 = 4;
const MAX_HISTORY_WEEKS: u32 = 520;

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigBundle {
    pub app: serde_json::Value,
    pub tags: serde_json::Value,
}

/// How much synthetic history to seed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistorySettings {
    pub weeks_back: u32,
    pub seed: Option<u64>,
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([
        (
            APP_JSON,
            serde_json::json!({
                "schema": 1,
                "appName": "Planner",
                "timezone": "UTC",
                "historyWeeks": DEFAULT_HISTORY_WEEKS,
                "historySeed": null
            }),
        ),
        (
            TAGS_JSON,
            serde_json::json!({
                "schema": 1,
                "tags": ["happy house", "survive", "strong body", "sharp mind", "create"]
            }),
        ),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_configs(config_dir: &Path) -> Result<ConfigBundle, InfraError> {
    Ok(ConfigBundle {
        app: read_config(&config_dir.join(APP_JSON))?,
        tags: read_config(&config_dir.join(TAGS_JSON))?,
    })
}

impl ConfigBundle {
    /// The IANA timezone used to decide which calendar day is "today".
    pub fn timezone(&self) -> Result<Tz, InfraError> {
        let name = self
            .app
            .get("timezone")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or("UTC");
        parse_timezone(name)
    }

    pub fn history_settings(&self) -> Result<HistorySettings, InfraError> {
        let weeks_back = match self.app.get("historyWeeks") {
            None | Some(serde_json::Value::Null) => DEFAULT_HISTORY_WEEKS,
            Some(value) => value
                .as_u64()
                .and_then(|weeks| u32::try_from(weeks).ok())
                .filter(|weeks| *weeks <= MAX_HISTORY_WEEKS)
                .ok_or_else(|| {
                    InfraError::InvalidConfig(format!(
                        "historyWeeks must be an integer between 0 and {MAX_HISTORY_WEEKS}"
                    ))
                })?,
        };
        let seed = match self.app.get("historySeed") {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(value.as_u64().ok_or_else(|| {
                InfraError::InvalidConfig("historySeed must be a non-negative integer".to_string())
            })?),
        };
        Ok(HistorySettings { weeks_back, seed })
    }

    pub fn default_tags(&self) -> Result<Vec<String>, InfraError> {
        let list = self
            .tags
            .get("tags")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| InfraError::InvalidConfig(format!("missing tags array in {TAGS_JSON}")))?;
        Ok(list
            .iter()
            .filter_map(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_DIR: AtomicUsize = AtomicUsize::new(0);

    struct TempDir {
        path: PathBuf,
    }

    impl TempDir {
        fn new() -> Self {
            let sequence = NEXT_TEMP_DIR.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "planner-config-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp dir");
            Self { path }
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    fn write_app(dir: &TempDir, app: serde_json::Value) {
        fs::write(dir.path.join(APP_JSON), app.to_string()).expect("write app.json");
    }

    #[test]
    fn defaults_are_written_once_and_loadable() {
        let dir = TempDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");
        let bundle = load_configs(&dir.path).expect("load configs");
        assert_eq!(bundle.app["appName"], "Planner");
        assert_eq!(bundle.timezone().expect("timezone"), Tz::UTC);
        assert_eq!(
            bundle.history_settings().expect("history"),
            HistorySettings { weeks_back: 4, seed: None }
        );
        assert_eq!(bundle.default_tags().expect("tags").len(), 5);

        write_app(&dir, serde_json::json!({"schema": 1, "historyWeeks": 0, "historySeed": 12}));
        ensure_default_configs(&dir.path).expect("defaults do not overwrite");
        let bundle = load_configs(&dir.path).expect("load configs");
        assert_eq!(
            bundle.history_settings().expect("history"),
            HistorySettings { weeks_back: 0, seed: Some(12) }
        );
    }

    #[test]
    fn invalid_values_are_reported() {
        let dir = TempDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");
        write_app(
            &dir,
            serde_json::json!({
                "schema": 1,
                "timezone": "Nowhere/City",
                "historyWeeks": 521,
                "historySeed": "abc"
            }),
        );

        let bundle = load_configs(&dir.path).expect("load configs");
        assert!(matches!(bundle.timezone(), Err(InfraError::InvalidConfig(_))));
        assert!(matches!(bundle.history_settings(), Err(InfraError::InvalidConfig(_))));
    }

    #[test]
    fn unsupported_schema_is_rejected() {
        let dir = TempDir::new();
        fs::write(dir.path.join(APP_JSON), r#"{"schema": 2}"#).expect("write app.json");
        fs::write(dir.path.join(TAGS_JSON), r#"{"schema": 1, "tags": []}"#).expect("write tags.json");
        let error = load_configs(&dir.path).expect_err("schema 2");
        assert!(error.to_string().contains("unsupported schema 2"));
    }
}
