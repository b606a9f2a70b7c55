use crate::infrastructure::config::{ensure_default_configs, load_configs, HistorySettings};
use crate::infrastructure::error::InfraError;
use chrono_tz::Tz;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub config_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub timezone: Tz,
    pub default_tags: Vec<String>,
    pub history: HistorySettings,
}

pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, InfraError> {
    let config_dir = workspace_root.join("config");
    let logs_dir = workspace_root.join("logs");

    fs::create_dir_all(&config_dir)?;
    fs::create_dir_all(&logs_dir)?;

    ensure_default_configs(&config_dir)?;
    let configs = load_configs(&config_dir)?;
    let timezone = configs.timezone()?;
    let default_tags = configs.default_tags()?;
    let history = configs.history_settings()?;

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        config_dir,
        logs_dir,
        timezone,
        default_tags,
        history,
    })
}
