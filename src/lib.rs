pub mod application;
pub mod domain;
pub mod infrastructure;

use application::bootstrap::bootstrap_workspace;
use application::commands::{
    add_goal_tag_impl, add_task_tag_impl, back_to_today_impl, create_goal_impl, create_tag_impl,
    create_task_impl, current_view_impl, delete_tag_impl, import_records_impl, list_goals_impl,
    list_tags_impl, list_tasks_impl, navigate_impl, remove_goal_tag_impl, remove_task_tag_impl,
    rename_tag_impl, seed_history_impl, switch_scope_impl, tag_activity_impl, toggle_goal_impl,
    toggle_task_impl,
};
use serde::Serialize;
use std::path::PathBuf;

pub use application::commands::{
    ImportRecordsResponse, PlannerState, SeedHistoryResponse, TagActivityResponse, TagUpdateResponse,
};
pub use application::navigation::PeriodView;
pub use application::period_calculus::PeriodCalculus;
pub use domain::models::{Goal, Task};
pub use domain::period::{PeriodError, PeriodKey, PeriodScope, Timeline};
pub use infrastructure::error::InfraError;

#[derive(Debug, Serialize)]
pub struct BootstrapResponse {
    pub workspace_root: String,
    pub config_dir: String,
    pub logs_dir: String,
    pub timezone: String,
}

pub fn bootstrap(root: Option<String>) -> Result<BootstrapResponse, String> {
    let workspace_root = match root {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().map_err(|error| error.to_string())?,
    };

    let result = bootstrap_workspace(&workspace_root).map_err(|error| error.to_string())?;
    Ok(BootstrapResponse {
        workspace_root: result.workspace_root.display().to_string(),
        config_dir: result.config_dir.display().to_string(),
        logs_dir: result.logs_dir.display().to_string(),
        timezone: result.timezone.name().to_string(),
    })
}

// Host-facing commands: failures are logged and returned as display strings.

pub fn current_view(state: &PlannerState) -> Result<PeriodView, String> {
    current_view_impl(state).map_err(|error| state.command_error("current_view", &error))
}

pub fn navigate(state: &PlannerState, delta: i64) -> Result<PeriodView, String> {
    navigate_impl(state, delta).map_err(|error| state.command_error("navigate", &error))
}

pub fn switch_scope(state: &PlannerState, scope: String) -> Result<PeriodView, String> {
    switch_scope_impl(state, scope).map_err(|error| state.command_error("switch_scope", &error))
}

pub fn back_to_today(state: &PlannerState) -> Result<PeriodView, String> {
    back_to_today_impl(state).map_err(|error| state.command_error("back_to_today", &error))
}

pub fn list_tasks(state: &PlannerState, day: Option<String>) -> Result<Vec<Task>, String> {
    list_tasks_impl(state, day).map_err(|error| state.command_error("list_tasks", &error))
}

pub fn create_task(state: &PlannerState, text: String, day: Option<String>) -> Result<Task, String> {
    create_task_impl(state, text, day).map_err(|error| state.command_error("create_task", &error))
}

pub fn toggle_task(state: &PlannerState, task_id: String) -> Result<Task, String> {
    toggle_task_impl(state, task_id).map_err(|error| state.command_error("toggle_task", &error))
}

pub fn add_task_tag(state: &PlannerState, task_id: String, tag: String) -> Result<Task, String> {
    add_task_tag_impl(state, task_id, tag).map_err(|error| state.command_error("add_task_tag", &error))
}

pub fn remove_task_tag(state: &PlannerState, task_id: String, index: usize) -> Result<Task, String> {
    remove_task_tag_impl(state, task_id, index)
        .map_err(|error| state.command_error("remove_task_tag", &error))
}

pub fn list_goals(state: &PlannerState, period_key: Option<String>) -> Result<Vec<Goal>, String> {
    list_goals_impl(state, period_key).map_err(|error| state.command_error("list_goals", &error))
}

pub fn create_goal(state: &PlannerState, text: String, period_key: Option<String>) -> Result<Goal, String> {
    create_goal_impl(state, text, period_key).map_err(|error| state.command_error("create_goal", &error))
}

pub fn toggle_goal(state: &PlannerState, goal_id: String) -> Result<Goal, String> {
    toggle_goal_impl(state, goal_id).map_err(|error| state.command_error("toggle_goal", &error))
}

pub fn add_goal_tag(state: &PlannerState, goal_id: String, tag: String) -> Result<Goal, String> {
    add_goal_tag_impl(state, goal_id, tag).map_err(|error| state.command_error("add_goal_tag", &error))
}

pub fn remove_goal_tag(state: &PlannerState, goal_id: String, index: usize) -> Result<Goal, String> {
    remove_goal_tag_impl(state, goal_id, index)
        .map_err(|error| state.command_error("remove_goal_tag", &error))
}

pub fn list_tags(state: &PlannerState) -> Result<Vec<String>, String> {
    list_tags_impl(state).map_err(|error| state.command_error("list_tags", &error))
}

pub fn create_tag(state: &PlannerState, tag: String) -> Result<Vec<String>, String> {
    create_tag_impl(state, tag).map_err(|error| state.command_error("create_tag", &error))
}

pub fn rename_tag(state: &PlannerState, old_tag: String, new_tag: String) -> Result<TagUpdateResponse, String> {
    rename_tag_impl(state, old_tag, new_tag).map_err(|error| state.command_error("rename_tag", &error))
}

pub fn delete_tag(state: &PlannerState, tag: String) -> Result<TagUpdateResponse, String> {
    delete_tag_impl(state, tag).map_err(|error| state.command_error("delete_tag", &error))
}

pub fn tag_activity(state: &PlannerState, tag: String, week: Option<String>) -> Result<TagActivityResponse, String> {
    tag_activity_impl(state, tag, week).map_err(|error| state.command_error("tag_activity", &error))
}

pub fn seed_history(
    state: &PlannerState,
    weeks_back: Option<u32>,
    seed: Option<u64>,
) -> Result<SeedHistoryResponse, String> {
    seed_history_impl(state, weeks_back, seed).map_err(|error| state.command_error("seed_history", &error))
}

pub fn import_records(
    state: &PlannerState,
    tasks: Vec<Task>,
    goals: Vec<Goal>,
    goal_scope: String,
) -> Result<ImportRecordsResponse, String> {
    import_records_impl(state, tasks, goals, goal_scope)
        .map_err(|error| state.command_error("import_records", &error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn failed_commands_are_logged_as_errors() {
        let root = std::env::temp_dir().join(format!("planner-lib-tests-{}", std::process::id()));
        fs::create_dir_all(&root).expect("create workspace");

        let response = bootstrap(Some(root.display().to_string())).expect("bootstrap");
        assert_eq!(response.timezone, "UTC");

        let state = PlannerState::new(root.clone()).expect("planner state");
        let error = switch_scope(&state, "month".to_string()).expect_err("unknown scope");
        assert!(error.contains("month"));

        let log = fs::read_to_string(root.join("logs").join("commands.log")).expect("read log");
        assert!(log.lines().any(|line| line.contains("\"level\":\"error\"") && line.contains("switch_scope")));

        let _ = fs::remove_dir_all(&root);
    }
}
