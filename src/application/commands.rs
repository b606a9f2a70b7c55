use crate::application::analysis::{weekly_tag_activity, TagActivity};
use crate::application::bootstrap::{bootstrap_workspace, BootstrapResult};
use crate::application::history::{History, HistoryGenerator};
use crate::application::migration::{migrate_goals, migrate_tasks};
use crate::application::navigation::{NavigationState, PeriodView};
use crate::application::period_calculus::PeriodCalculus;
use crate::domain::models::{Goal, Task};
use crate::domain::period::{PeriodError, PeriodKey, PeriodScope};
use crate::domain::tags::{remove_from_records, rename_in_records, TagCatalog, TagError};
use crate::infrastructure::clock::{Clock, SystemClock};
use crate::infrastructure::config::HistorySettings;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::record_store::{InMemoryRecordRepository, RecordRepository};
use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id(prefix: &str) -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{sequence}", Utc::now().timestamp_micros())
}

pub struct PlannerState {
    logs_dir: PathBuf,
    clock: Arc<dyn Clock>,
    records: Arc<dyn RecordRepository>,
    history: HistorySettings,
    runtime: Mutex<RuntimeState>,
    log_guard: Mutex<()>,
}

impl PlannerState {
    /// Bootstraps `workspace_root` and seeds history using the wall clock in
    /// the configured timezone.
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let clock = Arc::new(SystemClock::new(bootstrap.timezone));
        Self::from_bootstrap(bootstrap, clock)
    }

    pub fn with_clock(workspace_root: PathBuf, clock: Arc<dyn Clock>) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        Self::from_bootstrap(bootstrap, clock)
    }

    fn from_bootstrap(bootstrap: BootstrapResult, clock: Arc<dyn Clock>) -> Result<Self, InfraError> {
        let state = Self {
            logs_dir: bootstrap.logs_dir,
            clock,
            records: Arc::new(InMemoryRecordRepository::default()),
            history: bootstrap.history,
            runtime: Mutex::new(RuntimeState {
                navigation: NavigationState::default(),
                tags: TagCatalog::from_tags(&bootstrap.default_tags),
            }),
            log_guard: Mutex::new(()),
        };

        let history = generate_history(state.calculus(), state.history.weeks_back, state.history.seed)?;
        let (tasks, goals) = (history.tasks.len(), history.goals.len());
        state.records.replace_all(history.tasks, history.goals)?;
        state.log_info(
            "bootstrap",
            &format!(
                "seeded weeks_back={} tasks={tasks} goals={goals}",
                state.history.weeks_back
            ),
        );
        Ok(state)
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Calculus anchored at the clock's current local day.
    pub fn calculus(&self) -> PeriodCalculus {
        PeriodCalculus::from_clock(self.clock.as_ref())
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": self.clock.now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

#[derive(Debug)]
struct RuntimeState {
    navigation: NavigationState,
    tags: TagCatalog,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TagUpdateResponse {
    pub tags: Vec<String>,
    pub updated_records: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TagActivityResponse {
    pub activity: TagActivity,
    pub total: usize,
    pub max_count: usize,
    pub daily_average: f64,
    pub bar_heights: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeedHistoryResponse {
    pub weeks_back: u32,
    pub tasks: usize,
    pub goals: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportRecordsResponse {
    pub tasks: usize,
    pub goals: usize,
    pub migrated_tasks: usize,
    pub migrated_goals: usize,
}

pub fn current_view_impl(state: &PlannerState) -> Result<PeriodView, InfraError> {
    let calculus = state.calculus();
    let runtime = lock_runtime(state)?;
    Ok(runtime.navigation.view(&calculus)?)
}

/// Moves the active scope by `delta` periods.
pub fn navigate_impl(state: &PlannerState, delta: i64) -> Result<PeriodView, InfraError> {
    let calculus = state.calculus();
    let mut runtime = lock_runtime(state)?;
    runtime.navigation.step(&calculus, delta)?;
    let view = runtime.navigation.view(&calculus)?;
    drop(runtime);

    state.log_info("navigate", &format!("scope={} period={}", view.scope, view.period_key));
    Ok(view)
}

pub fn switch_scope_impl(state: &PlannerState, scope: String) -> Result<PeriodView, InfraError> {
    let scope = scope.trim().parse::<PeriodScope>()?;
    let calculus = state.calculus();
    let mut runtime = lock_runtime(state)?;
    runtime.navigation.switch_scope(&calculus, scope)?;
    Ok(runtime.navigation.view(&calculus)?)
}

pub fn back_to_today_impl(state: &PlannerState) -> Result<PeriodView, InfraError> {
    let calculus = state.calculus();
    let mut runtime = lock_runtime(state)?;
    runtime.navigation.back_to_today();
    Ok(runtime.navigation.view(&calculus)?)
}

/// Tasks filed under `day` (`YYYY-MM-DD`), or under the navigated day.
pub fn list_tasks_impl(state: &PlannerState, day: Option<String>) -> Result<Vec<Task>, InfraError> {
    let day = resolve_day(state, day.as_deref())?;
    state.records.tasks_for_day(&day)
}

pub fn create_task_impl(state: &PlannerState, text: String, day: Option<String>) -> Result<Task, InfraError> {
    let text = required_input(&text, "text")?;
    let day = resolve_day(state, day.as_deref())?;

    let task = Task::new(next_id("tsk"), text, day.start_date(), state.clock.now());
    task.validate().map_err(InfraError::InvalidInput)?;
    state.records.upsert_task(&task)?;

    state.log_info("create_task", &format!("created task_id={} day={day}", task.id));
    Ok(task)
}

pub fn toggle_task_impl(state: &PlannerState, task_id: String) -> Result<Task, InfraError> {
    let mut task = find_task(state, &task_id)?;
    task.toggle(state.clock.now());
    state.records.upsert_task(&task)?;

    state.log_info(
        "toggle_task",
        &format!("task_id={} completed={}", task.id, task.completed),
    );
    Ok(task)
}

pub fn add_task_tag_impl(state: &PlannerState, task_id: String, tag: String) -> Result<Task, InfraError> {
    let mut task = find_task(state, &task_id)?;
    task.attach_tag(&tag, state.clock.now())?;
    state.records.upsert_task(&task)?;

    state.log_info("add_task_tag", &format!("task_id={} tag={}", task.id, tag.trim()));
    Ok(task)
}

pub fn remove_task_tag_impl(state: &PlannerState, task_id: String, index: usize) -> Result<Task, InfraError> {
    let mut task = find_task(state, &task_id)?;
    let Some(removed) = task.detach_tag(index, state.clock.now()) else {
        return Err(InfraError::InvalidInput(format!(
            "task {} has no tag at index {index}",
            task.id
        )));
    };
    state.records.upsert_task(&task)?;

    state.log_info("remove_task_tag", &format!("task_id={} tag={removed}", task.id));
    Ok(task)
}

/// Goals for `period_key`, or for the navigated period. While the day scope
/// is active the navigated week is used.
pub fn list_goals_impl(state: &PlannerState, period_key: Option<String>) -> Result<Vec<Goal>, InfraError> {
    let period = resolve_goal_period(state, period_key.as_deref())?;
    state.records.goals_for_period(&period)
}

pub fn create_goal_impl(
    state: &PlannerState,
    text: String,
    period_key: Option<String>,
) -> Result<Goal, InfraError> {
    let text = required_input(&text, "text")?;
    let period = resolve_goal_period(state, period_key.as_deref())?;

    let goal = Goal::new(next_id("gol"), text, period, state.clock.now());
    goal.validate().map_err(InfraError::InvalidInput)?;
    state.records.upsert_goal(&goal)?;

    state.log_info("create_goal", &format!("created goal_id={} period={period}", goal.id));
    Ok(goal)
}

pub fn toggle_goal_impl(state: &PlannerState, goal_id: String) -> Result<Goal, InfraError> {
    let mut goal = find_goal(state, &goal_id)?;
    goal.toggle(state.clock.now());
    state.records.upsert_goal(&goal)?;

    state.log_info(
        "toggle_goal",
        &format!("goal_id={} completed={}", goal.id, goal.completed),
    );
    Ok(goal)
}

/// Attaches a catalog tag to a goal.
pub fn add_goal_tag_impl(state: &PlannerState, goal_id: String, tag: String) -> Result<Goal, InfraError> {
    let tag = tag.trim();
    if !lock_runtime(state)?.tags.contains(tag) {
        return Err(TagError::Unknown(tag.to_string()).into());
    }
    let mut goal = find_goal(state, &goal_id)?;
    goal.attach_tag(tag, state.clock.now())?;
    state.records.upsert_goal(&goal)?;

    state.log_info("add_goal_tag", &format!("goal_id={} tag={tag}", goal.id));
    Ok(goal)
}

pub fn remove_goal_tag_impl(state: &PlannerState, goal_id: String, index: usize) -> Result<Goal, InfraError> {
    let mut goal = find_goal(state, &goal_id)?;
    let Some(removed) = goal.detach_tag(index, state.clock.now()) else {
        return Err(InfraError::InvalidInput(format!(
            "goal {} has no tag at index {index}",
            goal.id
        )));
    };
    state.records.upsert_goal(&goal)?;

    state.log_info("remove_goal_tag", &format!("goal_id={} tag={removed}", goal.id));
    Ok(goal)
}

pub fn list_tags_impl(state: &PlannerState) -> Result<Vec<String>, InfraError> {
    Ok(lock_runtime(state)?.tags.tags().to_vec())
}

pub fn create_tag_impl(state: &PlannerState, tag: String) -> Result<Vec<String>, InfraError> {
    let mut runtime = lock_runtime(state)?;
    let created = runtime.tags.add(&tag)?;
    let tags = runtime.tags.tags().to_vec();
    drop(runtime);

    state.log_info("create_tag", &format!("created tag={created}"));
    Ok(tags)
}

/// Renames a catalog tag and carries the new name onto every record.
pub fn rename_tag_impl(state: &PlannerState, old_tag: String, new_tag: String) -> Result<TagUpdateResponse, InfraError> {
    let old_tag = old_tag.trim();
    let mut runtime = lock_runtime(state)?;
    let renamed = runtime.tags.rename(old_tag, &new_tag)?;

    let updated_records = state
        .records
        .edit_all(&mut |tasks, goals| rename_in_records(tasks, goals, old_tag, &renamed))?;
    let tags = runtime.tags.tags().to_vec();
    drop(runtime);

    state.log_info(
        "rename_tag",
        &format!("renamed {old_tag} -> {renamed} records={updated_records}"),
    );
    Ok(TagUpdateResponse { tags, updated_records })
}

/// Removes a catalog tag and strips it from every record.
pub fn delete_tag_impl(state: &PlannerState, tag: String) -> Result<TagUpdateResponse, InfraError> {
    let tag = tag.trim();
    let mut runtime = lock_runtime(state)?;
    if !runtime.tags.remove(tag) {
        return Err(InfraError::NotFound(format!("tag not found: {tag}")));
    }

    let updated_records = state
        .records
        .edit_all(&mut |tasks, goals| remove_from_records(tasks, goals, tag))?;
    let tags = runtime.tags.tags().to_vec();
    drop(runtime);

    state.log_info("delete_tag", &format!("deleted tag={tag} records={updated_records}"));
    Ok(TagUpdateResponse { tags, updated_records })
}

/// Daily counts of tasks tagged `tag` during `week` (`YYYY-Www`), or during
/// the navigated week.
pub fn tag_activity_impl(
    state: &PlannerState,
    tag: String,
    week: Option<String>,
) -> Result<TagActivityResponse, InfraError> {
    let tag = required_input(&tag, "tag")?;
    let week = match normalized(week.as_deref()) {
        Some(raw) => PeriodKey::parse_scoped(raw, PeriodScope::Week)?,
        None => {
            let calculus = state.calculus();
            lock_runtime(state)?.navigation.key_for(&calculus, PeriodScope::Week)?
        }
    };

    let tasks = state.records.tasks_within(&week)?;
    let activity = weekly_tag_activity(&tasks, tag, &week)?;
    Ok(TagActivityResponse {
        total: activity.total(),
        max_count: activity.max_count(),
        daily_average: activity.daily_average(),
        bar_heights: activity.days.iter().map(|day| activity.bar_height(day.count)).collect(),
        activity,
    })
}

/// Replaces every record with freshly synthesized history. Missing
/// arguments fall back to `app.json`.
pub fn seed_history_impl(
    state: &PlannerState,
    weeks_back: Option<u32>,
    seed: Option<u64>,
) -> Result<SeedHistoryResponse, InfraError> {
    let weeks_back = weeks_back.unwrap_or(state.history.weeks_back);
    let seed = seed.or(state.history.seed);

    let history = generate_history(state.calculus(), weeks_back, seed)?;
    let response = SeedHistoryResponse {
        weeks_back,
        tasks: history.tasks.len(),
        goals: history.goals.len(),
    };
    state.records.replace_all(history.tasks, history.goals)?;

    state.log_info(
        "seed_history",
        &format!(
            "seeded weeks_back={weeks_back} tasks={} goals={}",
            response.tasks, response.goals
        ),
    );
    Ok(response)
}

/// Stores records saved before period keys existed. Dateless tasks land on
/// today and keyless goals on the current `goal_scope` period.
pub fn import_records_impl(
    state: &PlannerState,
    tasks: Vec<Task>,
    goals: Vec<Goal>,
    goal_scope: String,
) -> Result<ImportRecordsResponse, InfraError> {
    let goal_scope = goal_scope.trim().parse::<PeriodScope>()?;
    let current = state.calculus().current_keys();
    let now = state.clock.now();

    let migrated_tasks = tasks.iter().filter(|task| task.date.is_none()).count();
    let migrated_goals = goals.iter().filter(|goal| goal.period_key.is_none()).count();
    let tasks = migrate_tasks(&tasks, &current, now);
    let goals = migrate_goals(&goals, &current, goal_scope, now)?;

    for task in &tasks {
        task.validate().map_err(InfraError::InvalidInput)?;
    }
    for goal in &goals {
        goal.validate().map_err(InfraError::InvalidInput)?;
    }
    for task in &tasks {
        state.records.upsert_task(task)?;
    }
    for goal in &goals {
        state.records.upsert_goal(goal)?;
    }

    state.log_info(
        "import_records",
        &format!(
            "imported tasks={} goals={} migrated_tasks={migrated_tasks} migrated_goals={migrated_goals}",
            tasks.len(),
            goals.len()
        ),
    );
    Ok(ImportRecordsResponse {
        tasks: tasks.len(),
        goals: goals.len(),
        migrated_tasks,
        migrated_goals,
    })
}

fn lock_runtime(state: &PlannerState) -> Result<MutexGuard<'_, RuntimeState>, InfraError> {
    state
        .runtime
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("runtime lock poisoned: {error}")))
}

fn generate_history(calculus: PeriodCalculus, weeks_back: u32, seed: Option<u64>) -> Result<History, PeriodError> {
    let mut generator = match seed {
        Some(seed) => HistoryGenerator::seeded(calculus, seed),
        None => HistoryGenerator::from_entropy(calculus),
    };
    generator.generate_history(weeks_back)
}

fn normalized(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn required_input<'a>(value: &'a str, field_name: &str) -> Result<&'a str, InfraError> {
    normalized(Some(value)).ok_or_else(|| InfraError::InvalidInput(format!("{field_name} must not be empty")))
}

fn resolve_day(state: &PlannerState, day: Option<&str>) -> Result<PeriodKey, InfraError> {
    if let Some(raw) = normalized(day) {
        return Ok(PeriodKey::parse_scoped(raw, PeriodScope::Day)?);
    }
    let calculus = state.calculus();
    Ok(lock_runtime(state)?.navigation.key_for(&calculus, PeriodScope::Day)?)
}

fn resolve_goal_period(state: &PlannerState, period_key: Option<&str>) -> Result<PeriodKey, InfraError> {
    if let Some(raw) = normalized(period_key) {
        let period = raw.parse::<PeriodKey>()?;
        if period.scope() == PeriodScope::Day {
            return Err(PeriodError::NotGoalScope(PeriodScope::Day).into());
        }
        return Ok(period);
    }

    let calculus = state.calculus();
    let runtime = lock_runtime(state)?;
    let scope = match runtime.navigation.active_scope {
        PeriodScope::Day => PeriodScope::Week,
        scope => scope,
    };
    Ok(runtime.navigation.key_for(&calculus, scope)?)
}

fn find_task(state: &PlannerState, task_id: &str) -> Result<Task, InfraError> {
    let task_id = required_input(task_id, "task_id")?;
    state
        .records
        .get_task(task_id)?
        .ok_or_else(|| InfraError::NotFound(format!("task not found: {task_id}")))
}

fn find_goal(state: &PlannerState, goal_id: &str) -> Result<Goal, InfraError> {
    let goal_id = required_input(goal_id, "goal_id")?;
    state
        .records
        .get_goal(goal_id)?
        .ok_or_else(|| InfraError::NotFound(format!("goal not found: {goal_id}")))
}
