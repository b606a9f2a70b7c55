use crate::domain::models::{Goal, Task};
use crate::domain::period::PeriodKey;
use crate::infrastructure::error::InfraError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Period-keyed storage for tasks and goals.
///
/// Listing preserves insertion order so that generated history keeps its
/// oldest-to-newest sequence.
pub trait RecordRepository: Send + Sync {
    fn upsert_task(&self, task: &Task) -> Result<(), InfraError>;
    fn get_task(&self, task_id: &str) -> Result<Option<Task>, InfraError>;
    fn list_tasks(&self) -> Result<Vec<Task>, InfraError>;
    fn upsert_goal(&self, goal: &Goal) -> Result<(), InfraError>;
    fn get_goal(&self, goal_id: &str) -> Result<Option<Goal>, InfraError>;
    fn list_goals(&self) -> Result<Vec<Goal>, InfraError>;

    /// Tasks filed under `day`; tasks without a date never match.
    fn tasks_for_day(&self, day: &PeriodKey) -> Result<Vec<Task>, InfraError> {
        Ok(self
            .list_tasks()?
            .into_iter()
            .filter(|task| task.period_key().as_ref() == Some(day))
            .collect())
    }

    /// Tasks whose day falls anywhere inside `period`.
    fn tasks_within(&self, period: &PeriodKey) -> Result<Vec<Task>, InfraError> {
        Ok(self
            .list_tasks()?
            .into_iter()
            .filter(|task| task.date.is_some_and(|date| period.contains(date)))
            .collect())
    }

    fn goals_for_period(&self, period: &PeriodKey) -> Result<Vec<Goal>, InfraError> {
        Ok(self
            .list_goals()?
            .into_iter()
            .filter(|goal| goal.period_key.as_ref() == Some(period))
            .collect())
    }

    /// Replaces every stored task and goal with the given sets.
    fn replace_all(&self, tasks: Vec<Task>, goals: Vec<Goal>) -> Result<(), InfraError>;

    /// Runs `edit` over every stored record in one critical section and
    /// writes the records back when it reports changes. Returns that count.
    fn edit_all(&self, edit: &mut dyn FnMut(&mut [Task], &mut [Goal]) -> usize) -> Result<usize, InfraError>;
}

#[derive(Debug, Default)]
struct Records {
    tasks: HashMap<String, Task>,
    task_order: Vec<String>,
    goals: HashMap<String, Goal>,
    goal_order: Vec<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryRecordRepository {
    records: Mutex<Records>,
}

impl InMemoryRecordRepository {
    fn normalized_id(id: &str) -> Option<String> {
        let normalized = id.trim();
        if normalized.is_empty() {
            return None;
        }
        Some(normalized.to_string())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Records>, InfraError> {
        self.records
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("record store lock poisoned: {error}")))
    }
}

impl RecordRepository for InMemoryRecordRepository {
    fn upsert_task(&self, task: &Task) -> Result<(), InfraError> {
        let task_id = Self::normalized_id(&task.id)
            .ok_or_else(|| InfraError::InvalidInput("task id is required for upsert".to_string()))?;
        let mut records = self.lock()?;
        if records.tasks.insert(task_id.clone(), task.clone()).is_none() {
            records.task_order.push(task_id);
        }
        Ok(())
    }

    fn get_task(&self, task_id: &str) -> Result<Option<Task>, InfraError> {
        let Some(task_id) = Self::normalized_id(task_id) else {
            return Ok(None);
        };
        Ok(self.lock()?.tasks.get(&task_id).cloned())
    }

    fn list_tasks(&self) -> Result<Vec<Task>, InfraError> {
        let records = self.lock()?;
        Ok(records
            .task_order
            .iter()
            .filter_map(|task_id| records.tasks.get(task_id).cloned())
            .collect())
    }

    fn upsert_goal(&self, goal: &Goal) -> Result<(), InfraError> {
        let goal_id = Self::normalized_id(&goal.id)
            .ok_or_else(|| InfraError::InvalidInput("goal id is required for upsert".to_string()))?;
        let mut records = self.lock()?;
        if records.goals.insert(goal_id.clone(), goal.clone()).is_none() {
            records.goal_order.push(goal_id);
        }
        Ok(())
    }

    fn get_goal(&self, goal_id: &str) -> Result<Option<Goal>, InfraError> {
        let Some(goal_id) = Self::normalized_id(goal_id) else {
            return Ok(None);
        };
        Ok(self.lock()?.goals.get(&goal_id).cloned())
    }

    fn list_goals(&self) -> Result<Vec<Goal>, InfraError> {
        let records = self.lock()?;
        Ok(records
            .goal_order
            .iter()
            .filter_map(|goal_id| records.goals.get(goal_id).cloned())
            .collect())
    }

    fn edit_all(&self, edit: &mut dyn FnMut(&mut [Task], &mut [Goal]) -> usize) -> Result<usize, InfraError> {
        let mut records = self.lock()?;
        let (task_ids, mut tasks): (Vec<String>, Vec<Task>) = records
            .task_order
            .iter()
            .filter_map(|task_id| records.tasks.get(task_id).map(|task| (task_id.clone(), task.clone())))
            .unzip();
        let (goal_ids, mut goals): (Vec<String>, Vec<Goal>) = records
            .goal_order
            .iter()
            .filter_map(|goal_id| records.goals.get(goal_id).map(|goal| (goal_id.clone(), goal.clone())))
            .unzip();

        let changed = edit(&mut tasks, &mut goals);
        if changed > 0 {
            records.tasks.extend(task_ids.into_iter().zip(tasks));
            records.goals.extend(goal_ids.into_iter().zip(goals));
        }
        Ok(changed)
    }

    fn replace_all(&self, tasks: Vec<Task>, goals: Vec<Goal>) -> Result<(), InfraError> {
        let mut records = self.lock()?;
        *records = Records::default();
        for task in tasks {
            if let Some(task_id) = Self::normalized_id(&task.id) {
                if records.tasks.insert(task_id.clone(), task).is_none() {
                    records.task_order.push(task_id);
                }
            }
        }
        for goal in goals {
            if let Some(goal_id) = Self::normalized_id(&goal.id) {
                if records.goals.insert(goal_id.clone(), goal).is_none() {
                    records.goal_order.push(goal_id);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, Utc};

    fn fixed_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-16T08:00:00Z")
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn key(value: &str) -> PeriodKey {
        value.parse().expect("valid period key")
    }

    fn task(id: &str, day: &str) -> Task {
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").expect("valid date");
        Task::new(id.to_string(), &format!("task {id}"), date, fixed_time())
    }

    #[test]
    fn tasks_filter_by_day_and_by_enclosing_period() {
        let repo = InMemoryRecordRepository::default();
        repo.upsert_task(&task("t1", "2026-02-09")).expect("upsert");
        repo.upsert_task(&task("t2", "2026-02-15")).expect("upsert");
        repo.upsert_task(&task("t3", "2026-02-16")).expect("upsert");
        let mut legacy = task("t4", "2026-02-09");
        legacy.date = None;
        repo.upsert_task(&legacy).expect("upsert");

        let monday = repo.tasks_for_day(&key("2026-02-09")).expect("filter");
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0].id, "t1");

        let week = repo.tasks_within(&key("2026-W07")).expect("filter");
        let ids = week.iter().map(|task| task.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["t1", "t2"]);
    }

    #[test]
    fn upsert_keeps_first_insertion_position() {
        let repo = InMemoryRecordRepository::default();
        repo.upsert_task(&task("a", "2026-02-09")).expect("upsert");
        repo.upsert_task(&task("b", "2026-02-09")).expect("upsert");
        let mut updated = task("a", "2026-02-09");
        updated.completed = true;
        repo.upsert_task(&updated).expect("upsert");

        let tasks = repo.list_tasks().expect("list");
        assert_eq!(tasks[0].id, "a");
        assert!(tasks[0].completed);
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn goals_filter_by_exact_period_key() {
        let repo = InMemoryRecordRepository::default();
        repo.upsert_goal(&Goal::new("g1".to_string(), "Week goal", key("2026-W07"), fixed_time()))
            .expect("upsert");
        repo.upsert_goal(&Goal::new("g2".to_string(), "Quarter goal", key("2026-Q1"), fixed_time()))
            .expect("upsert");

        assert_eq!(repo.goals_for_period(&key("2026-W07")).expect("filter").len(), 1);
        assert_eq!(repo.goals_for_period(&key("2026-Q1")).expect("filter")[0].id, "g2");
        assert!(repo.goals_for_period(&key("2026")).expect("filter").is_empty());
    }

    #[test]
    fn edit_all_writes_back_only_on_change() {
        let repo = InMemoryRecordRepository::default();
        repo.upsert_task(&task("a", "2026-02-09")).expect("upsert");
        repo.upsert_goal(&Goal::new("g".to_string(), "Goal", key("2026-Q1"), fixed_time()))
            .expect("upsert");

        let untouched = repo
            .edit_all(&mut |tasks, _goals| {
                tasks[0].completed = true;
                0
            })
            .expect("edit");
        assert_eq!(untouched, 0);
        assert!(!repo.get_task("a").expect("lookup").expect("task").completed);

        let changed = repo
            .edit_all(&mut |tasks, goals| {
                tasks[0].tags.push("survive".to_string());
                goals[0].completed = true;
                2
            })
            .expect("edit");
        assert_eq!(changed, 2);
        assert_eq!(repo.get_task("a").expect("lookup").expect("task").tags, ["survive"]);
        assert!(repo.get_goal("g").expect("lookup").expect("goal").completed);
        assert_eq!(repo.list_tasks().expect("list").len(), 1);
    }

    #[test]
    fn blank_ids_are_rejected_and_ignored() {
        let repo = InMemoryRecordRepository::default();
        let blank = task("  ", "2026-02-09");
        assert!(matches!(repo.upsert_task(&blank), Err(InfraError::InvalidInput(_))));
        assert_eq!(repo.get_task("   ").expect("lookup"), None);

        repo.replace_all(vec![blank, task("ok", "2026-02-09")], Vec::new())
            .expect("replace");
        assert_eq!(repo.list_tasks().expect("list").len(), 1);
    }
}
