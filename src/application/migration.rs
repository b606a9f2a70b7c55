//! Assigns periods to records stored before tasks and goals were period-keyed.

use crate::domain::models::{Goal, Task};
use crate::domain::period::{CurrentPeriodKeys, PeriodError, PeriodScope};
use chrono::{DateTime, Utc};

/// Files dateless tasks under today. Dated tasks pass through untouched.
pub fn migrate_tasks(tasks: &[Task], current: &CurrentPeriodKeys, now: DateTime<Utc>) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| {
            if task.date.is_some() {
                return task.clone();
            }
            let mut migrated = task.clone();
            migrated.date = Some(current.day.start_date());
            migrated.created_at = Some(now);
            migrated.updated_at = Some(now);
            migrated
        })
        .collect()
}

/// Files goals without a period key under the current `scope` period.
/// Goals that already carry a key only have a missing scope filled in from
/// that key.
pub fn migrate_goals(
    goals: &[Goal],
    current: &CurrentPeriodKeys,
    scope: PeriodScope,
    now: DateTime<Utc>,
) -> Result<Vec<Goal>, PeriodError> {
    if scope == PeriodScope::Day {
        return Err(PeriodError::NotGoalScope(scope));
    }
    let period = current.get(scope);

    Ok(goals
        .iter()
        .map(|goal| {
            if let Some(key) = goal.period_key {
                let mut kept = goal.clone();
                kept.scope.get_or_insert(key.scope());
                return kept;
            }
            let mut migrated = goal.clone();
            migrated.scope = Some(scope);
            migrated.period_key = Some(period);
            migrated.created_at = Some(now);
            migrated.updated_at = Some(now);
            migrated
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::period_calculus::PeriodCalculus;
    use chrono::NaiveDate;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-14T09:30:00Z")
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn current() -> CurrentPeriodKeys {
        PeriodCalculus::new(NaiveDate::from_ymd_opt(2026, 2, 14).expect("valid date")).current_keys()
    }

    fn legacy_task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            text: "Old task".to_string(),
            completed: true,
            tags: vec!["create".to_string()],
            date: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn legacy_goal(id: &str) -> Goal {
        Goal {
            id: id.to_string(),
            text: "Old goal".to_string(),
            completed: false,
            tags: Vec::new(),
            scope: None,
            period_key: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn dateless_tasks_move_to_today() {
        let dated = Task::new(
            "dated".to_string(),
            "Keep me",
            NaiveDate::from_ymd_opt(2026, 1, 3).expect("valid date"),
            now() - chrono::Duration::days(40),
        );
        let input = vec![legacy_task("old"), dated.clone()];
        let migrated = migrate_tasks(&input, &current(), now());

        assert_eq!(migrated[0].date, NaiveDate::from_ymd_opt(2026, 2, 14));
        assert_eq!(migrated[0].created_at, Some(now()));
        assert!(migrated[0].completed);
        assert_eq!(migrated[0].tags, ["create"]);
        assert_eq!(migrated[1], dated);
        assert_eq!(input[0].date, None, "input is left untouched");
    }

    #[test]
    fn keyless_goals_move_to_current_period() {
        let migrated = migrate_goals(&[legacy_goal("g")], &current(), PeriodScope::Quarter, now())
            .expect("migrate");
        assert_eq!(migrated[0].scope, Some(PeriodScope::Quarter));
        assert_eq!(migrated[0].period_key.map(|key| key.to_string()).as_deref(), Some("2026-Q1"));
        assert!(migrated[0].validate().is_ok());

        let weekly = migrate_goals(&[legacy_goal("g")], &current(), PeriodScope::Week, now())
            .expect("migrate");
        assert_eq!(weekly[0].period_key.map(|key| key.to_string()).as_deref(), Some("2026-W07"));
    }

    #[test]
    fn migration_is_idempotent() {
        let tasks = migrate_tasks(&[legacy_task("a"), legacy_task("b")], &current(), now());
        let later = now() + chrono::Duration::hours(3);
        assert_eq!(migrate_tasks(&tasks, &current(), later), tasks);

        let goals = migrate_goals(&[legacy_goal("g")], &current(), PeriodScope::Year, now())
            .expect("migrate");
        assert_eq!(
            migrate_goals(&goals, &current(), PeriodScope::Year, later).expect("migrate"),
            goals
        );
    }

    #[test]
    fn day_scope_is_not_a_goal_scope() {
        assert!(matches!(
            migrate_goals(&[legacy_goal("g")], &current(), PeriodScope::Day, now()),
            Err(PeriodError::NotGoalScope(PeriodScope::Day))
        ));
    }

    #[test]
    fn keyed_goals_gain_their_key_scope() {
        let mut quarterly = legacy_goal("q");
        quarterly.period_key = Some("2025-Q3".parse().expect("key"));
        let mut daily = legacy_goal("d");
        daily.period_key = Some("2026-02-14".parse().expect("key"));

        let migrated = migrate_goals(&[quarterly, daily], &current(), PeriodScope::Week, now())
            .expect("migrate");
        assert_eq!(migrated[0].scope, Some(PeriodScope::Quarter));
        assert_eq!(migrated[0].created_at, None, "keyed goals keep their timestamps");
        assert!(migrated[0].validate().is_ok());

        // A day key is kept as-is and then refused by validation.
        assert_eq!(migrated[1].scope, Some(PeriodScope::Day));
        assert!(migrated[1].validate().is_err());
    }
}
