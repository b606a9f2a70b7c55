//! Synthetic task and goal history so a fresh planner is not empty.

use crate::application::period_calculus::PeriodCalculus;
use crate::domain::models::{Goal, Task};
use crate::domain::period::{PeriodError, PeriodKey, PeriodScope};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const PAST_TASK_COMPLETION_RATE: f64 = 0.7;
pub const PAST_GOAL_COMPLETION_RATE: f64 = 0.6;

const SAMPLE_TASK_TEXTS: [&str; 10] = [
    "Review quarterly performance metrics",
    "Schedule team sync meeting",
    "Update project documentation",
    "Complete code review for PR",
    "Prepare presentation slides",
    "Follow up with stakeholders",
    "Refactor authentication module",
    "Write unit tests for new features",
    "Review and approve budget proposal",
    "Organize team knowledge sharing session",
];

const WEEK_GOAL_TEXTS: [&str; 5] = [
    "Complete all sprint tasks",
    "Review team performance",
    "Ship new feature to production",
    "Reduce technical debt by 10%",
    "Improve code coverage",
];

const QUARTER_GOAL_TEXTS: [&str; 5] = [
    "Launch v2.0 product release",
    "Hire 3 new team members",
    "Implement new CI/CD pipeline",
    "Achieve 95% customer satisfaction",
    "Complete platform migration",
];

const YEAR_GOAL_TEXTS: [&str; 5] = [
    "Double user base",
    "Expand to 5 new markets",
    "Achieve profitability",
    "Build world-class engineering team",
    "Establish thought leadership",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct History {
    pub tasks: Vec<Task>,
    pub goals: Vec<Goal>,
}

/// Generates past records against a calculus' notion of today.
///
/// Content is random but the shape is fixed: record counts stay inside the
/// documented ranges, and only periods that already ended can hold
/// completed records. Pass a seeded source for reproducible output.
pub struct HistoryGenerator<R: Rng> {
    calculus: PeriodCalculus,
    rng: R,
}

impl HistoryGenerator<StdRng> {
    pub fn seeded(calculus: PeriodCalculus, seed: u64) -> Self {
        Self::new(calculus, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(calculus: PeriodCalculus) -> Self {
        Self::new(calculus, StdRng::from_entropy())
    }
}

impl<R: Rng> HistoryGenerator<R> {
    pub fn new(calculus: PeriodCalculus, rng: R) -> Self {
        Self { calculus, rng }
    }

    /// `count` tasks filed under `date`, drawn from the shared task pool.
    pub fn tasks_for_date(&mut self, date: NaiveDate, count: usize) -> Vec<Task> {
        let is_past = date < self.calculus.today();
        let stamp = midnight_utc(date);

        let mut tasks = Vec::with_capacity(count);
        for _ in 0..count {
            let text = SAMPLE_TASK_TEXTS
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(SAMPLE_TASK_TEXTS[0]);
            let completed = is_past && self.rng.gen_bool(PAST_TASK_COMPLETION_RATE);
            let mut task = Task::new(self.record_id("tsk"), text, date, stamp);
            task.completed = completed;
            tasks.push(task);
        }
        tasks
    }

    /// Up to `count` goals for `period`, never repeating a text within the
    /// period.
    pub fn goals_for_period(
        &mut self,
        scope: PeriodScope,
        period: &PeriodKey,
        count: usize,
    ) -> Result<Vec<Goal>, PeriodError> {
        if period.scope() != scope {
            return Err(PeriodError::ScopeMismatch {
                key: period.to_string(),
                expected: scope,
            });
        }
        let texts = goal_texts(scope).ok_or(PeriodError::NotGoalScope(scope))?;
        let is_past = self.calculus.is_past_period(period);
        let stamp = midnight_utc(period.start_date());

        let mut goals = Vec::new();
        for text in texts.iter().take(count) {
            let completed = is_past && self.rng.gen_bool(PAST_GOAL_COMPLETION_RATE);
            let mut goal = Goal::new(self.record_id("gol"), text, *period, stamp);
            goal.completed = completed;
            goals.push(goal);
        }
        Ok(goals)
    }

    /// History for the `weeks_back` whole weeks before the current one,
    /// oldest first and Monday through Sunday within each week, followed by
    /// goals for the current quarter and year.
    pub fn generate_history(&mut self, weeks_back: u32) -> Result<History, PeriodError> {
        let mut history = History::default();

        for week_offset in -i64::from(weeks_back)..0 {
            let week = self.calculus.key_from_offset(week_offset, PeriodScope::Week)?;
            let monday = week.start_date();
            for day in 0..7 {
                let count = self.rng.gen_range(3..=5);
                let tasks = self.tasks_for_date(monday + Duration::days(day), count);
                history.tasks.extend(tasks);
            }

            let count = self.rng.gen_range(2..=4);
            history.goals.extend(self.goals_for_period(PeriodScope::Week, &week, count)?);
        }

        let quarter = self.calculus.current_key(PeriodScope::Quarter);
        let count = self.rng.gen_range(2..=3);
        history.goals.extend(self.goals_for_period(PeriodScope::Quarter, &quarter, count)?);

        let year = self.calculus.current_key(PeriodScope::Year);
        let count = self.rng.gen_range(3..=5);
        history.goals.extend(self.goals_for_period(PeriodScope::Year, &year, count)?);

        Ok(history)
    }

    fn record_id(&mut self, prefix: &str) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        let id = uuid::Builder::from_random_bytes(bytes).into_uuid();
        format!("{prefix}-{id}")
    }
}

fn goal_texts(scope: PeriodScope) -> Option<&'static [&'static str]> {
    match scope {
        PeriodScope::Week => Some(&WEEK_GOAL_TEXTS),
        PeriodScope::Quarter => Some(&QUARTER_GOAL_TEXTS),
        PeriodScope::Year => Some(&YEAR_GOAL_TEXTS),
        PeriodScope::Day => None,
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
