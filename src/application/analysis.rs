use crate::domain::models::Task;
use crate::domain::period::{PeriodError, PeriodKey, PeriodScope};
use chrono::Duration;
use serde::{Deserialize, Serialize};

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayCount {
    pub day: String,
    pub count: usize,
}

/// Per-weekday counts of tasks carrying one tag during one ISO week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagActivity {
    pub tag: String,
    pub week: PeriodKey,
    pub days: Vec<DayCount>,
}

impl TagActivity {
    /// Largest daily count, never below one so bar heights stay defined.
    pub fn max_count(&self) -> usize {
        self.days.iter().map(|day| day.count).max().unwrap_or(0).max(1)
    }

    /// Bar height as a percentage of the busiest day.
    pub fn bar_height(&self, count: usize) -> f64 {
        count as f64 / self.max_count() as f64 * 100.0
    }

    pub fn total(&self) -> usize {
        self.days.iter().map(|day| day.count).sum()
    }

    pub fn daily_average(&self) -> f64 {
        (self.total() as f64 / 7.0 * 10.0).round() / 10.0
    }
}

pub fn weekly_tag_activity(tasks: &[Task], tag: &str, week: &PeriodKey) -> Result<TagActivity, PeriodError> {
    if week.scope() != PeriodScope::Week {
        return Err(PeriodError::ScopeMismatch {
            key: week.to_string(),
            expected: PeriodScope::Week,
        });
    }
    let tag = tag.trim();
    let monday = week.start_date();

    let days = WEEKDAY_LABELS
        .iter()
        .zip(0i64..)
        .map(|(label, index)| {
            let date = monday + Duration::days(index);
            let count = tasks
                .iter()
                .filter(|task| task.date == Some(date))
                .filter(|task| task.tags.iter().any(|candidate| candidate == tag))
                .count();
            DayCount {
                day: (*label).to_string(),
                count,
            }
        })
        .collect();

    Ok(TagActivity {
        tag: tag.to_string(),
        week: *week,
        days,
    })
}
