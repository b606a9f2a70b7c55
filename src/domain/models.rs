use crate::domain::period::{PeriodKey, PeriodScope};
use crate::domain::tags::{validate_tag, TagError, MAX_TAGS_PER_RECORD};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: String, text: &str, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.trim().to_string(),
            completed: false,
            tags: Vec::new(),
            date: Some(date),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "task.id")?;
        validate_non_empty(&self.text, "task.text")?;
        validate_tags(&self.tags, "task.tags")?;
        Ok(())
    }

    /// The day key this task is filed under, if it has one.
    pub fn period_key(&self) -> Option<PeriodKey> {
        self.date.and_then(|date| PeriodKey::day(date).ok())
    }

    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.updated_at = Some(now);
    }

    pub fn attach_tag(&mut self, tag: &str, now: DateTime<Utc>) -> Result<(), TagError> {
        attach_tag(&mut self.tags, tag, false)?;
        self.updated_at = Some(now);
        Ok(())
    }

    pub fn detach_tag(&mut self, index: usize, now: DateTime<Utc>) -> Option<String> {
        let removed = detach_tag(&mut self.tags, index)?;
        self.updated_at = Some(now);
        Some(removed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goal {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub scope: Option<PeriodScope>,
    #[serde(default)]
    pub period_key: Option<PeriodKey>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Goal {
    pub fn new(id: String, text: &str, period_key: PeriodKey, now: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.trim().to_string(),
            completed: false,
            tags: Vec::new(),
            scope: Some(period_key.scope()),
            period_key: Some(period_key),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "goal.id")?;
        validate_non_empty(&self.text, "goal.text")?;
        validate_tags(&self.tags, "goal.tags")?;
        let key_scope = self.period_key.map(|key| key.scope());
        if self.scope == Some(PeriodScope::Day) || key_scope == Some(PeriodScope::Day) {
            return Err("goal.scope must be week, quarter or year".to_string());
        }
        if let (Some(scope), Some(key)) = (self.scope, self.period_key) {
            if key.scope() != scope {
                return Err(format!(
                    "goal.period_key '{key}' does not match goal.scope '{scope}'"
                ));
            }
        }
        Ok(())
    }

    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.updated_at = Some(now);
    }

    /// Goals pick from the global catalog, so a tag may appear only once.
    pub fn attach_tag(&mut self, tag: &str, now: DateTime<Utc>) -> Result<(), TagError> {
        attach_tag(&mut self.tags, tag, true)?;
        self.updated_at = Some(now);
        Ok(())
    }

    pub fn detach_tag(&mut self, index: usize, now: DateTime<Utc>) -> Option<String> {
        let removed = detach_tag(&mut self.tags, index)?;
        self.updated_at = Some(now);
        Some(removed)
    }
}

fn attach_tag(tags: &mut Vec<String>, tag: &str, unique: bool) -> Result<(), TagError> {
    let tag = validate_tag(tag)?;
    if tags.len() >= MAX_TAGS_PER_RECORD {
        return Err(TagError::TooManyTags(MAX_TAGS_PER_RECORD));
    }
    if unique && tags.iter().any(|existing| existing == tag) {
        return Err(TagError::Duplicate(tag.to_string()));
    }
    tags.push(tag.to_string());
    Ok(())
}

fn detach_tag(tags: &mut Vec<String>, index: usize) -> Option<String> {
    (index < tags.len()).then(|| tags.remove(index))
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

fn validate_tags(tags: &[String], field_name: &str) -> Result<(), String> {
    if tags.len() > MAX_TAGS_PER_RECORD {
        return Err(format!(
            "{field_name} must hold at most {MAX_TAGS_PER_RECORD} tags"
        ));
    }
    for tag in tags {
        validate_tag(tag).map_err(|error| format!("{field_name}[]: {error}"))?;
    }
    Ok(())
}
