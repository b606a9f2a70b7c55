use crate::domain::models::{Goal, Task};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_TAG_CHARS: usize = 15;
pub const MAX_TAGS_PER_RECORD: usize = 5;
pub const DEFAULT_TAGS: [&str; 5] = ["happy house", "survive", "strong body", "sharp mind", "create"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("tag must not be empty")]
    Empty,
    #[error("tag '{tag}' is longer than {max} characters")]
    TooLong { tag: String, max: usize },
    #[error("tag '{0}' already exists")]
    Duplicate(String),
    #[error("tag '{0}' does not exist")]
    Unknown(String),
    #[error("tag '{0}' is unchanged")]
    Unchanged(String),
    #[error("a record holds at most {0} tags")]
    TooManyTags(usize),
}

/// Trims `tag` and checks it is non-empty and short enough.
pub fn validate_tag(tag: &str) -> Result<&str, TagError> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(TagError::Empty);
    }
    if tag.chars().count() > MAX_TAG_CHARS {
        return Err(TagError::TooLong {
            tag: tag.to_string(),
            max: MAX_TAG_CHARS,
        });
    }
    Ok(tag)
}

/// The global, ordered list of tags offered to goals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagCatalog {
    tags: Vec<String>,
}

impl Default for TagCatalog {
    fn default() -> Self {
        Self {
            tags: DEFAULT_TAGS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl TagCatalog {
    /// Builds a catalog, skipping invalid and repeated entries.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = Self { tags: Vec::new() };
        for tag in tags {
            let _ = catalog.add(tag.as_ref());
        }
        catalog
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|existing| existing == tag)
    }

    pub fn add(&mut self, tag: &str) -> Result<String, TagError> {
        let tag = validate_tag(tag)?;
        if self.contains(tag) {
            return Err(TagError::Duplicate(tag.to_string()));
        }
        self.tags.push(tag.to_string());
        Ok(tag.to_string())
    }

    /// Renames in place, keeping the tag's position in the list.
    pub fn rename(&mut self, old_tag: &str, new_tag: &str) -> Result<String, TagError> {
        let new_tag = validate_tag(new_tag)?;
        if new_tag == old_tag {
            return Err(TagError::Unchanged(old_tag.to_string()));
        }
        if self.contains(new_tag) {
            return Err(TagError::Duplicate(new_tag.to_string()));
        }
        let Some(slot) = self.tags.iter_mut().find(|existing| existing.as_str() == old_tag) else {
            return Err(TagError::Unknown(old_tag.to_string()));
        };
        *slot = new_tag.to_string();
        Ok(new_tag.to_string())
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|existing| existing != tag);
        self.tags.len() != before
    }
}

/// Replaces the first occurrence of `old_tag` on every record; returns how
/// many records changed.
pub fn rename_in_records(tasks: &mut [Task], goals: &mut [Goal], old_tag: &str, new_tag: &str) -> usize {
    let tag_lists = tasks
        .iter_mut()
        .map(|task| &mut task.tags)
        .chain(goals.iter_mut().map(|goal| &mut goal.tags));
    let mut changed = 0;
    for tags in tag_lists {
        if let Some(slot) = tags.iter_mut().find(|tag| tag.as_str() == old_tag) {
            *slot = new_tag.to_string();
            changed += 1;
        }
    }
    changed
}

/// Drops every occurrence of `tag`; returns how many records changed.
pub fn remove_from_records(tasks: &mut [Task], goals: &mut [Goal], tag: &str) -> usize {
    let tag_lists = tasks
        .iter_mut()
        .map(|task| &mut task.tags)
        .chain(goals.iter_mut().map(|goal| &mut goal.tags));
    let mut changed = 0;
    for tags in tag_lists {
        let before = tags.len();
        tags.retain(|existing| existing != tag);
        if tags.len() != before {
            changed += 1;
        }
    }
    changed
}
