//! Note domain model.
//!
//! # Invariants
//! - `updated_at` is refreshed on every content-affecting update.
//! - `tags` behaves as a set: trimmed, non-empty, no duplicates, insertion
//!   order kept.

use crate::model::RecordId;
use crate::store::{CollectionKey, CollectionRecord, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// School subject a note is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Math,
    Science,
    English,
    History,
}

impl Subject {
    pub const ALL: [Subject; 4] = [
        Subject::Math,
        Subject::Science,
        Subject::English,
        Subject::History,
    ];

    /// Stable string id used in stored JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Science => "science",
            Self::English => "english",
            Self::History => "history",
        }
    }

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Math => "Enhanced Math",
            Self::Science => "Science",
            Self::English => "English",
            Self::History => "US History",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|subject| subject.as_str() == normalized)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: RecordId,
    pub subject: Subject,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates an empty note for `subject`, stamped with `now`.
    pub fn blank(id: RecordId, subject: Subject, now: DateTime<Utc>) -> Self {
        Self {
            id,
            subject,
            title: String::new(),
            content: String::new(),
            tags: Vec::new(),
            highlights: Vec::new(),
            links: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive match over title, content and tags.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self.content.to_lowercase().contains(&needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

/// Shallow-merge changes for one note. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub subject: Option<Subject>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub highlights: Option<Vec<String>>,
    pub links: Option<Vec<String>>,
}

impl Record for Note {
    type Patch = NotePatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: NotePatch) {
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(highlights) = patch.highlights {
            self.highlights = highlights;
        }
        if let Some(links) = patch.links {
            self.links = links;
        }
    }

    fn normalize(&mut self) {
        self.tags = normalize_tags(&self.tags);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl CollectionRecord for Note {
    const KEY: CollectionKey = CollectionKey::Notes;
}

/// Trims tags, drops blanks and exact duplicates, keeps first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() || normalized.iter().any(|seen| seen == trimmed) {
            continue;
        }
        normalized.push(trimmed.to_string());
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::{normalize_tags, Note, Subject};
    use chrono::Utc;

    #[test]
    fn normalize_tags_trims_and_dedups_in_order() {
        let tags = vec![
            " algebra ".to_string(),
            "".to_string(),
            "quiz".to_string(),
            "algebra".to_string(),
        ];
        assert_eq!(
            normalize_tags(&tags),
            vec!["algebra".to_string(), "quiz".to_string()]
        );
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut note = Note::blank("n1".to_string(), Subject::Math, Utc::now());
        note.title = "Quadratics".to_string();
        note.tags = vec!["Exam".to_string()];
        assert!(note.matches_search("quad"));
        assert!(note.matches_search("EXAM"));
        assert!(note.matches_search(""));
        assert!(!note.matches_search("photosynthesis"));
    }

    #[test]
    fn subject_parse_accepts_stored_ids() {
        assert_eq!(Subject::parse("History"), Some(Subject::History));
        assert_eq!(Subject::parse("art"), None);
    }

    #[test]
    fn note_serializes_with_camel_case_timestamps() {
        let note = Note::blank("n1".to_string(), Subject::Science, Utc::now());
        let value = serde_json::to_value(&note).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert_eq!(value["subject"], "science");
    }
}
