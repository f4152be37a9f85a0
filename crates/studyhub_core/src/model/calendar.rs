//! Calendar event domain model.
//!
//! # Invariants
//! - `end_date`, when set, is not earlier than `date`.

use crate::model::note::Subject;
use crate::model::RecordId;
use crate::store::{CollectionKey, CollectionRecord, Record};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Assignment,
    Test,
    Event,
    Reminder,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::Assignment,
        EventType::Test,
        EventType::Event,
        EventType::Reminder,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Test => "test",
            Self::Event => "event",
            Self::Reminder => "reminder",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: RecordId,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

/// Shallow-merge changes for one event. Nested options clear the field when
/// set to `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarEventPatch {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub kind: Option<EventType>,
    pub subject: Option<Option<Subject>>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl Record for CalendarEvent {
    type Patch = CalendarEventPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: CalendarEventPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }

    fn normalize(&mut self) {
        if self.end_date.is_some_and(|end| end < self.date) {
            self.end_date = None;
        }
    }
}

impl CollectionRecord for CalendarEvent {
    const KEY: CollectionKey = CollectionKey::Events;
}
