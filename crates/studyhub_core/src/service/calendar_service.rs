//! Calendar use-case service.
//!
//! # Responsibility
//! - Add, complete and delete assignments, tests, events and reminders.
//! - Derive the day view, homework checklist and exam countdown lists.
//!
//! # Invariants
//! - Events with a blank title or an end date before their start date are
//!   not stored.

use crate::model::calendar::{CalendarEvent, CalendarEventPatch, EventType};
use crate::model::note::Subject;
use crate::model::RecordId;
use crate::storage::KvStorage;
use crate::store::{Collection, ListQuery, Store, StoreResult};
use chrono::NaiveDate;
use log::debug;

/// Number of entries shown in the upcoming lists.
pub const UPCOMING_LIMIT: usize = 5;

/// Input for a new calendar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub kind: EventType,
    pub subject: Option<Subject>,
    pub description: Option<String>,
}

/// Calendar service over the `events` collection.
pub struct CalendarService<'s, S: KvStorage> {
    events: Collection<'s, S, CalendarEvent>,
}

impl<'s, S: KvStorage> CalendarService<'s, S> {
    pub fn new(store: &'s Store<S>) -> StoreResult<Self> {
        Ok(Self {
            events: store.collection()?,
        })
    }

    pub fn events(&self) -> &[CalendarEvent] {
        self.events.items()
    }

    /// Adds an incomplete calendar entry. Returns `None` without writing for
    /// a blank title or a reversed date range.
    pub fn add_event(&mut self, input: NewEvent) -> StoreResult<Option<RecordId>> {
        let title = input.title.trim();
        if title.is_empty() {
            debug!("event=calendar_create module=service status=ignored reason=blank_title");
            return Ok(None);
        }
        if input.end_date.is_some_and(|end| end < input.date) {
            debug!("event=calendar_create module=service status=ignored reason=reversed_range");
            return Ok(None);
        }

        let description = input
            .description
            .filter(|description| !description.trim().is_empty());
        let id = self.events.insert_new(|id| CalendarEvent {
            id,
            title: title.to_string(),
            date: input.date,
            end_date: input.end_date,
            kind: input.kind,
            subject: input.subject,
            description,
            completed: false,
        })?;
        Ok(Some(id))
    }

    pub fn update_event(&mut self, id: &str, patch: CalendarEventPatch) -> StoreResult<bool> {
        self.events.update_by_id(id, patch)
    }

    /// Flips the completion flag of one entry.
    pub fn toggle_complete(&mut self, id: &str) -> StoreResult<bool> {
        let Some(completed) = self.events.get(id).map(|event| event.completed) else {
            return Ok(false);
        };
        self.events.update_by_id(
            id,
            CalendarEventPatch {
                completed: Some(!completed),
                ..CalendarEventPatch::default()
            },
        )
    }

    pub fn delete_event(&mut self, id: &str) -> StoreResult<bool> {
        self.events.remove_by_id(id)
    }

    /// Entries on `date`, alphabetical by title.
    pub fn events_on(&self, date: NaiveDate) -> Vec<CalendarEvent> {
        let query = ListQuery::new()
            .filter(|event: &CalendarEvent| event.date == date)
            .sort_by(|a: &CalendarEvent, b: &CalendarEvent| {
                a.title
                    .to_lowercase()
                    .cmp(&b.title.to_lowercase())
                    .then_with(|| a.title.cmp(&b.title))
            });
        self.events.list(&query)
    }

    /// Entries dated within `[start, end]`, chronological.
    pub fn events_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<CalendarEvent> {
        let query = ListQuery::new()
            .filter(|event: &CalendarEvent| event.date >= start && event.date <= end)
            .sort_by(chronological);
        self.events.list(&query)
    }

    /// Incomplete assignments due today or later, soonest first.
    pub fn homework(&self, today: NaiveDate) -> Vec<CalendarEvent> {
        let query = ListQuery::new()
            .filter(|event: &CalendarEvent| {
                event.kind == EventType::Assignment && !event.completed && event.date >= today
            })
            .sort_by(chronological);
        self.events.list(&query)
    }

    /// The next tests from today on, soonest first.
    pub fn upcoming_tests(&self, today: NaiveDate) -> Vec<CalendarEvent> {
        let query = ListQuery::new()
            .filter(|event: &CalendarEvent| event.kind == EventType::Test && event.date >= today)
            .sort_by(chronological)
            .limit(UPCOMING_LIMIT);
        self.events.list(&query)
    }

    /// The next incomplete entries of any type from today on.
    pub fn upcoming_events(&self, today: NaiveDate) -> Vec<CalendarEvent> {
        let query = ListQuery::new()
            .filter(|event: &CalendarEvent| event.date >= today && !event.completed)
            .sort_by(chronological)
            .limit(UPCOMING_LIMIT);
        self.events.list(&query)
    }
}

/// Whole days from `today` until `date`; negative for past dates.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

fn chronological(a: &CalendarEvent, b: &CalendarEvent) -> std::cmp::Ordering {
    a.date.cmp(&b.date)
}
