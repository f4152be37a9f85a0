//! Note use-case service.
//!
//! # Responsibility
//! - Create, edit, tag and delete notes filed by subject.
//! - Provide the subject/search listing sorted by recency.
//!
//! # Invariants
//! - Every content-affecting change refreshes `updated_at`.
//! - Blank tags, links and highlights are ignored; duplicate tags are ignored.

use crate::model::note::{Note, NotePatch, Subject};
use crate::storage::KvStorage;
use crate::store::{Collection, ListQuery, Store, StoreResult};
use chrono::Utc;
use log::info;

/// Note service over the `notes` collection.
pub struct NoteService<'s, S: KvStorage> {
    notes: Collection<'s, S, Note>,
}

impl<'s, S: KvStorage> NoteService<'s, S> {
    /// Loads the notes collection from `store`.
    pub fn new(store: &'s Store<S>) -> StoreResult<Self> {
        Ok(Self {
            notes: store.collection()?,
        })
    }

    /// All notes in insertion order.
    pub fn notes(&self) -> &[Note] {
        self.notes.items()
    }

    pub fn get_note(&self, id: &str) -> Option<&Note> {
        self.notes.get(id)
    }

    /// Creates an empty note under `subject` and returns it.
    pub fn create_note(&mut self, subject: Subject) -> StoreResult<Note> {
        let now = Utc::now();
        let id = self
            .notes
            .insert_new(|id| Note::blank(id, subject, now))?;
        info!(
            "event=note_create module=service status=ok subject={}",
            subject.as_str()
        );
        Ok(Note::blank(id, subject, now))
    }

    /// Applies `patch` to the note and returns the updated record, or `None`
    /// when the note does not exist.
    pub fn update_note(&mut self, id: &str, patch: NotePatch) -> StoreResult<Option<Note>> {
        if !self.notes.update_by_id(id, patch)? {
            return Ok(None);
        }
        Ok(self.notes.get(id).cloned())
    }

    /// Adds one trimmed tag. Blank or already present tags are ignored.
    pub fn add_tag(&mut self, id: &str, tag: &str) -> StoreResult<bool> {
        let tag = tag.trim();
        let Some(note) = self.notes.get(id) else {
            return Ok(false);
        };
        if tag.is_empty() || note.tags.iter().any(|existing| existing == tag) {
            return Ok(false);
        }
        let mut tags = note.tags.clone();
        tags.push(tag.to_string());
        self.notes.update_by_id(
            id,
            NotePatch {
                tags: Some(tags),
                ..NotePatch::default()
            },
        )
    }

    /// Removes `tag` from the note. Absent tags are ignored.
    pub fn remove_tag(&mut self, id: &str, tag: &str) -> StoreResult<bool> {
        let Some(note) = self.notes.get(id) else {
            return Ok(false);
        };
        if !note.tags.iter().any(|existing| existing == tag) {
            return Ok(false);
        }
        let tags: Vec<String> = note
            .tags
            .iter()
            .filter(|existing| existing.as_str() != tag)
            .cloned()
            .collect();
        self.notes.update_by_id(
            id,
            NotePatch {
                tags: Some(tags),
                ..NotePatch::default()
            },
        )
    }

    /// Appends a reference link to the note.
    pub fn add_link(&mut self, id: &str, link: &str) -> StoreResult<bool> {
        let link = link.trim();
        let Some(note) = self.notes.get(id) else {
            return Ok(false);
        };
        if link.is_empty() {
            return Ok(false);
        }
        let mut links = note.links.clone();
        links.push(link.to_string());
        self.notes.update_by_id(
            id,
            NotePatch {
                links: Some(links),
                ..NotePatch::default()
            },
        )
    }

    /// Appends a highlighted passage to the note.
    pub fn add_highlight(&mut self, id: &str, passage: &str) -> StoreResult<bool> {
        let passage = passage.trim();
        let Some(note) = self.notes.get(id) else {
            return Ok(false);
        };
        if passage.is_empty() {
            return Ok(false);
        }
        let mut highlights = note.highlights.clone();
        highlights.push(passage.to_string());
        self.notes.update_by_id(
            id,
            NotePatch {
                highlights: Some(highlights),
                ..NotePatch::default()
            },
        )
    }

    pub fn delete_note(&mut self, id: &str) -> StoreResult<bool> {
        self.notes.remove_by_id(id)
    }

    /// Notes of `subject` (all subjects when `None`) matching `search`
    /// case-insensitively in title, content or tags, most recently updated
    /// first.
    pub fn list_notes(&self, subject: Option<Subject>, search: &str) -> Vec<Note> {
        let query = ListQuery::new()
            .filter(|note: &Note| {
                subject.map_or(true, |subject| note.subject == subject)
                    && note.matches_search(search)
            })
            .sort_by(by_recency);
        self.notes.list(&query)
    }

    /// The `limit` most recently updated notes across subjects.
    pub fn recent_notes(&self, limit: usize) -> Vec<Note> {
        self.notes
            .list(&ListQuery::new().sort_by(by_recency).limit(limit))
    }

    /// Note count per subject, in subject order.
    pub fn counts_by_subject(&self) -> Vec<(Subject, usize)> {
        Subject::ALL
            .into_iter()
            .map(|subject| {
                let count = self
                    .notes
                    .items()
                    .iter()
                    .filter(|note| note.subject == subject)
                    .count();
                (subject, count)
            })
            .collect()
    }
}

fn by_recency(a: &Note, b: &Note) -> std::cmp::Ordering {
    b.updated_at.cmp(&a.updated_at)
}
