//! Flashcard and quiz question domain model.
//!
//! # Invariants
//! - `correct_answer` indexes into `options`.

use crate::model::RecordId;
use crate::store::{CollectionKey, CollectionRecord, Record};
use serde::{Deserialize, Serialize};

/// Number of answer options on a generated quiz question.
pub const QUIZ_OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: RecordId,
    pub front: String,
    pub back: String,
    pub topic: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlashcardPatch {
    pub front: Option<String>,
    pub back: Option<String>,
    pub topic: Option<String>,
}

impl Record for Flashcard {
    type Patch = FlashcardPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: FlashcardPatch) {
        if let Some(front) = patch.front {
            self.front = front;
        }
        if let Some(back) = patch.back {
            self.back = back;
        }
        if let Some(topic) = patch.topic {
            self.topic = topic;
        }
    }
}

impl CollectionRecord for Flashcard {
    const KEY: CollectionKey = CollectionKey::Flashcards;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: RecordId,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub topic: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_answer
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizQuestionPatch {
    pub question: Option<String>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<usize>,
    pub topic: Option<String>,
}

impl Record for QuizQuestion {
    type Patch = QuizQuestionPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: QuizQuestionPatch) {
        if let Some(question) = patch.question {
            self.question = question;
        }
        if let Some(options) = patch.options {
            self.options = options;
        }
        if let Some(correct_answer) = patch.correct_answer {
            self.correct_answer = correct_answer;
        }
        if let Some(topic) = patch.topic {
            self.topic = topic;
        }
    }

    fn normalize(&mut self) {
        if self.correct_answer >= self.options.len() {
            self.correct_answer = 0;
        }
    }
}

impl CollectionRecord for QuizQuestion {
    const KEY: CollectionKey = CollectionKey::Quiz;
}
