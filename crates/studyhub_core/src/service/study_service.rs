//! Study aid use-case service.
//!
//! # Responsibility
//! - Turn pasted study material into flashcards and multiple-choice quiz
//!   questions with deterministic text heuristics.
//! - Answer tutor questions by quoting the first matching sentence.
//!
//! # Invariants
//! - Generated flashcards are appended; a generated quiz replaces the
//!   previous quiz.
//! - Blank material writes nothing.

use crate::model::study::{Flashcard, FlashcardPatch, QuizQuestion};
use crate::storage::KvStorage;
use crate::store::{Collection, Store, StoreResult};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Topic assigned to generated flashcards and questions.
pub const GENERATED_TOPIC: &str = "Generated";
/// Back text used when material has an odd number of lines.
pub const MISSING_DEFINITION: &str = "Add definition here";

const FALLBACK_CARD_LIMIT: usize = 10;
const FALLBACK_MIN_SENTENCE_CHARS: usize = 10;
const FALLBACK_FRONT_MAX_CHARS: usize = 50;
const QUIZ_QUESTION_LIMIT: usize = 5;
const QUIZ_MIN_SENTENCE_CHARS: usize = 15;
const QUIZ_EXCERPT_CHARS: usize = 60;
const QUIZ_DISTRACTORS: [&str; 3] = ["Unrelated term", "Another topic", "None of the above"];

static SENTENCE_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("valid sentence regex"));

/// Front/back pair derived from material, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDraft {
    pub front: String,
    pub back: String,
}

/// Quiz question derived from material, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

/// Result of grading a quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

/// Study tools service over the flashcards and quiz collections.
pub struct StudyService<'s, S: KvStorage> {
    flashcards: Collection<'s, S, Flashcard>,
    quiz: Collection<'s, S, QuizQuestion>,
}

impl<'s, S: KvStorage> StudyService<'s, S> {
    pub fn new(store: &'s Store<S>) -> StoreResult<Self> {
        Ok(Self {
            flashcards: store.collection()?,
            quiz: store.collection()?,
        })
    }

    pub fn flashcards(&self) -> &[Flashcard] {
        self.flashcards.items()
    }

    pub fn quiz(&self) -> &[QuizQuestion] {
        self.quiz.items()
    }

    /// Appends flashcards derived from `material` and returns the new cards.
    pub fn generate_flashcards(&mut self, material: &str) -> StoreResult<Vec<Flashcard>> {
        let drafts = derive_flashcards(material);
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let mut cards: Vec<Flashcard> = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let id = self.flashcards.issue_id();
            cards.push(Flashcard {
                id,
                front: draft.front,
                back: draft.back,
                topic: GENERATED_TOPIC.to_string(),
            });
        }
        self.flashcards.extend(cards.clone())?;
        info!(
            "event=flashcards_generate module=service status=ok cards={}",
            cards.len()
        );
        Ok(cards)
    }

    pub fn update_flashcard(&mut self, id: &str, patch: FlashcardPatch) -> StoreResult<bool> {
        self.flashcards.update_by_id(id, patch)
    }

    pub fn delete_flashcard(&mut self, id: &str) -> StoreResult<bool> {
        self.flashcards.remove_by_id(id)
    }

    /// Replaces the quiz with questions derived from `material`.
    ///
    /// Blank material leaves the current quiz untouched.
    pub fn generate_quiz(&mut self, material: &str) -> StoreResult<Vec<QuizQuestion>> {
        if material.trim().is_empty() {
            return Ok(Vec::new());
        }

        let questions: Vec<QuizQuestion> = derive_quiz(material)
            .into_iter()
            .map(|draft| QuizQuestion {
                id: self.quiz.issue_id(),
                question: draft.question,
                options: draft.options,
                correct_answer: draft.correct_answer,
                topic: GENERATED_TOPIC.to_string(),
            })
            .collect();
        self.quiz.replace_all(questions.clone())?;
        info!(
            "event=quiz_generate module=service status=ok questions={}",
            questions.len()
        );
        Ok(questions)
    }

    /// Grades `answers` against the stored quiz, position by position.
    pub fn score_quiz(&self, answers: &[usize]) -> QuizScore {
        score_answers(self.quiz.items(), answers)
    }
}

/// Pairs consecutive non-blank lines into front/back cards.
///
/// Falls back to one card per sentence (up to 10 sentences longer than 10
/// characters) when no line pair can be formed.
pub fn derive_flashcards(material: &str) -> Vec<CardDraft> {
    if material.trim().is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = material
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let mut cards: Vec<CardDraft> = lines
        .chunks(2)
        .map(|pair| CardDraft {
            front: pair[0].to_string(),
            back: pair
                .get(1)
                .map_or_else(|| MISSING_DEFINITION.to_string(), |back| back.to_string()),
        })
        .collect();

    if cards.is_empty() {
        cards = sentences(material)
            .filter(|sentence| sentence.chars().count() > FALLBACK_MIN_SENTENCE_CHARS)
            .take(FALLBACK_CARD_LIMIT)
            .map(|sentence| CardDraft {
                front: truncate_with_ellipsis(sentence, FALLBACK_FRONT_MAX_CHARS),
                back: sentence.to_string(),
            })
            .collect();
    }

    cards
}

/// Builds up to five questions from sentences longer than 15 characters.
/// The middle word of each sentence is the correct option, always first.
pub fn derive_quiz(material: &str) -> Vec<QuestionDraft> {
    sentences(material)
        .filter(|sentence| sentence.chars().count() > QUIZ_MIN_SENTENCE_CHARS)
        .take(QUIZ_QUESTION_LIMIT)
        .map(|sentence| {
            let words: Vec<&str> = sentence.split(' ').collect();
            let key_word = words
                .get(words.len() / 2)
                .copied()
                .filter(|word| !word.is_empty())
                .or_else(|| words.first().copied())
                .filter(|word| !word.is_empty())
                .unwrap_or("Option A");
            let excerpt: String = sentence.chars().take(QUIZ_EXCERPT_CHARS).collect();

            let mut options = Vec::with_capacity(1 + QUIZ_DISTRACTORS.len());
            options.push(key_word.to_string());
            options.extend(QUIZ_DISTRACTORS.iter().map(|option| option.to_string()));

            QuestionDraft {
                question: format!("Which of the following is related to: \"{excerpt}...\"?"),
                options,
                correct_answer: 0,
            }
        })
        .collect()
}

/// Deterministic tutor reply for `question` about `material`.
///
/// The question is trimmed before its first word is taken, so leading
/// whitespace does not change which sentence is quoted. Returns `None` for a
/// blank question.
pub fn tutor_reply(material: &str, question: &str) -> Option<String> {
    let question = question.trim();
    if question.is_empty() {
        return None;
    }
    if material.trim().is_empty() {
        return Some(
            "Please paste some study material above first, and then I can help you understand it better! 📝"
                .to_string(),
        );
    }

    let lowered = question.to_lowercase();
    let first_word = lowered.split(' ').next().unwrap_or_default();
    let relevant = SENTENCE_SPLIT_RE
        .split(material)
        .find(|sentence| sentence.to_lowercase().contains(first_word));

    let mut reply =
        String::from("That's a great question! Based on the content you provided, ");
    match relevant {
        Some(sentence) => {
            reply.push_str(&format!("here's what I found: \"{}\"", sentence.trim()));
        }
        None => reply.push_str(
            "I'd recommend reviewing the key concepts in your notes. Try breaking down the topic into smaller parts!",
        ),
    }
    Some(reply)
}

/// Counts answers matching the question at the same position.
pub fn score_answers(questions: &[QuizQuestion], answers: &[usize]) -> QuizScore {
    let correct = questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| question.is_correct(**answer))
        .count();
    QuizScore {
        correct,
        total: questions.len(),
    }
}

/// Index of the card after `current`, wrapping around.
pub fn next_card_index(current: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (current + 1) % len
    }
}

/// Index of the card before `current`, wrapping around.
pub fn previous_card_index(current: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (current + len - 1) % len
    }
}

fn sentences(material: &str) -> impl Iterator<Item = &str> {
    SENTENCE_SPLIT_RE
        .split(material)
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
}

fn truncate_with_ellipsis(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
