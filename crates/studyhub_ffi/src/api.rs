//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Open the shared database per call and route work through core services.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Calls touching the store run one at a time, so every read-modify-write
//!   sees the previous call's result.
//! - Structured payloads are JSON strings in the stored camelCase shape.

use chrono::{Local, NaiveDate, Utc};
use log::warn;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};
use studyhub_core::db::open_db;
use studyhub_core::model::academic::{CoursePatch, Grade};
use studyhub_core::model::calendar::EventType;
use studyhub_core::model::finance::{ExpenseCategory, ExpensePatch};
use studyhub_core::model::note::{NotePatch, Subject};
use studyhub_core::service::backup_service::backup_file_name;
use studyhub_core::service::study_service::tutor_reply as tutor_reply_inner;
use studyhub_core::service::{CategoryTotal, NewEvent, NewExpense};
use studyhub_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AcademicService, BackupService, CalendarService, FinanceService, NoteService,
    SqliteKvStorage, Store, StudyService,
};

const DB_FILE_NAME: &str = "studyhub.sqlite3";
const DB_PATH_ENV: &str = "STUDYHUB_DB_PATH";
const DATE_FORMAT: &str = "%Y-%m-%d";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

type CoreStore = Store<SqliteKvStorage>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Result envelope for commands that create or change one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the command changed anything.
    pub ok: bool,
    /// Id of the created or affected record, when there is one.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Result envelope for queries returning structured data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonResponse {
    pub ok: bool,
    /// JSON document on success.
    pub payload: Option<String>,
    pub message: String,
}

impl JsonResponse {
    fn from_result(op: &str, result: Result<String, String>) -> Self {
        match result {
            Ok(payload) => Self {
                ok: true,
                payload: Some(payload),
                message: String::new(),
            },
            Err(err) => Self {
                ok: false,
                payload: None,
                message: format!("{op} failed: {err}"),
            },
        }
    }
}

#[derive(Serialize)]
struct MonthlySpending {
    total: f64,
    categories: Vec<CategoryTotal>,
}

/// GPA summary (per semester and cumulative) as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn gpa_summary(weighted: bool) -> JsonResponse {
    let result = with_store("gpa_summary", |store| {
        let service = AcademicService::new(store).map_err(|err| err.to_string())?;
        to_json(&service.summary(weighted))
    });
    JsonResponse::from_result("gpa_summary", result)
}

/// Adds a `Semester N` entry for the current year.
#[flutter_rust_bridge::frb(sync)]
pub fn add_semester() -> ActionResponse {
    let result = with_store("add_semester", |store| {
        let mut service = AcademicService::new(store).map_err(|err| err.to_string())?;
        service.add_semester().map_err(|err| err.to_string())
    });
    match result {
        Ok(id) => ActionResponse::success("Semester added.", Some(id)),
        Err(err) => ActionResponse::failure(format!("add_semester failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_semester(semester_id: String) -> ActionResponse {
    let result = with_store("delete_semester", |store| {
        let mut service = AcademicService::new(store).map_err(|err| err.to_string())?;
        service
            .delete_semester(&semester_id)
            .map_err(|err| err.to_string())
    });
    changed_response(result, "Semester deleted.", "Semester not found.", &semester_id)
}

/// Adds a course to a semester.
///
/// Input semantics:
/// - `grade`: letter grade such as `A-`; unknown text is stored as given and
///   scores 0.0.
/// - `credit_hours`: non-positive values keep the default of one hour.
/// - `is_honors` and `is_ap`: AP wins when both are set.
#[flutter_rust_bridge::frb(sync)]
pub fn add_course(
    semester_id: String,
    name: String,
    grade: String,
    credit_hours: f64,
    is_honors: bool,
    is_ap: bool,
) -> ActionResponse {
    let patch = CoursePatch {
        name: Some(name.trim().to_string()),
        grade: Some(Grade::parse(&grade)),
        credit_hours: Some(credit_hours),
        is_honors: Some(is_honors),
        is_ap: Some(is_ap),
    };
    let result = with_store("add_course", |store| {
        let mut service = AcademicService::new(store).map_err(|err| err.to_string())?;
        service
            .add_course_with(&semester_id, patch)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(Some(id)) => ActionResponse::success("Course added.", Some(id)),
        Ok(None) => ActionResponse::failure("Semester not found."),
        Err(err) => ActionResponse::failure(format!("add_course failed: {err}")),
    }
}

/// Changes the given fields of a course; `None` leaves a field as it is.
///
/// Invalid credit hours are ignored and setting Honors or AP clears the other.
#[flutter_rust_bridge::frb(sync)]
pub fn update_course(
    semester_id: String,
    course_id: String,
    name: Option<String>,
    grade: Option<String>,
    credit_hours: Option<f64>,
    is_honors: Option<bool>,
    is_ap: Option<bool>,
) -> ActionResponse {
    let patch = CoursePatch {
        name: name.map(|name| name.trim().to_string()),
        grade: grade.as_deref().map(Grade::parse),
        credit_hours,
        is_honors,
        is_ap,
    };
    let result = with_store("update_course", |store| {
        let mut service = AcademicService::new(store).map_err(|err| err.to_string())?;
        service
            .update_course(&semester_id, &course_id, patch)
            .map_err(|err| err.to_string())
    });
    changed_response(result, "Course updated.", "Course not found.", &course_id)
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_course(semester_id: String, course_id: String) -> ActionResponse {
    let result = with_store("delete_course", |store| {
        let mut service = AcademicService::new(store).map_err(|err| err.to_string())?;
        service
            .delete_course(&semester_id, &course_id)
            .map_err(|err| err.to_string())
    });
    changed_response(result, "Course deleted.", "Course not found.", &course_id)
}

/// Creates a blank note under `subject` (`math|science|english|history`).
#[flutter_rust_bridge::frb(sync)]
pub fn create_note(subject: String) -> ActionResponse {
    let Some(subject) = Subject::parse(&subject) else {
        return ActionResponse::failure(format!("unknown subject `{}`", subject.trim()));
    };
    let result = with_store("create_note", |store| {
        let mut service = NoteService::new(store).map_err(|err| err.to_string())?;
        service
            .create_note(subject)
            .map(|note| note.id)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(id) => ActionResponse::success("Note created.", Some(id)),
        Err(err) => ActionResponse::failure(format!("create_note failed: {err}")),
    }
}

/// Notes, most recently updated first, as JSON.
///
/// Input semantics:
/// - `subject`: optional subject filter; unknown text is rejected.
/// - `search`: case-insensitive match on title, content or tags; blank
///   matches everything.
#[flutter_rust_bridge::frb(sync)]
pub fn list_notes(subject: Option<String>, search: String) -> JsonResponse {
    let subject = match subject.as_deref().map(parse_subject).transpose() {
        Ok(subject) => subject,
        Err(err) => return JsonResponse::from_result("list_notes", Err(err)),
    };
    let result = with_store("list_notes", |store| {
        let service = NoteService::new(store).map_err(|err| err.to_string())?;
        to_json(&service.list_notes(subject, &search))
    });
    JsonResponse::from_result("list_notes", result)
}

/// Changes the given fields of a note and refreshes `updatedAt`.
#[flutter_rust_bridge::frb(sync)]
pub fn update_note(
    note_id: String,
    title: Option<String>,
    content: Option<String>,
    subject: Option<String>,
) -> ActionResponse {
    let subject = match subject.as_deref().map(parse_subject).transpose() {
        Ok(subject) => subject,
        Err(err) => return ActionResponse::failure(err),
    };
    let patch = NotePatch {
        subject,
        title,
        content,
        ..NotePatch::default()
    };
    let result = with_store("update_note", |store| {
        let mut service = NoteService::new(store).map_err(|err| err.to_string())?;
        service
            .update_note(&note_id, patch)
            .map(|updated| updated.is_some())
            .map_err(|err| err.to_string())
    });
    changed_response(result, "Note updated.", "Note not found.", &note_id)
}

/// Adds a tag; blank and duplicate tags leave the note unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn add_note_tag(note_id: String, tag: String) -> ActionResponse {
    let result = with_store("add_note_tag", |store| {
        let mut service = NoteService::new(store).map_err(|err| err.to_string())?;
        service.add_tag(&note_id, &tag).map_err(|err| err.to_string())
    });
    changed_response(result, "Tag added.", "Tag not added.", &note_id)
}

#[flutter_rust_bridge::frb(sync)]
pub fn remove_note_tag(note_id: String, tag: String) -> ActionResponse {
    let result = with_store("remove_note_tag", |store| {
        let mut service = NoteService::new(store).map_err(|err| err.to_string())?;
        service
            .remove_tag(&note_id, &tag)
            .map_err(|err| err.to_string())
    });
    changed_response(result, "Tag removed.", "Tag not found.", &note_id)
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_note(note_id: String) -> ActionResponse {
    let result = with_store("delete_note", |store| {
        let mut service = NoteService::new(store).map_err(|err| err.to_string())?;
        service.delete_note(&note_id).map_err(|err| err.to_string())
    });
    changed_response(result, "Note deleted.", "Note not found.", &note_id)
}

/// Records an expense dated `date` (`YYYY-MM-DD`).
#[flutter_rust_bridge::frb(sync)]
pub fn add_expense(
    amount: f64,
    category: String,
    description: String,
    date: String,
) -> ActionResponse {
    let Some(category) = ExpenseCategory::parse(&category) else {
        return ActionResponse::failure(format!("unknown category `{}`", category.trim()));
    };
    let date = match parse_date(&date) {
        Ok(date) => date,
        Err(err) => return ActionResponse::failure(err),
    };
    let input = NewExpense {
        amount,
        category,
        description: description.trim().to_string(),
        date,
    };
    let result = with_store("add_expense", |store| {
        let mut service = FinanceService::new(store).map_err(|err| err.to_string())?;
        service.add_expense(input).map_err(|err| err.to_string())
    });
    match result {
        Ok(Some(id)) => ActionResponse::success("Expense added.", Some(id)),
        Ok(None) => ActionResponse::failure("Amount must be a positive number."),
        Err(err) => ActionResponse::failure(format!("add_expense failed: {err}")),
    }
}

/// Expenses as JSON; with `month` (`YYYY-MM-DD`, any day) only that month's,
/// newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn list_expenses(month: Option<String>) -> JsonResponse {
    let month = match month.as_deref().map(parse_date).transpose() {
        Ok(month) => month,
        Err(err) => return JsonResponse::from_result("list_expenses", Err(err)),
    };
    let result = with_store("list_expenses", |store| {
        let service = FinanceService::new(store).map_err(|err| err.to_string())?;
        match month {
            Some(month) => to_json(&service.expenses_in_month(month)),
            None => to_json(service.expenses()),
        }
    });
    JsonResponse::from_result("list_expenses", result)
}

/// Changes the given fields of an expense; a non-positive amount is ignored.
#[flutter_rust_bridge::frb(sync)]
pub fn update_expense(
    expense_id: String,
    amount: Option<f64>,
    category: Option<String>,
    description: Option<String>,
    date: Option<String>,
) -> ActionResponse {
    let category = match category.as_deref().map(parse_category).transpose() {
        Ok(category) => category,
        Err(err) => return ActionResponse::failure(err),
    };
    let date = match date.as_deref().map(parse_date).transpose() {
        Ok(date) => date,
        Err(err) => return ActionResponse::failure(err),
    };
    let patch = ExpensePatch {
        amount,
        category,
        description: description.map(|description| description.trim().to_string()),
        date,
    };
    let result = with_store("update_expense", |store| {
        let mut service = FinanceService::new(store).map_err(|err| err.to_string())?;
        service
            .update_expense(&expense_id, patch)
            .map_err(|err| err.to_string())
    });
    changed_response(result, "Expense updated.", "Expense not found.", &expense_id)
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_expense(expense_id: String) -> ActionResponse {
    let result = with_store("delete_expense", |store| {
        let mut service = FinanceService::new(store).map_err(|err| err.to_string())?;
        service
            .delete_expense(&expense_id)
            .map_err(|err| err.to_string())
    });
    changed_response(result, "Expense deleted.", "Expense not found.", &expense_id)
}

/// Month total and per-category breakdown for the month of `month`, as JSON
/// `{"total": .., "categories": [..]}`.
#[flutter_rust_bridge::frb(sync)]
pub fn monthly_spending(month: String) -> JsonResponse {
    let month = match parse_date(&month) {
        Ok(month) => month,
        Err(err) => return JsonResponse::from_result("monthly_spending", Err(err)),
    };
    let result = with_store("monthly_spending", |store| {
        let service = FinanceService::new(store).map_err(|err| err.to_string())?;
        to_json(&MonthlySpending {
            total: service.monthly_total(month),
            categories: service.category_breakdown(month),
        })
    });
    JsonResponse::from_result("monthly_spending", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn list_goals() -> JsonResponse {
    let result = with_store("list_goals", |store| {
        let service = FinanceService::new(store).map_err(|err| err.to_string())?;
        to_json(service.goals())
    });
    JsonResponse::from_result("list_goals", result)
}

/// Creates a savings goal starting at zero.
#[flutter_rust_bridge::frb(sync)]
pub fn add_goal(name: String, target_amount: f64) -> ActionResponse {
    let result = with_store("add_goal", |store| {
        let mut service = FinanceService::new(store).map_err(|err| err.to_string())?;
        service
            .add_goal(&name, target_amount)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(Some(id)) => ActionResponse::success("Goal added.", Some(id)),
        Ok(None) => ActionResponse::failure("Name is required and target must be positive."),
        Err(err) => ActionResponse::failure(format!("add_goal failed: {err}")),
    }
}

/// Sets the saved amount of a goal, clamped to `[0, target]`.
#[flutter_rust_bridge::frb(sync)]
pub fn update_goal_amount(goal_id: String, amount: f64) -> ActionResponse {
    let result = with_store("update_goal_amount", |store| {
        let mut service = FinanceService::new(store).map_err(|err| err.to_string())?;
        service
            .update_goal_amount(&goal_id, amount)
            .map_err(|err| err.to_string())
    });
    changed_response(result, "Goal updated.", "Goal not found.", &goal_id)
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_goal(goal_id: String) -> ActionResponse {
    let result = with_store("delete_goal", |store| {
        let mut service = FinanceService::new(store).map_err(|err| err.to_string())?;
        service.delete_goal(&goal_id).map_err(|err| err.to_string())
    });
    changed_response(result, "Goal deleted.", "Goal not found.", &goal_id)
}

/// Sets or replaces the monthly limit for `category`.
#[flutter_rust_bridge::frb(sync)]
pub fn set_spending_limit(category: String, limit: f64) -> ActionResponse {
    let category = match parse_category(&category) {
        Ok(category) => category,
        Err(err) => return ActionResponse::failure(err),
    };
    let result = with_store("set_spending_limit", |store| {
        let mut service = FinanceService::new(store).map_err(|err| err.to_string())?;
        service
            .set_spending_limit(category, limit)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(true) => ActionResponse::success("Limit saved.", Some(category.as_str().to_string())),
        Ok(false) => ActionResponse::failure("Limit must be a positive number."),
        Err(err) => ActionResponse::failure(format!("set_spending_limit failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn remove_spending_limit(category: String) -> ActionResponse {
    let category = match parse_category(&category) {
        Ok(category) => category,
        Err(err) => return ActionResponse::failure(err),
    };
    let result = with_store("remove_spending_limit", |store| {
        let mut service = FinanceService::new(store).map_err(|err| err.to_string())?;
        service
            .remove_spending_limit(category)
            .map_err(|err| err.to_string())
    });
    changed_response(result, "Limit removed.", "No limit set.", category.as_str())
}

/// Spend against every configured limit in the month of `month`, as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn budget_status(month: String) -> JsonResponse {
    let month = match parse_date(&month) {
        Ok(month) => month,
        Err(err) => return JsonResponse::from_result("budget_status", Err(err)),
    };
    let result = with_store("budget_status", |store| {
        let service = FinanceService::new(store).map_err(|err| err.to_string())?;
        to_json(&service.budget_status(month))
    });
    JsonResponse::from_result("budget_status", result)
}

/// Adds a calendar entry.
///
/// Input semantics:
/// - `kind`: `assignment|test|event|reminder`.
/// - `date` / `end_date`: `YYYY-MM-DD`; an end before the start is rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn add_event(
    title: String,
    date: String,
    end_date: Option<String>,
    kind: String,
    subject: Option<String>,
    description: Option<String>,
) -> ActionResponse {
    let Some(kind) = EventType::parse(&kind) else {
        return ActionResponse::failure(format!("unknown event type `{}`", kind.trim()));
    };
    let date = match parse_date(&date) {
        Ok(date) => date,
        Err(err) => return ActionResponse::failure(err),
    };
    let end_date = match end_date.as_deref().map(parse_date).transpose() {
        Ok(end_date) => end_date,
        Err(err) => return ActionResponse::failure(err),
    };
    let input = NewEvent {
        title,
        date,
        end_date,
        kind,
        subject: subject.as_deref().and_then(Subject::parse),
        description,
    };
    let result = with_store("add_event", |store| {
        let mut service = CalendarService::new(store).map_err(|err| err.to_string())?;
        service.add_event(input).map_err(|err| err.to_string())
    });
    match result {
        Ok(Some(id)) => ActionResponse::success("Event added.", Some(id)),
        Ok(None) => ActionResponse::failure("Title is required and end must not precede start."),
        Err(err) => ActionResponse::failure(format!("add_event failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn toggle_event(event_id: String) -> ActionResponse {
    let result = with_store("toggle_event", |store| {
        let mut service = CalendarService::new(store).map_err(|err| err.to_string())?;
        service
            .toggle_complete(&event_id)
            .map_err(|err| err.to_string())
    });
    changed_response(result, "Event updated.", "Event not found.", &event_id)
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_event(event_id: String) -> ActionResponse {
    let result = with_store("delete_event", |store| {
        let mut service = CalendarService::new(store).map_err(|err| err.to_string())?;
        service.delete_event(&event_id).map_err(|err| err.to_string())
    });
    changed_response(result, "Event deleted.", "Event not found.", &event_id)
}

/// Entries on `date` (`YYYY-MM-DD`), alphabetical by title, as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn events_on(date: String) -> JsonResponse {
    let date = match parse_date(&date) {
        Ok(date) => date,
        Err(err) => return JsonResponse::from_result("events_on", Err(err)),
    };
    let result = with_store("events_on", |store| {
        let service = CalendarService::new(store).map_err(|err| err.to_string())?;
        to_json(&service.events_on(date))
    });
    JsonResponse::from_result("events_on", result)
}

/// Incomplete assignments due today or later, soonest first, as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn homework() -> JsonResponse {
    let today = Local::now().date_naive();
    let result = with_store("homework", |store| {
        let service = CalendarService::new(store).map_err(|err| err.to_string())?;
        to_json(&service.homework(today))
    });
    JsonResponse::from_result("homework", result)
}

/// Upcoming incomplete calendar entries from today on, as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn upcoming_events() -> JsonResponse {
    let today = Local::now().date_naive();
    let result = with_store("upcoming_events", |store| {
        let service = CalendarService::new(store).map_err(|err| err.to_string())?;
        to_json(&service.upcoming_events(today))
    });
    JsonResponse::from_result("upcoming_events", result)
}

/// Generates flashcards from pasted material; returns the new cards as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn generate_flashcards(material: String) -> JsonResponse {
    let result = with_store("generate_flashcards", |store| {
        let mut service = StudyService::new(store).map_err(|err| err.to_string())?;
        let cards = service
            .generate_flashcards(&material)
            .map_err(|err| err.to_string())?;
        to_json(&cards)
    });
    JsonResponse::from_result("generate_flashcards", result)
}

/// Replaces the quiz with questions generated from material, as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn generate_quiz(material: String) -> JsonResponse {
    let result = with_store("generate_quiz", |store| {
        let mut service = StudyService::new(store).map_err(|err| err.to_string())?;
        let questions = service
            .generate_quiz(&material)
            .map_err(|err| err.to_string())?;
        to_json(&questions)
    });
    JsonResponse::from_result("generate_quiz", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn list_flashcards() -> JsonResponse {
    let result = with_store("list_flashcards", |store| {
        let service = StudyService::new(store).map_err(|err| err.to_string())?;
        to_json(service.flashcards())
    });
    JsonResponse::from_result("list_flashcards", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_flashcard(card_id: String) -> ActionResponse {
    let result = with_store("delete_flashcard", |store| {
        let mut service = StudyService::new(store).map_err(|err| err.to_string())?;
        service
            .delete_flashcard(&card_id)
            .map_err(|err| err.to_string())
    });
    changed_response(result, "Flashcard deleted.", "Flashcard not found.", &card_id)
}

/// The stored quiz, as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn current_quiz() -> JsonResponse {
    let result = with_store("current_quiz", |store| {
        let service = StudyService::new(store).map_err(|err| err.to_string())?;
        to_json(service.quiz())
    });
    JsonResponse::from_result("current_quiz", result)
}

/// Grades `answers` (option index per question, in quiz order) as JSON
/// `{"correct": .., "total": ..}`. Missing answers count as wrong.
#[flutter_rust_bridge::frb(sync)]
pub fn score_quiz(answers: Vec<u32>) -> JsonResponse {
    let answers: Vec<usize> = answers.into_iter().map(|answer| answer as usize).collect();
    let result = with_store("score_quiz", |store| {
        let service = StudyService::new(store).map_err(|err| err.to_string())?;
        to_json(&service.score_quiz(&answers))
    });
    JsonResponse::from_result("score_quiz", result)
}

/// Tutor answer for `question` about `material`; empty for a blank question.
#[flutter_rust_bridge::frb(sync)]
pub fn tutor_reply(material: String, question: String) -> String {
    tutor_reply_inner(&material, &question).unwrap_or_default()
}

/// Exports the backup bundle; `message` carries the suggested file name.
#[flutter_rust_bridge::frb(sync)]
pub fn export_data() -> JsonResponse {
    let result = with_store("export_data", |store| {
        BackupService::new(store)
            .export_bundle(Utc::now())
            .map_err(|err| err.to_string())
    });
    let mut response = JsonResponse::from_result("export_data", result);
    if response.ok {
        response.message = backup_file_name(Local::now().date_naive());
    }
    response
}

/// Imports a backup bundle; nothing is written when it is rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn import_data(bundle: String) -> ActionResponse {
    let result = with_store("import_data", |store| {
        BackupService::new(store)
            .import_bundle(&bundle)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(report) => ActionResponse::success(
            format!(
                "Imported {} collection(s), skipped {}.",
                report.written.len(),
                report.skipped.len()
            ),
            None,
        ),
        Err(err) => ActionResponse::failure(format!("import_data failed: {err}")),
    }
}

/// Removes every StudyHub collection.
#[flutter_rust_bridge::frb(sync)]
pub fn clear_all_data() -> ActionResponse {
    let result = with_store("clear_all_data", |store| {
        BackupService::new(store)
            .clear_all()
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(()) => ActionResponse::success("All data cleared.", None),
        Err(err) => ActionResponse::failure(format!("clear_all_data failed: {err}")),
    }
}

fn changed_response(
    result: Result<bool, String>,
    changed: &str,
    missing: &str,
    id: &str,
) -> ActionResponse {
    match result {
        Ok(true) => ActionResponse::success(changed, Some(id.to_string())),
        Ok(false) => ActionResponse::failure(missing),
        Err(err) => ActionResponse::failure(err),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|err| format!("invalid date `{}`: {err}", raw.trim()))
}

fn parse_subject(raw: &str) -> Result<Subject, String> {
    Subject::parse(raw).ok_or_else(|| format!("unknown subject `{}`", raw.trim()))
}

fn parse_category(raw: &str) -> Result<ExpenseCategory, String> {
    ExpenseCategory::parse(raw).ok_or_else(|| format!("unknown category `{}`", raw.trim()))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|err| format!("failed to encode payload: {err}"))
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_store<T>(
    op: &str,
    f: impl FnOnce(&CoreStore) -> Result<T, String>,
) -> Result<T, String> {
    let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let conn = open_db(resolve_db_path()).map_err(|err| format!("DB open failed: {err}"))?;
    let store = Store::new(SqliteKvStorage::new(conn));
    f(&store).inspect_err(|err| {
        warn!("event=ffi_call module=ffi status=error op={op} reason={err}");
    })
}

#[cfg(test)]
mod tests {
    use super::{
        add_course, add_event, add_expense, add_goal, add_note_tag, add_semester, budget_status,
        core_version, create_note, current_quiz, delete_course, delete_event, delete_expense,
        delete_flashcard, delete_goal, delete_note, delete_semester, events_on, export_data,
        generate_flashcards, generate_quiz, gpa_summary, homework, import_data, init_logging,
        list_expenses, list_flashcards, list_goals, list_notes, monthly_spending, ping,
        remove_note_tag, remove_spending_limit, score_quiz, set_spending_limit, toggle_event,
        tutor_reply, update_course, update_expense, update_goal_amount, update_note,
    };
    use rusqlite::OptionalExtension;
    use studyhub_core::db::open_db;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn course_lands_in_gpa_summary() {
        let semester = add_semester();
        assert!(semester.ok, "{}", semester.message);
        let semester_id = semester.id.expect("semester id");

        let course_name = unique_token("course");
        let course = add_course(
            semester_id.clone(),
            course_name.clone(),
            "B".to_string(),
            3.0,
            true,
            true,
        );
        assert!(course.ok, "{}", course.message);

        let summary = gpa_summary(true);
        assert!(summary.ok, "{}", summary.message);
        let payload: serde_json::Value =
            serde_json::from_str(&summary.payload.expect("payload")).expect("valid json");
        let entry = payload["semesters"]
            .as_array()
            .expect("semesters array")
            .iter()
            .find(|entry| entry["semesterId"] == semester_id.as_str())
            .expect("semester in summary");
        // AP wins over Honors: B (3.0) + 1.0.
        assert_eq!(entry["gpa"], 4.0);

        assert!(delete_semester(semester_id.clone()).ok);
        assert!(!delete_semester(semester_id).ok);
    }

    #[test]
    fn add_course_to_unknown_semester_fails() {
        let response = add_course(
            unique_token("missing-semester"),
            "Chemistry".to_string(),
            "A".to_string(),
            1.0,
            false,
            false,
        );
        assert!(!response.ok);
    }

    #[test]
    fn invalid_inputs_are_reported_without_writing() {
        assert!(!create_note("astronomy".to_string()).ok);
        assert!(!add_expense(-3.0, "food".to_string(), "gum".to_string(), "2024-05-01".to_string()).ok);
        assert!(!add_expense(3.0, "food".to_string(), "gum".to_string(), "May 1st".to_string()).ok);
        let reversed = add_event(
            "Trip".to_string(),
            "2024-05-02".to_string(),
            Some("2024-05-01".to_string()),
            "event".to_string(),
            None,
            None,
        );
        assert!(!reversed.ok);
    }

    #[test]
    fn created_records_are_stored_in_kv_entries() {
        let note = create_note("science".to_string());
        assert!(note.ok, "{}", note.message);
        let note_id = note.id.expect("note id");

        let expense = add_expense(
            4.5,
            "Food".to_string(),
            unique_token("snack"),
            "2024-05-01".to_string(),
        );
        assert!(expense.ok, "{}", expense.message);

        let conn = open_db(super::resolve_db_path()).expect("open db");
        let notes: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = 'studyhub-notes'",
                [],
                |row| row.get(0),
            )
            .optional()
            .expect("query notes");
        assert!(notes.expect("notes stored").contains(&note_id));
    }

    #[test]
    fn events_toggle_completion() {
        let event = add_event(
            unique_token("exam"),
            "2030-01-15".to_string(),
            None,
            "test".to_string(),
            Some("math".to_string()),
            Some("Chapters 1-3".to_string()),
        );
        assert!(event.ok, "{}", event.message);
        let event_id = event.id.expect("event id");

        assert!(toggle_event(event_id.clone()).ok);
        assert!(!toggle_event(unique_token("missing-event")).ok);
    }

    #[test]
    fn study_tools_return_generated_payloads() {
        let cards = generate_flashcards(format!("{}\nDefinition", unique_token("term")));
        assert!(cards.ok, "{}", cards.message);
        let parsed: serde_json::Value =
            serde_json::from_str(&cards.payload.expect("payload")).expect("valid json");
        assert_eq!(parsed[0]["back"], "Definition");

        let quiz = generate_quiz("Enzymes speed up chemical reactions.".to_string());
        assert!(quiz.ok, "{}", quiz.message);
        let parsed: serde_json::Value =
            serde_json::from_str(&quiz.payload.expect("payload")).expect("valid json");
        assert_eq!(parsed[0]["correctAnswer"], 0);

        assert_eq!(tutor_reply("Some text.".to_string(), "  ".to_string()), "");
    }

    #[test]
    fn flashcards_can_be_read_back_and_deleted() {
        let front = unique_token("mitosis");
        let cards = generate_flashcards(format!("{front}\nCell division"));
        assert!(cards.ok, "{}", cards.message);
        let created: serde_json::Value =
            serde_json::from_str(&cards.payload.expect("payload")).expect("valid json");
        let card_id = created[0]["id"].as_str().expect("card id").to_string();

        let listed = json_payload(list_flashcards());
        assert!(listed
            .as_array()
            .expect("cards array")
            .iter()
            .any(|card| card["id"] == card_id.as_str() && card["front"] == front.as_str()));

        assert!(delete_flashcard(card_id.clone()).ok);
        assert!(!delete_flashcard(card_id).ok);
    }

    #[test]
    fn stored_quiz_is_read_back_and_scored() {
        // Same material as the generation test, so either run leaves one
        // question whose answer is option 0.
        let generated = generate_quiz("Enzymes speed up chemical reactions.".to_string());
        assert!(generated.ok, "{}", generated.message);

        let quiz = json_payload(current_quiz());
        assert_eq!(quiz.as_array().expect("quiz array").len(), 1);

        let perfect = json_payload(score_quiz(vec![0]));
        assert_eq!(perfect["correct"], 1);
        assert_eq!(perfect["total"], 1);

        let missed = json_payload(score_quiz(Vec::new()));
        assert_eq!(missed["correct"], 0);
        assert_eq!(missed["total"], 1);
    }

    #[test]
    fn export_returns_bundle_and_file_name() {
        let response = export_data();
        assert!(response.ok, "{}", response.message);
        assert!(response.message.starts_with("studyhub-backup-"));
        let parsed: serde_json::Value =
            serde_json::from_str(&response.payload.expect("payload")).expect("valid json");
        assert_eq!(parsed["version"], 1);
    }

    #[test]
    fn import_rejects_invalid_bundle_and_accepts_limits() {
        assert!(!import_data("not json".to_string()).ok);

        let response = import_data(
            r#"{"version":1,"studyhub-spending-limits":[{"category":"food","limit":25.0}]}"#
                .to_string(),
        );
        assert!(response.ok, "{}", response.message);
        assert!(response.message.contains("Imported 1"));
    }

    #[test]
    fn notes_can_be_listed_updated_tagged_and_deleted() {
        let note = create_note("history".to_string());
        assert!(note.ok, "{}", note.message);
        let note_id = note.id.expect("note id");
        let title = unique_token("treaty");

        assert!(update_note(note_id.clone(), Some(title.clone()), Some("Versailles".to_string()), None).ok);
        assert!(add_note_tag(note_id.clone(), " exam ".to_string()).ok);
        assert!(!add_note_tag(note_id.clone(), "exam".to_string()).ok);

        let listed = json_payload(list_notes(Some("history".to_string()), title.clone()));
        let listed = listed.as_array().expect("notes array");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], note_id.as_str());
        assert_eq!(listed[0]["content"], "Versailles");
        assert_eq!(listed[0]["tags"], serde_json::json!(["exam"]));

        let other_subject = json_payload(list_notes(Some("math".to_string()), title.clone()));
        assert!(other_subject.as_array().expect("notes array").is_empty());
        assert!(!list_notes(Some("astronomy".to_string()), String::new()).ok);

        assert!(remove_note_tag(note_id.clone(), "exam".to_string()).ok);
        assert!(delete_note(note_id.clone()).ok);
        assert!(!delete_note(note_id.clone()).ok);
        assert!(!update_note(note_id, Some(title), None, None).ok);
    }

    #[test]
    fn courses_can_be_updated_and_deleted() {
        let semester_id = add_semester().id.expect("semester id");
        let course = add_course(
            semester_id.clone(),
            "Biology".to_string(),
            "C".to_string(),
            2.0,
            false,
            false,
        );
        let course_id = course.id.expect("course id");

        let updated = update_course(
            semester_id.clone(),
            course_id.clone(),
            None,
            Some("A".to_string()),
            Some(-1.0),
            Some(true),
            None,
        );
        assert!(updated.ok, "{}", updated.message);

        let summary = json_payload(gpa_summary(true));
        let entry = summary["semesters"]
            .as_array()
            .expect("semesters array")
            .iter()
            .find(|entry| entry["semesterId"] == semester_id.as_str())
            .expect("semester in summary")
            .clone();
        // Honors A (4.0 + 0.5); the negative credit hours were ignored.
        assert_eq!(entry["gpa"], 4.5);
        assert_eq!(entry["creditHours"], 2.0);

        assert!(delete_course(semester_id.clone(), course_id.clone()).ok);
        assert!(!delete_course(semester_id.clone(), course_id).ok);
        assert!(delete_semester(semester_id).ok);
    }

    #[test]
    fn expenses_can_be_listed_updated_and_deleted() {
        let description = unique_token("textbook");
        let expense = add_expense(
            12.0,
            "school".to_string(),
            description.clone(),
            "2031-03-10".to_string(),
        );
        assert!(expense.ok, "{}", expense.message);
        let expense_id = expense.id.expect("expense id");

        let updated = update_expense(
            expense_id.clone(),
            Some(30.0),
            Some("other".to_string()),
            None,
            None,
        );
        assert!(updated.ok, "{}", updated.message);
        assert!(!update_expense(expense_id.clone(), None, Some("rent".to_string()), None, None).ok);

        let march = json_payload(list_expenses(Some("2031-03-01".to_string())));
        let stored = march
            .as_array()
            .expect("expenses array")
            .iter()
            .find(|item| item["id"] == expense_id.as_str())
            .expect("expense in month")
            .clone();
        assert_eq!(stored["amount"], 30.0);
        assert_eq!(stored["category"], "other");
        assert_eq!(stored["description"], description.as_str());

        let spending = json_payload(monthly_spending("2031-03-15".to_string()));
        assert!(spending["total"].as_f64().expect("total") >= 30.0);

        assert!(delete_expense(expense_id.clone()).ok);
        assert!(!delete_expense(expense_id).ok);
    }

    #[test]
    fn goals_clamp_saved_amount_to_target() {
        assert!(!add_goal("Trip".to_string(), 0.0).ok);

        let goal = add_goal(unique_token("bike"), 100.0);
        assert!(goal.ok, "{}", goal.message);
        let goal_id = goal.id.expect("goal id");
        assert!(update_goal_amount(goal_id.clone(), 500.0).ok);

        let goals = json_payload(list_goals());
        let stored = goals
            .as_array()
            .expect("goals array")
            .iter()
            .find(|item| item["id"] == goal_id.as_str())
            .expect("goal stored")
            .clone();
        assert_eq!(stored["currentAmount"], 100.0);

        assert!(delete_goal(goal_id.clone()).ok);
        assert!(!delete_goal(goal_id).ok);
    }

    #[test]
    fn spending_limits_feed_budget_status() {
        assert!(!set_spending_limit("snacks".to_string(), 10.0).ok);
        assert!(!set_spending_limit("food".to_string(), -1.0).ok);
        assert!(!budget_status("July".to_string()).ok);

        // The import test stores the same food limit, so the value holds
        // whichever test writes last.
        let saved = set_spending_limit("Food".to_string(), 25.0);
        assert!(saved.ok, "{}", saved.message);
        assert_eq!(saved.id.as_deref(), Some("food"));

        let statuses = json_payload(budget_status("2031-07-01".to_string()));
        let food = statuses
            .as_array()
            .expect("status array")
            .iter()
            .find(|status| status["category"] == "food")
            .expect("food status")
            .clone();
        assert_eq!(food["limit"], 25.0);
        assert_eq!(food["overLimit"], false);

        assert!(remove_spending_limit("food".to_string()).ok);
        assert!(!remove_spending_limit("rent".to_string()).ok);
    }

    #[test]
    fn calendar_day_and_homework_views_include_new_assignment() {
        let title = unique_token("essay");
        let event = add_event(
            title.clone(),
            "2030-02-20".to_string(),
            None,
            "assignment".to_string(),
            Some("english".to_string()),
            None,
        );
        assert!(event.ok, "{}", event.message);
        let event_id = event.id.expect("event id");

        let day = json_payload(events_on("2030-02-20".to_string()));
        assert!(day
            .as_array()
            .expect("events array")
            .iter()
            .any(|item| item["id"] == event_id.as_str()));
        assert!(!events_on("20/02/2030".to_string()).ok);

        let due = json_payload(homework());
        assert!(due
            .as_array()
            .expect("homework array")
            .iter()
            .any(|item| item["title"] == title.as_str()));

        assert!(delete_event(event_id.clone()).ok);
        assert!(!delete_event(event_id).ok);
    }

    fn json_payload(response: super::JsonResponse) -> serde_json::Value {
        assert!(response.ok, "{}", response.message);
        serde_json::from_str(&response.payload.expect("payload")).expect("valid json")
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
