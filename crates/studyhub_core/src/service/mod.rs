//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate collection reads and writes into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.
//!
//! # Invariants
//! - Invalid input is ignored: operations return `Ok(None)` / `Ok(false)` and
//!   write nothing.

pub mod academic_service;
pub mod backup_service;
pub mod calendar_service;
pub mod finance_service;
pub mod note_service;
pub mod study_service;

pub use academic_service::{AcademicService, GpaSummary, SemesterGpa};
pub use backup_service::{BackupError, BackupResult, BackupService, ImportReport};
pub use calendar_service::{days_until, CalendarService, NewEvent};
pub use finance_service::{
    BudgetStatus, CategoryTotal, FinanceService, MonthTotal, NewExpense,
};
pub use note_service::NoteService;
pub use study_service::{QuizScore, StudyService};
