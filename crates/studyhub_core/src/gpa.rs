//! Grade-point average engine.
//!
//! # Responsibility
//! - Map letter grades to grade points.
//! - Compute credit-weighted GPA for any course list, with or without the
//!   Honors/AP bonus.
//!
//! # Invariants
//! - Every function is total and pure: no panics, no hidden state.
//! - Cumulative GPA is computed over the concatenated course list, never as an
//!   average of semester averages.
//! - The weighted bonus is added on top of the letter value without a ceiling,
//!   so an AP `A+` scores 5.0.

use crate::model::academic::{Course, Grade, Semester};
use serde::Serialize;

/// Bonus added to an AP course when weighting is on.
pub const AP_BONUS: f64 = 1.0;
/// Bonus added to an Honors course when weighting is on.
pub const HONORS_BONUS: f64 = 0.5;

/// Grade points for `grade`; unrecognized grades score 0.0.
pub fn grade_value(grade: &Grade) -> f64 {
    match grade {
        Grade::APlus | Grade::A => 4.0,
        Grade::AMinus => 3.7,
        Grade::BPlus => 3.3,
        Grade::B => 3.0,
        Grade::BMinus => 2.7,
        Grade::CPlus => 2.3,
        Grade::C => 2.0,
        Grade::CMinus => 1.7,
        Grade::DPlus => 1.3,
        Grade::D => 1.0,
        Grade::DMinus => 0.7,
        Grade::F | Grade::Unrecognized(_) => 0.0,
    }
}

/// Grade points for one course, including the Honors/AP bonus when
/// `weighted` is set. AP takes precedence over Honors.
pub fn course_score(course: &Course, weighted: bool) -> f64 {
    let base = grade_value(&course.grade);
    let bonus = if !weighted {
        0.0
    } else if course.is_ap {
        AP_BONUS
    } else if course.is_honors {
        HONORS_BONUS
    } else {
        0.0
    };
    base + bonus
}

/// Credit-weighted GPA of `courses`; 0.0 for an empty list or zero credits.
pub fn gpa<'a>(courses: impl IntoIterator<Item = &'a Course>, weighted: bool) -> f64 {
    let (total_points, total_credits) =
        courses
            .into_iter()
            .fold((0.0_f64, 0.0_f64), |(points, credits), course| {
                (
                    points + course_score(course, weighted) * course.credit_hours,
                    credits + course.credit_hours,
                )
            });

    if total_credits > 0.0 {
        total_points / total_credits
    } else {
        0.0
    }
}

/// GPA over every course of every semester.
pub fn cumulative_gpa(semesters: &[Semester], weighted: bool) -> f64 {
    gpa(semesters.iter().flat_map(|semester| semester.courses.iter()), weighted)
}

/// Sum of credit hours over `courses`.
pub fn total_credits<'a>(courses: impl IntoIterator<Item = &'a Course>) -> f64 {
    courses.into_iter().map(|course| course.credit_hours).sum()
}

/// One point of the per-semester GPA trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub semester_id: String,
    pub name: String,
    /// Semester GPA rounded to two decimals.
    pub gpa: f64,
}

/// Per-semester GPA in semester order, rounded to two decimals for display.
pub fn semester_trend(semesters: &[Semester], weighted: bool) -> Vec<TrendPoint> {
    semesters
        .iter()
        .map(|semester| TrendPoint {
            semester_id: semester.id.clone(),
            name: semester.name.clone(),
            gpa: round2(gpa(&semester.courses, weighted)),
        })
        .collect()
}

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
