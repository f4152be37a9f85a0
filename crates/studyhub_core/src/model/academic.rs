//! Semester and course domain model.
//!
//! # Responsibility
//! - Define letter grades, courses and the semesters that own them.
//!
//! # Invariants
//! - A course is never both Honors and AP; setting one clears the other and a
//!   record carrying both keeps AP.
//! - `credit_hours` stays finite and positive; invalid patch values are ignored
//!   and `validate` reports stored values outside that range.
//! - Unknown grade strings survive a load/store round-trip unchanged.

use crate::model::RecordId;
use crate::store::{CollectionKey, CollectionRecord, Record};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Letter grade with `+`/`-` modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Grade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    DMinus,
    F,
    /// Grade text not in the letter table; scores 0.0.
    Unrecognized(String),
}

impl Grade {
    /// Every recognized letter grade, best first.
    pub const LETTERS: [Grade; 13] = [
        Grade::APlus,
        Grade::A,
        Grade::AMinus,
        Grade::BPlus,
        Grade::B,
        Grade::BMinus,
        Grade::CPlus,
        Grade::C,
        Grade::CMinus,
        Grade::DPlus,
        Grade::D,
        Grade::DMinus,
        Grade::F,
    ];

    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "A+" => Self::APlus,
            "A" => Self::A,
            "A-" => Self::AMinus,
            "B+" => Self::BPlus,
            "B" => Self::B,
            "B-" => Self::BMinus,
            "C+" => Self::CPlus,
            "C" => Self::C,
            "C-" => Self::CMinus,
            "D+" => Self::DPlus,
            "D" => Self::D,
            "D-" => Self::DMinus,
            "F" => Self::F,
            _ => Self::Unrecognized(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::BMinus => "B-",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::CMinus => "C-",
            Self::DPlus => "D+",
            Self::D => "D",
            Self::DMinus => "D-",
            Self::F => "F",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }
}

impl Default for Grade {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Grade {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Grade> for String {
    fn from(value: Grade) -> Self {
        match value {
            Grade::Unrecognized(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub grade: Grade,
    pub credit_hours: f64,
    #[serde(default)]
    pub is_honors: bool,
    #[serde(rename = "isAP", default)]
    pub is_ap: bool,
    /// Owning semester id, stored as `semester` in backups.
    #[serde(rename = "semester", alias = "semesterId")]
    pub semester_id: RecordId,
}

impl Course {
    /// Creates a course with the defaults of a freshly added row: no name,
    /// grade `A`, one credit hour, no Honors/AP flag.
    pub fn new(id: RecordId, semester_id: RecordId) -> Self {
        Self {
            id,
            name: String::new(),
            grade: Grade::A,
            credit_hours: 1.0,
            is_honors: false,
            is_ap: false,
            semester_id,
        }
    }
}

/// Shallow-merge changes for one course. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoursePatch {
    pub name: Option<String>,
    pub grade: Option<Grade>,
    pub credit_hours: Option<f64>,
    pub is_honors: Option<bool>,
    pub is_ap: Option<bool>,
}

impl Record for Course {
    type Patch = CoursePatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: CoursePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(grade) = patch.grade {
            self.grade = grade;
        }
        if let Some(hours) = patch.credit_hours {
            if is_valid_credit_hours(hours) {
                self.credit_hours = hours;
            }
        }
        if let Some(is_honors) = patch.is_honors {
            self.is_honors = is_honors;
            if is_honors {
                self.is_ap = false;
            }
        }
        if let Some(is_ap) = patch.is_ap {
            self.is_ap = is_ap;
            if is_ap {
                self.is_honors = false;
            }
        }
    }

    fn normalize(&mut self) {
        if self.is_ap && self.is_honors {
            self.is_honors = false;
        }
    }

    fn validate(&self) -> Result<(), String> {
        if is_valid_credit_hours(self.credit_hours) {
            Ok(())
        } else {
            Err(format!(
                "course `{}` has invalid creditHours {}",
                self.id, self.credit_hours
            ))
        }
    }
}

/// Returns whether `hours` is usable as a credit-hour weight.
pub fn is_valid_credit_hours(hours: f64) -> bool {
    hours.is_finite() && hours > 0.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub id: RecordId,
    pub name: String,
    pub year: String,
    #[serde(default)]
    pub courses: Vec<Course>,
}

impl Semester {
    pub fn new(id: RecordId, name: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            year: year.into(),
            courses: Vec::new(),
        }
    }
}

/// Shallow-merge changes for semester metadata. Courses change through the
/// course operations only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemesterPatch {
    pub name: Option<String>,
    pub year: Option<String>,
}

impl Record for Semester {
    type Patch = SemesterPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn apply_patch(&mut self, patch: SemesterPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
    }

    fn normalize(&mut self) {
        let owner = self.id.clone();
        for course in &mut self.courses {
            course.normalize();
            course.semester_id.clone_from(&owner);
        }
    }

    fn validate(&self) -> Result<(), String> {
        self.courses.iter().try_for_each(Record::validate)
    }
}

impl CollectionRecord for Semester {
    const KEY: CollectionKey = CollectionKey::Semesters;
}

#[cfg(test)]
mod tests {
    use super::{Course, CoursePatch, Grade, Semester};
    use crate::store::Record;

    #[test]
    fn grade_parse_round_trips_known_and_unknown_text() {
        assert_eq!(Grade::parse("B+"), Grade::BPlus);
        assert_eq!(Grade::parse("P"), Grade::Unrecognized("P".to_string()));
        assert_eq!(String::from(Grade::Unrecognized("P".to_string())), "P");
        assert_eq!(Grade::AMinus.to_string(), "A-");
    }

    #[test]
    fn setting_honors_clears_ap_and_vice_versa() {
        let mut course = Course::new("c1".to_string(), "s1".to_string());
        course.apply_patch(CoursePatch {
            is_ap: Some(true),
            ..CoursePatch::default()
        });
        assert!(course.is_ap);

        course.apply_patch(CoursePatch {
            is_honors: Some(true),
            ..CoursePatch::default()
        });
        assert!(course.is_honors);
        assert!(!course.is_ap);

        course.apply_patch(CoursePatch {
            is_ap: Some(true),
            ..CoursePatch::default()
        });
        assert!(course.is_ap);
        assert!(!course.is_honors);
    }

    #[test]
    fn invalid_credit_hours_are_ignored() {
        let mut course = Course::new("c1".to_string(), "s1".to_string());
        for bad in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            course.apply_patch(CoursePatch {
                credit_hours: Some(bad),
                ..CoursePatch::default()
            });
        }
        assert_eq!(course.credit_hours, 1.0);
    }

    #[test]
    fn course_uses_backup_field_names() {
        let mut course = Course::new("c1".to_string(), "s1".to_string());
        course.is_ap = true;
        let value = serde_json::to_value(&course).unwrap();
        assert_eq!(value["isAP"], true);
        assert_eq!(value["semester"], "s1");
        assert_eq!(value["creditHours"], 1.0);
        assert_eq!(value["grade"], "A");
    }

    #[test]
    fn semester_normalize_reassigns_course_owner() {
        let mut semester = Semester::new("s2".to_string(), "Spring", "2025");
        let mut course = Course::new("c1".to_string(), "stale".to_string());
        course.is_ap = true;
        course.is_honors = true;
        semester.courses.push(course);

        semester.normalize();
        assert_eq!(semester.courses[0].semester_id, "s2");
        assert!(semester.courses[0].is_ap);
        assert!(!semester.courses[0].is_honors);
    }

    #[test]
    fn semester_validate_reports_the_offending_course() {
        let mut semester = Semester::new("s1".to_string(), "Fall", "2024");
        semester.courses.push(Course::new("good".to_string(), "s1".to_string()));
        assert!(semester.validate().is_ok());

        let mut bad = Course::new("bad".to_string(), "s1".to_string());
        bad.credit_hours = -3.0;
        semester.courses.push(bad);
        let reason = semester.validate().unwrap_err();
        assert!(reason.contains("`bad`"));
        assert!(reason.contains("creditHours"));
    }
}
