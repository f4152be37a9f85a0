//! Semester/course use-case service and GPA summaries.
//!
//! # Responsibility
//! - Manage semesters and the courses each semester owns.
//! - Project stored semesters into per-semester and cumulative GPA results.
//!
//! # Invariants
//! - Courses are only reachable through their owning semester; deleting a
//!   semester deletes its courses.
//! - Course writes go through `Record::normalize`, keeping Honors and AP
//!   mutually exclusive.

use crate::gpa::{cumulative_gpa, gpa, semester_trend, total_credits, TrendPoint};
use crate::model::academic::{Course, CoursePatch, Semester, SemesterPatch};
use crate::model::RecordId;
use crate::storage::KvStorage;
use crate::store::{
    add_record, remove_record, update_record, Collection, Record, Store, StoreResult,
};
use chrono::{Datelike, Local, Utc};
use log::info;
use serde::Serialize;

/// GPA figures for one semester.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterGpa {
    pub semester_id: RecordId,
    pub name: String,
    pub year: String,
    pub gpa: f64,
    pub course_count: usize,
    pub credit_hours: f64,
}

/// Cumulative and per-semester GPA figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpaSummary {
    pub weighted: bool,
    pub cumulative_gpa: f64,
    pub credit_hours: f64,
    pub course_count: usize,
    pub semesters: Vec<SemesterGpa>,
}

/// Academic service over the `semesters` collection.
pub struct AcademicService<'s, S: KvStorage> {
    store: &'s Store<S>,
    semesters: Collection<'s, S, Semester>,
}

impl<'s, S: KvStorage> AcademicService<'s, S> {
    pub fn new(store: &'s Store<S>) -> StoreResult<Self> {
        Ok(Self {
            store,
            semesters: store.collection()?,
        })
    }

    pub fn semesters(&self) -> &[Semester] {
        self.semesters.items()
    }

    pub fn get_semester(&self, id: &str) -> Option<&Semester> {
        self.semesters.get(id)
    }

    /// Adds an empty semester named `Semester N` for the current year.
    pub fn add_semester(&mut self) -> StoreResult<RecordId> {
        let name = format!("Semester {}", self.semesters.len() + 1);
        let year = Local::now().year().to_string();
        self.add_named_semester(&name, &year)
    }

    /// Adds an empty semester with explicit name and year.
    pub fn add_named_semester(&mut self, name: &str, year: &str) -> StoreResult<RecordId> {
        let id = self
            .semesters
            .insert_new(|id| Semester::new(id, name, year))?;
        info!(
            "event=semester_create module=service status=ok semesters={}",
            self.semesters.len()
        );
        Ok(id)
    }

    /// Renames or re-years a semester. Returns `false` for unknown ids.
    pub fn update_semester(&mut self, id: &str, patch: SemesterPatch) -> StoreResult<bool> {
        self.semesters.update_by_id(id, patch)
    }

    /// Deletes a semester together with its courses.
    pub fn delete_semester(&mut self, id: &str) -> StoreResult<bool> {
        self.semesters.remove_by_id(id)
    }

    /// Adds a default course (`A`, one credit hour) to a semester.
    ///
    /// Returns `None` when the semester does not exist.
    pub fn add_course(&mut self, semester_id: &str) -> StoreResult<Option<RecordId>> {
        self.add_course_with(semester_id, CoursePatch::default())
    }

    /// Adds a course to a semester, starting from the defaults and applying
    /// `initial` on top.
    pub fn add_course_with(
        &mut self,
        semester_id: &str,
        initial: CoursePatch,
    ) -> StoreResult<Option<RecordId>> {
        if !self.semesters.contains(semester_id) {
            return Ok(None);
        }

        let course_id = self.issue_course_id();
        let mut course = Course::new(course_id.clone(), semester_id.to_string());
        course.apply_patch(initial);

        self.semesters.mutate(|mut semesters| {
            if let Some(semester) = semesters.iter_mut().find(|s| s.id == semester_id) {
                add_record(&mut semester.courses, course);
            }
            semesters
        })?;
        Ok(Some(course_id))
    }

    /// Shallow-merges `patch` into one course of one semester.
    ///
    /// Returns `false` when either id is unknown.
    pub fn update_course(
        &mut self,
        semester_id: &str,
        course_id: &str,
        patch: CoursePatch,
    ) -> StoreResult<bool> {
        if self.find_course(semester_id, course_id).is_none() {
            return Ok(false);
        }
        let now = Utc::now();
        self.semesters.mutate(|mut semesters| {
            if let Some(semester) = semesters.iter_mut().find(|s| s.id == semester_id) {
                update_record(&mut semester.courses, course_id, patch, now);
            }
            semesters
        })?;
        Ok(true)
    }

    pub fn delete_course(&mut self, semester_id: &str, course_id: &str) -> StoreResult<bool> {
        if self.find_course(semester_id, course_id).is_none() {
            return Ok(false);
        }
        self.semesters.mutate(|mut semesters| {
            if let Some(semester) = semesters.iter_mut().find(|s| s.id == semester_id) {
                remove_record(&mut semester.courses, course_id);
            }
            semesters
        })?;
        Ok(true)
    }

    pub fn find_course(&self, semester_id: &str, course_id: &str) -> Option<&Course> {
        self.semesters
            .get(semester_id)?
            .courses
            .iter()
            .find(|course| course.id == course_id)
    }

    /// GPA of one semester; `None` for unknown ids.
    pub fn semester_gpa(&self, semester_id: &str, weighted: bool) -> Option<f64> {
        self.semesters
            .get(semester_id)
            .map(|semester| gpa(&semester.courses, weighted))
    }

    /// GPA over every course of every semester.
    pub fn cumulative_gpa(&self, weighted: bool) -> f64 {
        cumulative_gpa(self.semesters.items(), weighted)
    }

    pub fn trend(&self, weighted: bool) -> Vec<TrendPoint> {
        semester_trend(self.semesters.items(), weighted)
    }

    pub fn summary(&self, weighted: bool) -> GpaSummary {
        let semesters = self.semesters.items();
        let all_courses = || semesters.iter().flat_map(|semester| semester.courses.iter());
        GpaSummary {
            weighted,
            cumulative_gpa: cumulative_gpa(semesters, weighted),
            credit_hours: total_credits(all_courses()),
            course_count: all_courses().count(),
            semesters: semesters
                .iter()
                .map(|semester| SemesterGpa {
                    semester_id: semester.id.clone(),
                    name: semester.name.clone(),
                    year: semester.year.clone(),
                    gpa: gpa(&semester.courses, weighted),
                    course_count: semester.courses.len(),
                    credit_hours: total_credits(&semester.courses),
                })
                .collect(),
        }
    }

    // Course ids are unique across all semesters so they stay unambiguous in
    // exported bundles.
    fn issue_course_id(&self) -> RecordId {
        let semesters = self.semesters.items();
        self.store.issue_id(|candidate| {
            semesters
                .iter()
                .flat_map(|semester| semester.courses.iter())
                .any(|course| course.id == candidate)
        })
    }
}
