//! Setup checklist for an academic year.
//!
//! Five steps, always in the same order for both deployment types. Import
//! steps also record *how* the data arrived; a completed import step with
//! method `NONE` is rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{AcademicYearId, AcademicYearSetupId};
use crate::text_enum::text_enum;

text_enum! {
    SetupStep {
        BasicInfo => "BASIC_INFO",
        ImportGrades => "IMPORT_GRADES",
        ImportStudents => "IMPORT_STUDENTS",
        AssignClassrooms => "ASSIGN_CLASSROOMS",
        Review => "REVIEW",
        /// Terminal marker for `current_step`; not a step that can be marked.
        Completed => "COMPLETED",
    }
}

/// The checklist every year goes through, in order.
pub const REQUIRED_STEPS: [SetupStep; 5] = [
    SetupStep::BasicInfo,
    SetupStep::ImportGrades,
    SetupStep::ImportStudents,
    SetupStep::AssignClassrooms,
    SetupStep::Review,
];

impl SetupStep {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::BasicInfo => "Basic Information",
            Self::ImportGrades => "Import Grades",
            Self::ImportStudents => "Import Students",
            Self::AssignClassrooms => "Assign Classrooms",
            Self::Review => "Review and Confirm",
            Self::Completed => "Setup Completed",
        }
    }
}

text_enum! {
    ImportMethod {
        None => "NONE",
        Manual => "MANUAL",
        Csv => "CSV",
        Api => "API",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("Invalid setup step: {0}")]
    InvalidStep(String),
    #[error("Import method must be specified when grades import is marked as completed.")]
    GradesImportMethodMissing,
    #[error("Import method must be specified when students import is marked as completed.")]
    StudentsImportMethodMissing,
    #[error("Import method must be specified when classroom assignment is marked as completed.")]
    ClassroomsImportMethodMissing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AcademicYearSetup {
    pub id: AcademicYearSetupId,
    pub academic_year_id: AcademicYearId,
    pub current_step: SetupStep,
    pub basic_info_completed: bool,
    pub import_grades_completed: bool,
    pub import_students_completed: bool,
    pub assign_classrooms_completed: bool,
    pub review_completed: bool,
    pub grades_import_method: ImportMethod,
    pub students_import_method: ImportMethod,
    pub classrooms_import_method: ImportMethod,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AcademicYearSetup {
    pub fn new(academic_year_id: AcademicYearId) -> Self {
        let now = Utc::now();
        Self {
            id: AcademicYearSetupId::new(),
            academic_year_id,
            current_step: SetupStep::BasicInfo,
            basic_info_completed: false,
            import_grades_completed: false,
            import_students_completed: false,
            assign_classrooms_completed: false,
            review_completed: false,
            grades_import_method: ImportMethod::None,
            students_import_method: ImportMethod::None,
            classrooms_import_method: ImportMethod::None,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_step_completed(&self, step: SetupStep) -> bool {
        match step {
            SetupStep::BasicInfo => self.basic_info_completed,
            SetupStep::ImportGrades => self.import_grades_completed,
            SetupStep::ImportStudents => self.import_students_completed,
            SetupStep::AssignClassrooms => self.assign_classrooms_completed,
            SetupStep::Review => self.review_completed,
            SetupStep::Completed => self.is_complete(),
        }
    }

    pub fn is_complete(&self) -> bool {
        REQUIRED_STEPS.iter().all(|step| self.is_step_completed(*step))
    }

    pub fn is_ready(&self) -> bool {
        self.is_complete()
    }

    /// Share of `steps` already completed, as a percentage.
    pub fn completion_percentage(&self, steps: &[SetupStep]) -> f64 {
        if steps.is_empty() {
            return 0.0;
        }
        let done = steps.iter().filter(|s| self.is_step_completed(**s)).count();
        done as f64 / steps.len() as f64 * 100.0
    }

    /// First unfinished step, or `COMPLETED` once every step is done.
    pub fn next_step(&self) -> SetupStep {
        REQUIRED_STEPS
            .iter()
            .copied()
            .find(|step| !self.is_step_completed(*step))
            .unwrap_or(SetupStep::Completed)
    }

    /// Mark `step` done, recording `method` for import steps.
    ///
    /// An import step left with method `NONE` is rejected and the setup is
    /// left untouched.
    pub fn mark_step_complete(
        &mut self,
        step: SetupStep,
        method: Option<ImportMethod>,
    ) -> Result<(), SetupError> {
        let mut next = self.clone();

        match step {
            SetupStep::BasicInfo => next.basic_info_completed = true,
            SetupStep::ImportGrades => {
                if let Some(method) = method {
                    next.grades_import_method = method;
                }
                next.import_grades_completed = true;
            }
            SetupStep::ImportStudents => {
                if let Some(method) = method {
                    next.students_import_method = method;
                }
                next.import_students_completed = true;
            }
            SetupStep::AssignClassrooms => {
                if let Some(method) = method {
                    next.classrooms_import_method = method;
                }
                next.assign_classrooms_completed = true;
            }
            SetupStep::Review => next.review_completed = true,
            SetupStep::Completed => return Err(SetupError::InvalidStep(step.to_string())),
        }

        next.validate()?;
        next.current_step = next.next_step();
        *self = next;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.import_grades_completed && self.grades_import_method == ImportMethod::None {
            return Err(SetupError::GradesImportMethodMissing);
        }
        if self.import_students_completed && self.students_import_method == ImportMethod::None {
            return Err(SetupError::StudentsImportMethodMissing);
        }
        if self.assign_classrooms_completed && self.classrooms_import_method == ImportMethod::None
        {
            return Err(SetupError::ClassroomsImportMethodMissing);
        }
        Ok(())
    }
}

/// Parses a step name from a path or body, reporting unknown names the same
/// way as a non-markable step.
pub fn parse_step(raw: &str) -> Result<SetupStep, SetupError> {
    raw.parse::<SetupStep>()
        .map_err(|_| SetupError::InvalidStep(raw.to_string()))
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MarkStepCompleteDto {
    pub import_method: Option<ImportMethod>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SetupProgressResponse {
    pub setup: AcademicYearSetup,
    pub required_steps: Vec<SetupStep>,
    pub completion_percentage: f64,
    pub is_complete: bool,
}
