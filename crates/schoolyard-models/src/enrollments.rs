//! Student placement: one live enrollment per student per academic year.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

use crate::academic_years::AcademicYearStatus;
use crate::ids::{AcademicYearId, EnrollmentId, GradeId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrollmentError {
    #[error("User must have STUDENT role to be enrolled")]
    NotAStudent,
    #[error("Cannot enroll students when academic year is {}", .0.label())]
    YearClosed(AcademicYearStatus),
    #[error("Student is already enrolled in {grade} for {academic_year}")]
    AlreadyEnrolled {
        grade: String,
        academic_year: String,
    },
    #[error("Student is not enrolled in this grade")]
    NotEnrolled,
    #[error("Cannot transfer student between different academic years")]
    CrossYearTransfer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentEnrollment {
    pub id: EnrollmentId,
    pub student_id: UserId,
    pub grade_id: GradeId,
    pub academic_year_id: AcademicYearId,
    pub joined_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EnrollStudentDto {
    pub student_id: UserId,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkEnrollDto {
    #[validate(length(min = 1, max = 500))]
    pub student_ids: Vec<UserId>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TransferStudentDto {
    pub student_id: UserId,
    pub from_grade_id: GradeId,
    pub to_grade_id: GradeId,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkEnrollFailure {
    pub student_id: UserId,
    pub error: String,
}

/// Per-student outcome of a bulk enrollment; failures never abort the batch.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkEnrollResponse {
    pub enrolled: Vec<StudentEnrollment>,
    pub failed: Vec<BulkEnrollFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EnrollmentError::AlreadyEnrolled {
            grade: "1A".into(),
            academic_year: "2025/2026".into(),
        };
        assert_eq!(
            err.to_string(),
            "Student is already enrolled in 1A for 2025/2026"
        );
        assert_eq!(
            EnrollmentError::YearClosed(AcademicYearStatus::Completed).to_string(),
            "Cannot enroll students when academic year is Completed"
        );
    }

    #[test]
    fn test_bulk_enroll_dto_bounds() {
        let dto = BulkEnrollDto {
            student_ids: vec![],
        };
        assert!(dto.validate().is_err());

        let dto = BulkEnrollDto {
            student_ids: vec![UserId::new()],
        };
        assert!(dto.validate().is_ok());
    }
}
