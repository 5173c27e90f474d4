use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::academic_years::AcademicYearStatus;
use crate::ids::{AcademicYearId, GradeId};

pub const GRADE_LEVEL_MAX_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradeError {
    #[error("Grade level is mandatory.")]
    MissingLevel,
    #[error("Cannot be empty or just blank spaces")]
    BlankLevel,
    #[error("Grade level too long ({0}) max 32 characters allowed.")]
    LevelTooLong(usize),
    #[error(
        "Cannot create grades for academic year in {} status. Grades can only be created during SETUP or ENROLLMENT phases.",
        .0.label()
    )]
    YearClosedForGrades(AcademicYearStatus),
}

/// A class or section within one academic year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Grade {
    pub id: GradeId,
    pub academic_year_id: AcademicYearId,
    pub name: String,
    pub description: String,
    /// Grade level, e.g. `"1"`, `"KG"`
    pub grade: String,
    pub grade_type: String,
    pub grade_subtype: String,
    pub is_active: bool,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalizes a grade level, returning the trimmed value.
pub fn validate_grade_level(raw: &str) -> Result<String, GradeError> {
    if raw.is_empty() {
        return Err(GradeError::MissingLevel);
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GradeError::BlankLevel);
    }

    let len = trimmed.chars().count();
    if len > GRADE_LEVEL_MAX_LEN {
        return Err(GradeError::LevelTooLong(len));
    }

    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateGradeDto {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Checked by [`validate_grade_level`] so blank and oversized levels get
    /// their dedicated messages.
    pub grade: String,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub grade_type: String,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub grade_subtype: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkCreateGradesDto {
    #[validate(length(min = 1), nested)]
    pub grades: Vec<CreateGradeDto>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GradeFilterParams {
    /// Include soft-deleted grades
    #[serde(default)]
    pub include_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_level_is_trimmed() {
        assert_eq!(validate_grade_level("  KG ").unwrap(), "KG");
    }

    #[test]
    fn test_grade_level_errors() {
        assert_eq!(validate_grade_level(""), Err(GradeError::MissingLevel));
        assert_eq!(validate_grade_level("   "), Err(GradeError::BlankLevel));

        let err = validate_grade_level(&"9".repeat(33)).unwrap_err();
        assert_eq!(err, GradeError::LevelTooLong(33));
        assert_eq!(
            err.to_string(),
            "Grade level too long (33) max 32 characters allowed."
        );
        assert!(validate_grade_level(&"9".repeat(32)).is_ok());
    }

    #[test]
    fn test_closed_year_message() {
        let err = GradeError::YearClosedForGrades(AcademicYearStatus::Active);
        assert!(
            err.to_string()
                .starts_with("Cannot create grades for academic year in Active status.")
        );
    }

    #[test]
    fn test_create_dto_defaults_and_limits() {
        let dto: CreateGradeDto = serde_json::from_str(r#"{"name":"1A","grade":"1"}"#).unwrap();
        assert_eq!(dto.grade_type, "");
        assert!(dto.validate().is_ok());

        let dto: CreateGradeDto = serde_json::from_str(&format!(
            r#"{{"name":"{}","grade":"1"}}"#,
            "n".repeat(65)
        ))
        .unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_bulk_dto_requires_rows() {
        let dto = BulkCreateGradesDto { grades: vec![] };
        assert!(dto.validate().is_err());
    }
}
