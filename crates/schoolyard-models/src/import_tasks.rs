//! Progress records for bulk data imports.
//!
//! The importer itself runs elsewhere; these rows only track what it
//! reports back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::academic_setup::SetupStep;
use crate::ids::{AcademicYearId, ImportTaskId};
use crate::text_enum::text_enum;

text_enum! {
    ImportTaskType {
        Grades => "GRADES",
        Students => "STUDENTS",
        Classrooms => "CLASSROOMS",
    }
}

impl ImportTaskType {
    /// The setup step a successful import of this type completes, if any.
    pub const fn completes_step(&self) -> Option<SetupStep> {
        match self {
            Self::Grades => Some(SetupStep::ImportGrades),
            Self::Students => Some(SetupStep::ImportStudents),
            Self::Classrooms => None,
        }
    }
}

text_enum! {
    ImportTaskStatus {
        Pending => "PENDING",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        Failed => "FAILED",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ImportTask {
    pub id: ImportTaskId,
    pub academic_year_id: AcademicYearId,
    pub task_type: ImportTaskType,
    pub status: ImportTaskStatus,
    pub file_path: Option<String>,
    pub total_records: i32,
    pub processed_records: i32,
    pub success_count: i32,
    pub error_count: i32,
    #[schema(value_type = Option<Object>)]
    pub error_details: Option<serde_json::Value>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ImportTask {
    pub fn progress_percentage(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        f64::from(self.processed_records) / f64::from(self.total_records) * 100.0
    }
}

/// An import task as returned by the API, with its computed progress.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportTaskResponse {
    #[serde(flatten)]
    pub task: ImportTask,
    pub progress_percentage: f64,
}

impl From<ImportTask> for ImportTaskResponse {
    fn from(task: ImportTask) -> Self {
        Self {
            progress_percentage: task.progress_percentage(),
            task,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateImportTaskDto {
    pub task_type: ImportTaskType,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub total_records: i32,
    #[validate(length(max = 255))]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ImportProgressDto {
    #[validate(range(min = 0))]
    pub processed: i32,
    #[validate(range(min = 0))]
    pub success: i32,
    #[validate(range(min = 0))]
    pub errors: i32,
    #[schema(value_type = Option<Object>)]
    pub error_details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ImportFailedDto {
    #[schema(value_type = Option<Object>)]
    pub error_details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(total: i32, processed: i32) -> ImportTask {
        let now = Utc::now();
        ImportTask {
            id: ImportTaskId::new(),
            academic_year_id: AcademicYearId::new(),
            task_type: ImportTaskType::Students,
            status: ImportTaskStatus::InProgress,
            file_path: None,
            total_records: total,
            processed_records: processed,
            success_count: processed,
            error_count: 0,
            error_details: None,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn test_progress_percentage() {
        assert_eq!(task(0, 0).progress_percentage(), 0.0);
        assert_eq!(task(200, 50).progress_percentage(), 25.0);
        assert_eq!(task(3, 3).progress_percentage(), 100.0);
    }

    #[test]
    fn test_response_flattens_task() {
        let value = serde_json::to_value(ImportTaskResponse::from(task(10, 5))).unwrap();
        assert_eq!(value["task_type"], "STUDENTS");
        assert_eq!(value["status"], "IN_PROGRESS");
        assert_eq!(value["progress_percentage"], json!(50.0));
    }

    #[test]
    fn test_task_type_completes_step() {
        assert_eq!(
            ImportTaskType::Grades.completes_step(),
            Some(SetupStep::ImportGrades)
        );
        assert_eq!(
            ImportTaskType::Students.completes_step(),
            Some(SetupStep::ImportStudents)
        );
        assert_eq!(ImportTaskType::Classrooms.completes_step(), None);
    }

    #[test]
    fn test_create_dto_validation() {
        let dto: CreateImportTaskDto = serde_json::from_value(json!({
            "task_type": "GRADES",
            "file_path": "x".repeat(256),
        }))
        .unwrap();
        assert_eq!(dto.total_records, 0);
        assert!(dto.validate().is_err());

        let dto: CreateImportTaskDto = serde_json::from_value(json!({
            "task_type": "GRADES",
            "total_records": -1,
        }))
        .unwrap();
        assert!(dto.validate().is_err());
    }
}
