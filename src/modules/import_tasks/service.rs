use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use schoolyard_core::AppError;
use schoolyard_models::{AcademicYearId, ImportTask, ImportTaskId};

use crate::modules::academic_years::service::AcademicYearService;

pub(crate) const IMPORT_TASK_COLUMNS: &str = "id, academic_year_id, task_type, status, file_path, \
     total_records, processed_records, success_count, error_count, error_details, is_deleted, \
     deleted_at, created_at, updated_at, completed_at";

fn task_not_found() -> AppError {
    AppError::not_found(anyhow!("Import task not found"))
}

pub struct ImportTaskService;

impl ImportTaskService {
    pub(crate) async fn lock_task(
        conn: &mut PgConnection,
        id: ImportTaskId,
    ) -> Result<ImportTask, AppError> {
        sqlx::query_as::<_, ImportTask>(&format!(
            "SELECT {IMPORT_TASK_COLUMNS} FROM import_tasks \
             WHERE id = $1 AND is_deleted = FALSE FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(task_not_found)
    }

    /// Writes status, counters and completion time back.
    pub(crate) async fn save(
        conn: &mut PgConnection,
        task: &ImportTask,
    ) -> Result<ImportTask, AppError> {
        let saved = sqlx::query_as::<_, ImportTask>(&format!(
            r#"UPDATE import_tasks
               SET status = $2,
                   processed_records = $3,
                   success_count = $4,
                   error_count = $5,
                   error_details = $6,
                   completed_at = $7,
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {IMPORT_TASK_COLUMNS}"#
        ))
        .bind(task.id)
        .bind(task.status)
        .bind(task.processed_records)
        .bind(task.success_count)
        .bind(task.error_count)
        .bind(&task.error_details)
        .bind(task.completed_at)
        .fetch_one(conn)
        .await?;

        Ok(saved)
    }

    #[instrument(skip(db))]
    pub async fn get_import_task(db: &PgPool, id: ImportTaskId) -> Result<ImportTask, AppError> {
        sqlx::query_as::<_, ImportTask>(&format!(
            "SELECT {IMPORT_TASK_COLUMNS} FROM import_tasks WHERE id = $1 AND is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(task_not_found)
    }

    /// Newest first.
    #[instrument(skip(db))]
    pub async fn get_import_tasks_for_academic_year(
        db: &PgPool,
        academic_year_id: AcademicYearId,
    ) -> Result<Vec<ImportTask>, AppError> {
        let mut conn = db.acquire().await?;
        AcademicYearService::find_year(&mut conn, academic_year_id).await?;

        let tasks = sqlx::query_as::<_, ImportTask>(&format!(
            r#"SELECT {IMPORT_TASK_COLUMNS} FROM import_tasks
               WHERE academic_year_id = $1 AND is_deleted = FALSE
               ORDER BY created_at DESC"#
        ))
        .bind(academic_year_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(tasks)
    }
}
