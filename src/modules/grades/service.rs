use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use schoolyard_core::AppError;
use schoolyard_models::{AcademicYearId, Grade, GradeFilterParams, GradeId, SchoolUser, User};

use crate::modules::academic_years::service::AcademicYearService;
use crate::modules::users::service::{USER_COLUMNS, UserService};

pub(crate) const GRADE_COLUMNS: &str = "id, academic_year_id, name, description, grade, \
     grade_type, grade_subtype, is_active, is_deleted, deleted_at, created_at, updated_at";

fn grade_not_found() -> AppError {
    AppError::not_found(anyhow!("Grade not found"))
}

pub struct GradeService;

impl GradeService {
    pub(crate) async fn find_grade(
        conn: &mut PgConnection,
        id: GradeId,
    ) -> Result<Grade, AppError> {
        sqlx::query_as::<_, Grade>(&format!(
            "SELECT {GRADE_COLUMNS} FROM grades WHERE id = $1 AND is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(grade_not_found)
    }

    #[instrument(skip(db))]
    pub async fn get_grade(db: &PgPool, id: GradeId) -> Result<Grade, AppError> {
        let mut conn = db.acquire().await?;
        Self::find_grade(&mut conn, id).await
    }

    /// Grades of a year ordered by level then name.
    #[instrument(skip(db))]
    pub async fn get_grades_for_academic_year(
        db: &PgPool,
        academic_year_id: AcademicYearId,
        filters: GradeFilterParams,
    ) -> Result<Vec<Grade>, AppError> {
        let mut conn = db.acquire().await?;
        AcademicYearService::find_year(&mut conn, academic_year_id).await?;

        let grades = sqlx::query_as::<_, Grade>(&format!(
            r#"SELECT {GRADE_COLUMNS} FROM grades
               WHERE academic_year_id = $1 AND ($2 OR is_deleted = FALSE)
               ORDER BY grade, name"#
        ))
        .bind(academic_year_id)
        .bind(filters.include_deleted)
        .fetch_all(&mut *conn)
        .await?;

        Ok(grades)
    }

    /// Students with a live enrollment in the grade.
    #[instrument(skip(db))]
    pub async fn get_students_in_grade(
        db: &PgPool,
        grade_id: GradeId,
    ) -> Result<Vec<SchoolUser>, AppError> {
        let mut conn = db.acquire().await?;
        Self::find_grade(&mut conn, grade_id).await?;

        let students = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users u
               JOIN student_enrollments se ON se.student_id = u.id
               WHERE se.grade_id = $1 AND se.is_deleted = FALSE
               ORDER BY u.last_name, u.first_name"#
        ))
        .bind(grade_id)
        .fetch_all(&mut *conn)
        .await?;

        UserService::attach_roles(&mut conn, students).await
    }

    /// Soft-deletes the grade together with its live enrollments.
    #[instrument(skip(db))]
    pub async fn delete_grade(db: &PgPool, id: GradeId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let result = sqlx::query(
            r#"UPDATE grades SET is_deleted = TRUE, deleted_at = NOW(), updated_at = NOW()
               WHERE id = $1 AND is_deleted = FALSE"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(grade_not_found());
        }

        let enrollments = sqlx::query(
            r#"UPDATE student_enrollments SET is_deleted = TRUE, deleted_at = NOW()
               WHERE grade_id = $1 AND is_deleted = FALSE"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            grade_id = %id,
            enrollments = enrollments.rows_affected(),
            "Grade deleted"
        );
        Ok(())
    }

    /// Restores the grade only; enrollments removed with it stay deleted.
    #[instrument(skip(db))]
    pub async fn restore_grade(db: &PgPool, id: GradeId) -> Result<Grade, AppError> {
        sqlx::query_as::<_, Grade>(&format!(
            r#"UPDATE grades SET is_deleted = FALSE, deleted_at = NULL, updated_at = NOW()
               WHERE id = $1 AND is_deleted = TRUE
               RETURNING {GRADE_COLUMNS}"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow!(
                    "A live grade with the same name and classification already exists"
                ));
            }
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::not_found(anyhow!("Deleted grade not found")))
    }
}
