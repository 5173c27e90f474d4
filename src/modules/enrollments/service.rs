use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use schoolyard_core::AppError;
use schoolyard_models::{
    AcademicYearId, EnrollmentError, GradeId, RoleEnum, StudentEnrollment, UserId,
};

pub(crate) const ENROLLMENT_COLUMNS: &str =
    "id, student_id, grade_id, academic_year_id, joined_at, is_deleted, deleted_at";

pub struct EnrollmentService;

impl EnrollmentService {
    /// The student's live enrollment for a year, if any.
    pub(crate) async fn find_live(
        conn: &mut PgConnection,
        student_id: UserId,
        academic_year_id: AcademicYearId,
    ) -> Result<Option<StudentEnrollment>, AppError> {
        let enrollment = sqlx::query_as::<_, StudentEnrollment>(&format!(
            r#"SELECT {ENROLLMENT_COLUMNS} FROM student_enrollments
               WHERE student_id = $1 AND academic_year_id = $2 AND is_deleted = FALSE"#
        ))
        .bind(student_id)
        .bind(academic_year_id)
        .fetch_optional(conn)
        .await?;

        Ok(enrollment)
    }

    pub(crate) async fn insert(
        conn: &mut PgConnection,
        student_id: UserId,
        grade_id: GradeId,
        academic_year_id: AcademicYearId,
    ) -> Result<StudentEnrollment, AppError> {
        sqlx::query_as::<_, StudentEnrollment>(&format!(
            r#"INSERT INTO student_enrollments (student_id, grade_id, academic_year_id)
               VALUES ($1, $2, $3)
               RETURNING {ENROLLMENT_COLUMNS}"#
        ))
        .bind(student_id)
        .bind(grade_id)
        .bind(academic_year_id)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow!(
                    "Student is already enrolled for this academic year"
                ));
            }
            AppError::from(e)
        })
    }

    /// Soft-deletes the live enrollment of `student_id` in `grade_id`.
    pub(crate) async fn soft_delete(
        conn: &mut PgConnection,
        student_id: UserId,
        grade_id: GradeId,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE student_enrollments SET is_deleted = TRUE, deleted_at = NOW()
               WHERE student_id = $1 AND grade_id = $2 AND is_deleted = FALSE"#,
        )
        .bind(student_id)
        .bind(grade_id)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::bad_request(EnrollmentError::NotEnrolled));
        }
        Ok(())
    }

    /// `Ok(None)` when the user does not exist.
    pub(crate) async fn holds_student_role(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<Option<bool>, AppError> {
        let holds = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM user_roles WHERE user_id = u.id AND role = $2
               )
               FROM users u WHERE u.id = $1"#,
        )
        .bind(user_id)
        .bind(RoleEnum::Student.as_str())
        .fetch_optional(conn)
        .await?;

        Ok(holds)
    }

    #[instrument(skip(db))]
    pub async fn get_student_enrollment(
        db: &PgPool,
        student_id: UserId,
        academic_year_id: AcademicYearId,
    ) -> Result<Option<StudentEnrollment>, AppError> {
        let mut conn = db.acquire().await?;
        Self::find_live(&mut conn, student_id, academic_year_id).await
    }
}
