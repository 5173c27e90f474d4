//! Row access for academic years and their setup checklist.
//!
//! Reads exclude soft-deleted rows unless stated otherwise. The `lock_*`
//! helpers take a row lock and are meant for use inside a transaction.

use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use schoolyard_core::{AppError, PaginationMeta, PaginationParams};
use schoolyard_models::{
    AcademicYear, AcademicYearDetail, AcademicYearFilterParams, AcademicYearId, AcademicYearSetup,
    PaginatedAcademicYearsResponse, REQUIRED_STEPS,
};

pub(crate) const YEAR_COLUMNS: &str = "id, name, start_date, end_date, is_active, status, \
     deployment_type, setup_completed, enrollment_start_date, enrollment_end_date, is_deleted, \
     deleted_at, created_at, updated_at";

pub(crate) const SETUP_COLUMNS: &str = "id, academic_year_id, current_step, basic_info_completed, \
     import_grades_completed, import_students_completed, assign_classrooms_completed, \
     review_completed, grades_import_method, students_import_method, classrooms_import_method, \
     is_deleted, deleted_at, created_at, updated_at";

fn year_not_found() -> AppError {
    AppError::not_found(anyhow!("Academic year not found"))
}

pub struct AcademicYearService;

impl AcademicYearService {
    pub(crate) async fn find_year(
        conn: &mut PgConnection,
        id: AcademicYearId,
    ) -> Result<AcademicYear, AppError> {
        sqlx::query_as::<_, AcademicYear>(&format!(
            "SELECT {YEAR_COLUMNS} FROM academic_years WHERE id = $1 AND is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(year_not_found)
    }

    pub(crate) async fn lock_year(
        conn: &mut PgConnection,
        id: AcademicYearId,
    ) -> Result<AcademicYear, AppError> {
        sqlx::query_as::<_, AcademicYear>(&format!(
            "SELECT {YEAR_COLUMNS} FROM academic_years \
             WHERE id = $1 AND is_deleted = FALSE FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(year_not_found)
    }

    pub(crate) async fn insert_year(
        conn: &mut PgConnection,
        year: &AcademicYear,
    ) -> Result<AcademicYear, AppError> {
        sqlx::query_as::<_, AcademicYear>(&format!(
            r#"INSERT INTO academic_years
                   (id, name, start_date, end_date, is_active, status, deployment_type,
                    setup_completed, enrollment_start_date, enrollment_end_date)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING {YEAR_COLUMNS}"#
        ))
        .bind(year.id)
        .bind(year.name.trim())
        .bind(year.start_date)
        .bind(year.end_date)
        .bind(year.is_active)
        .bind(year.status)
        .bind(year.deployment_type)
        .bind(year.setup_completed)
        .bind(year.enrollment_start_date)
        .bind(year.enrollment_end_date)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow!(
                    "An academic year with this name already exists"
                ));
            }
            AppError::from(e)
        })
    }

    /// Persists the lifecycle fields of `year`.
    pub(crate) async fn save_status(
        conn: &mut PgConnection,
        year: &AcademicYear,
    ) -> Result<AcademicYear, AppError> {
        let saved = sqlx::query_as::<_, AcademicYear>(&format!(
            r#"UPDATE academic_years
               SET status = $2, setup_completed = $3, is_active = $4, updated_at = NOW()
               WHERE id = $1
               RETURNING {YEAR_COLUMNS}"#
        ))
        .bind(year.id)
        .bind(year.status)
        .bind(year.setup_completed)
        .bind(year.is_active)
        .fetch_one(conn)
        .await?;

        Ok(saved)
    }

    pub(crate) async fn find_setup(
        conn: &mut PgConnection,
        year_id: AcademicYearId,
    ) -> Result<Option<AcademicYearSetup>, AppError> {
        let setup = sqlx::query_as::<_, AcademicYearSetup>(&format!(
            "SELECT {SETUP_COLUMNS} FROM academic_year_setups \
             WHERE academic_year_id = $1 AND is_deleted = FALSE"
        ))
        .bind(year_id)
        .fetch_optional(conn)
        .await?;

        Ok(setup)
    }

    pub(crate) async fn lock_setup(
        conn: &mut PgConnection,
        year_id: AcademicYearId,
    ) -> Result<Option<AcademicYearSetup>, AppError> {
        let setup = sqlx::query_as::<_, AcademicYearSetup>(&format!(
            "SELECT {SETUP_COLUMNS} FROM academic_year_setups \
             WHERE academic_year_id = $1 AND is_deleted = FALSE FOR UPDATE"
        ))
        .bind(year_id)
        .fetch_optional(conn)
        .await?;

        Ok(setup)
    }

    pub(crate) async fn insert_setup(
        conn: &mut PgConnection,
        setup: &AcademicYearSetup,
    ) -> Result<AcademicYearSetup, AppError> {
        let saved = sqlx::query_as::<_, AcademicYearSetup>(&format!(
            r#"INSERT INTO academic_year_setups (id, academic_year_id, current_step)
               VALUES ($1, $2, $3)
               RETURNING {SETUP_COLUMNS}"#
        ))
        .bind(setup.id)
        .bind(setup.academic_year_id)
        .bind(setup.current_step)
        .fetch_one(conn)
        .await?;

        Ok(saved)
    }

    pub(crate) async fn save_setup(
        conn: &mut PgConnection,
        setup: &AcademicYearSetup,
    ) -> Result<AcademicYearSetup, AppError> {
        let saved = sqlx::query_as::<_, AcademicYearSetup>(&format!(
            r#"UPDATE academic_year_setups
               SET current_step = $2,
                   basic_info_completed = $3,
                   import_grades_completed = $4,
                   import_students_completed = $5,
                   assign_classrooms_completed = $6,
                   review_completed = $7,
                   grades_import_method = $8,
                   students_import_method = $9,
                   classrooms_import_method = $10,
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {SETUP_COLUMNS}"#
        ))
        .bind(setup.id)
        .bind(setup.current_step)
        .bind(setup.basic_info_completed)
        .bind(setup.import_grades_completed)
        .bind(setup.import_students_completed)
        .bind(setup.assign_classrooms_completed)
        .bind(setup.review_completed)
        .bind(setup.grades_import_method)
        .bind(setup.students_import_method)
        .bind(setup.classrooms_import_method)
        .fetch_one(conn)
        .await?;

        Ok(saved)
    }

    #[instrument(skip(db))]
    pub async fn get_academic_year(
        db: &PgPool,
        id: AcademicYearId,
    ) -> Result<AcademicYear, AppError> {
        let mut conn = db.acquire().await?;
        Self::find_year(&mut conn, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_academic_year_detail(
        db: &PgPool,
        id: AcademicYearId,
    ) -> Result<AcademicYearDetail, AppError> {
        let mut conn = db.acquire().await?;
        let academic_year = Self::find_year(&mut conn, id).await?;
        let setup = Self::find_setup(&mut conn, id).await?;
        let completion_percentage = setup
            .as_ref()
            .map_or(0.0, |setup| setup.completion_percentage(&REQUIRED_STEPS));

        Ok(AcademicYearDetail {
            academic_year,
            setup,
            completion_percentage,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_academic_years(
        db: &PgPool,
        filters: AcademicYearFilterParams,
        pagination: PaginationParams,
    ) -> Result<PaginatedAcademicYearsResponse, AppError> {
        let status = filters.status.map(|s| s.as_str());
        let deployment_type = filters.deployment_type.map(|d| d.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM academic_years
               WHERE is_deleted = FALSE
                 AND ($1::text IS NULL OR status = $1)
                 AND ($2::text IS NULL OR deployment_type = $2)"#,
        )
        .bind(status)
        .bind(deployment_type)
        .fetch_one(db)
        .await?;

        let data = sqlx::query_as::<_, AcademicYear>(&format!(
            r#"SELECT {YEAR_COLUMNS} FROM academic_years
               WHERE is_deleted = FALSE
                 AND ($1::text IS NULL OR status = $1)
                 AND ($2::text IS NULL OR deployment_type = $2)
               ORDER BY start_date DESC, name
               LIMIT $3 OFFSET $4"#
        ))
        .bind(status)
        .bind(deployment_type)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedAcademicYearsResponse {
            data,
            meta: PaginationMeta::from_params(total, &pagination),
        })
    }

    /// Soft-deletes the year and its setup row.
    #[instrument(skip(db))]
    pub async fn delete_academic_year(db: &PgPool, id: AcademicYearId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let result = sqlx::query(
            r#"UPDATE academic_years SET is_deleted = TRUE, deleted_at = NOW(), updated_at = NOW()
               WHERE id = $1 AND is_deleted = FALSE"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(year_not_found());
        }

        sqlx::query(
            r#"UPDATE academic_year_setups SET is_deleted = TRUE, deleted_at = NOW()
               WHERE academic_year_id = $1 AND is_deleted = FALSE"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(academic_year_id = %id, "Academic year deleted");
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn restore_academic_year(
        db: &PgPool,
        id: AcademicYearId,
    ) -> Result<AcademicYear, AppError> {
        let mut tx = db.begin().await?;

        let year = sqlx::query_as::<_, AcademicYear>(&format!(
            r#"UPDATE academic_years SET is_deleted = FALSE, deleted_at = NULL, updated_at = NOW()
               WHERE id = $1 AND is_deleted = TRUE
               RETURNING {YEAR_COLUMNS}"#
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Deleted academic year not found")))?;

        sqlx::query(
            r#"UPDATE academic_year_setups SET is_deleted = FALSE, deleted_at = NULL
               WHERE academic_year_id = $1"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(year)
    }
}
