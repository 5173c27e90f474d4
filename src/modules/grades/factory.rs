//! Grade creation gated on the academic year's lifecycle.
//!
//! Grades may only be added while the year is in SETUP or ENROLLMENT. The
//! year row is locked for the duration so a concurrent transition cannot
//! slip in between the check and the insert.

use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use schoolyard_core::AppError;
use schoolyard_models::{
    AcademicYear, AcademicYearId, CreateGradeDto, Grade, GradeError, GradeId,
    grades::validate_grade_level,
};

use crate::modules::academic_years::service::AcademicYearService;
use crate::modules::grades::service::GRADE_COLUMNS;

pub struct GradeFactory;

impl GradeFactory {
    fn ensure_accepts_grades(year: &AcademicYear) -> Result<(), AppError> {
        if !year.can_accept_grades() {
            return Err(AppError::bad_request(GradeError::YearClosedForGrades(
                year.status,
            )));
        }
        Ok(())
    }

    async fn insert(
        conn: &mut PgConnection,
        academic_year_id: AcademicYearId,
        dto: CreateGradeDto,
    ) -> Result<Grade, AppError> {
        let level = validate_grade_level(&dto.grade).map_err(AppError::bad_request)?;
        let name = dto.name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request(anyhow!("Grade name cannot be blank")));
        }

        sqlx::query_as::<_, Grade>(&format!(
            r#"INSERT INTO grades
                   (id, academic_year_id, name, description, grade, grade_type, grade_subtype)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {GRADE_COLUMNS}"#
        ))
        .bind(GradeId::new())
        .bind(academic_year_id)
        .bind(name)
        .bind(dto.description.trim())
        .bind(&level)
        .bind(dto.grade_type.trim())
        .bind(dto.grade_subtype.trim())
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow!(
                    "Grade '{}' (level {}) already exists for this academic year",
                    name,
                    level
                ));
            }
            AppError::from(e)
        })
    }

    #[instrument(skip(db, dto), fields(name = %dto.name, grade = %dto.grade))]
    pub async fn create_grade(
        db: &PgPool,
        academic_year_id: AcademicYearId,
        dto: CreateGradeDto,
    ) -> Result<Grade, AppError> {
        let mut tx = db.begin().await?;

        let year = AcademicYearService::lock_year(&mut tx, academic_year_id).await?;
        Self::ensure_accepts_grades(&year)?;
        let grade = Self::insert(&mut tx, academic_year_id, dto).await?;

        tx.commit().await?;
        info!(grade_id = %grade.id, academic_year_id = %academic_year_id, "Grade created");
        Ok(grade)
    }

    /// Creates every row or none of them.
    #[instrument(skip(db, rows), fields(count = rows.len()))]
    pub async fn bulk_create_grades(
        db: &PgPool,
        academic_year_id: AcademicYearId,
        rows: Vec<CreateGradeDto>,
    ) -> Result<Vec<Grade>, AppError> {
        let mut tx = db.begin().await?;

        let year = AcademicYearService::lock_year(&mut tx, academic_year_id).await?;
        Self::ensure_accepts_grades(&year)?;

        let mut grades = Vec::with_capacity(rows.len());
        for row in rows {
            grades.push(Self::insert(&mut tx, academic_year_id, row).await?);
        }

        tx.commit().await?;
        info!(
            academic_year_id = %academic_year_id,
            count = grades.len(),
            "Grades created"
        );
        Ok(grades)
    }
}
