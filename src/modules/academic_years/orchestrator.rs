//! Workflow entry point for academic years.
//!
//! Every write runs in a single transaction: the rows involved are locked,
//! the pure rules on the model types decide the outcome, and the result is
//! persisted. A failure anywhere rolls the whole operation back.

use anyhow::anyhow;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};

use schoolyard_core::AppError;
use schoolyard_models::{
    AcademicYear, AcademicYearError, AcademicYearId, AcademicYearStatus, AcademicYearSetup,
    BulkEnrollFailure, BulkEnrollResponse, CreateAcademicYearDto, CreateGradeDto,
    CreateImportTaskDto, EnrollmentError, Grade, GradeId, ImportMethod, ImportProgressDto,
    ImportTask, ImportTaskId, ImportTaskStatus, REQUIRED_STEPS, SchoolUser, SetupProgressResponse,
    SetupStep, StudentEnrollment, TransferStudentDto, UserId,
};

use crate::metrics::{track_academic_year_transition, track_enrollment, track_import_finished};
use crate::modules::academic_years::service::{AcademicYearService, YEAR_COLUMNS};
use crate::modules::enrollments::service::EnrollmentService;
use crate::modules::grades::factory::GradeFactory;
use crate::modules::grades::service::GradeService;
use crate::modules::import_tasks::service::{IMPORT_TASK_COLUMNS, ImportTaskService};

fn setup_not_found() -> AppError {
    AppError::not_found(anyhow!("Setup not found for academic year"))
}

fn progress_of(setup: AcademicYearSetup) -> SetupProgressResponse {
    SetupProgressResponse {
        completion_percentage: setup.completion_percentage(&REQUIRED_STEPS),
        is_complete: setup.is_complete(),
        required_steps: REQUIRED_STEPS.to_vec(),
        setup,
    }
}

pub struct AcademicYearOrchestrator;

impl AcademicYearOrchestrator {
    // Lifecycle

    /// Creates a year in SETUP together with its setup checklist.
    #[instrument(skip(db, dto), fields(name = %dto.name))]
    pub async fn create_academic_year(
        db: &PgPool,
        dto: CreateAcademicYearDto,
    ) -> Result<AcademicYear, AppError> {
        let year = AcademicYear::new(
            dto.name,
            dto.start_date,
            dto.end_date,
            dto.deployment_type,
            dto.enrollment_start_date,
            dto.enrollment_end_date,
        );
        year.validate().map_err(AppError::bad_request)?;

        let mut tx = db.begin().await?;
        let year = AcademicYearService::insert_year(&mut tx, &year).await?;
        AcademicYearService::insert_setup(&mut tx, &AcademicYearSetup::new(year.id)).await?;
        tx.commit().await?;

        info!(
            academic_year_id = %year.id,
            deployment_type = %year.deployment_type,
            "Academic year created"
        );
        Ok(year)
    }

    async fn transition<F>(
        db: &PgPool,
        id: AcademicYearId,
        apply: F,
    ) -> Result<AcademicYear, AppError>
    where
        F: FnOnce(&mut AcademicYear, bool) -> Result<bool, AcademicYearError>,
    {
        let mut tx = db.begin().await?;

        let mut year = AcademicYearService::lock_year(&mut tx, id).await?;
        let setup_complete = AcademicYearService::find_setup(&mut tx, id)
            .await?
            .is_some_and(|setup| setup.is_complete());

        let from = year.status;
        if !apply(&mut year, setup_complete).map_err(AppError::bad_request)? {
            return Ok(year);
        }
        year.validate().map_err(AppError::bad_request)?;

        let year = AcademicYearService::save_status(&mut tx, &year).await?;
        tx.commit().await?;

        track_academic_year_transition(year.status.as_str());
        info!(
            academic_year_id = %id,
            from = %from,
            to = %year.status,
            "Academic year transitioned"
        );
        Ok(year)
    }

    /// SETUP → ENROLLMENT for fresh-start years with a complete setup.
    #[instrument(skip(db))]
    pub async fn transition_to_enrollment(
        db: &PgPool,
        id: AcademicYearId,
    ) -> Result<AcademicYear, AppError> {
        Self::transition(db, id, |year, setup_complete| {
            year.transition_to_enrollment(setup_complete).map(|()| true)
        })
        .await
    }

    /// A year that is already ACTIVE is returned unchanged.
    #[instrument(skip(db))]
    pub async fn transition_to_active(
        db: &PgPool,
        id: AcademicYearId,
    ) -> Result<AcademicYear, AppError> {
        Self::transition(db, id, |year, setup_complete| {
            year.transition_to_active(setup_complete)
        })
        .await
    }

    #[instrument(skip(db))]
    pub async fn transition_to_completed(
        db: &PgPool,
        id: AcademicYearId,
    ) -> Result<AcademicYear, AppError> {
        Self::transition(db, id, |year, _| Ok(year.transition_to_completed())).await
    }

    // Setup progress

    /// The checklist is the same for both deployment types.
    #[instrument(skip(db))]
    pub async fn get_required_steps(
        db: &PgPool,
        id: AcademicYearId,
    ) -> Result<Vec<SetupStep>, AppError> {
        AcademicYearService::get_academic_year(db, id).await?;
        Ok(REQUIRED_STEPS.to_vec())
    }

    async fn load_setup(
        db: &PgPool,
        id: AcademicYearId,
    ) -> Result<Option<AcademicYearSetup>, AppError> {
        let mut conn = db.acquire().await?;
        AcademicYearService::find_year(&mut conn, id).await?;
        AcademicYearService::find_setup(&mut conn, id).await
    }

    /// 0 when the year has no setup row.
    #[instrument(skip(db))]
    pub async fn get_completion_percentage(
        db: &PgPool,
        id: AcademicYearId,
    ) -> Result<f64, AppError> {
        Ok(Self::load_setup(db, id)
            .await?
            .map_or(0.0, |setup| setup.completion_percentage(&REQUIRED_STEPS)))
    }

    #[instrument(skip(db))]
    pub async fn is_setup_complete(db: &PgPool, id: AcademicYearId) -> Result<bool, AppError> {
        Ok(Self::load_setup(db, id)
            .await?
            .is_some_and(|setup| setup.is_complete()))
    }

    #[instrument(skip(db))]
    pub async fn get_setup_progress(
        db: &PgPool,
        id: AcademicYearId,
    ) -> Result<SetupProgressResponse, AppError> {
        let setup = Self::load_setup(db, id).await?.ok_or_else(setup_not_found)?;
        Ok(progress_of(setup))
    }

    async fn mark_step_in(
        conn: &mut PgConnection,
        id: AcademicYearId,
        step: SetupStep,
        method: Option<ImportMethod>,
    ) -> Result<AcademicYearSetup, AppError> {
        let mut setup = AcademicYearService::lock_setup(&mut *conn, id)
            .await?
            .ok_or_else(setup_not_found)?;

        setup
            .mark_step_complete(step, method)
            .map_err(AppError::bad_request)?;

        AcademicYearService::save_setup(conn, &setup).await
    }

    #[instrument(skip(db))]
    pub async fn mark_step_complete(
        db: &PgPool,
        id: AcademicYearId,
        step: SetupStep,
        method: Option<ImportMethod>,
    ) -> Result<SetupProgressResponse, AppError> {
        let mut tx = db.begin().await?;
        AcademicYearService::find_year(&mut tx, id).await?;
        let setup = Self::mark_step_in(&mut tx, id, step, method).await?;
        tx.commit().await?;

        info!(academic_year_id = %id, step = %step, next = %setup.current_step, "Setup step completed");
        Ok(progress_of(setup))
    }

    // Grades

    pub async fn create_grade(
        db: &PgPool,
        id: AcademicYearId,
        dto: CreateGradeDto,
    ) -> Result<Grade, AppError> {
        GradeFactory::create_grade(db, id, dto).await
    }

    pub async fn bulk_create_grades(
        db: &PgPool,
        id: AcademicYearId,
        rows: Vec<CreateGradeDto>,
    ) -> Result<Vec<Grade>, AppError> {
        GradeFactory::bulk_create_grades(db, id, rows).await
    }

    // Enrollment

    /// Returns the enrollment and whether it was newly created.
    async fn enroll_in(
        conn: &mut PgConnection,
        grade: &Grade,
        student_id: UserId,
    ) -> Result<(StudentEnrollment, bool), AppError> {
        match EnrollmentService::holds_student_role(&mut *conn, student_id).await? {
            None => return Err(AppError::not_found(anyhow!("Student not found"))),
            Some(false) => return Err(AppError::bad_request(EnrollmentError::NotAStudent)),
            Some(true) => {}
        }

        let year = AcademicYearService::find_year(&mut *conn, grade.academic_year_id).await?;
        if !year.can_accept_enrollments() {
            return Err(AppError::bad_request(EnrollmentError::YearClosed(
                year.status,
            )));
        }

        if let Some(existing) = EnrollmentService::find_live(&mut *conn, student_id, year.id).await?
        {
            if existing.grade_id == grade.id {
                return Ok((existing, false));
            }
            let current = GradeService::find_grade(&mut *conn, existing.grade_id).await?;
            return Err(AppError::bad_request(EnrollmentError::AlreadyEnrolled {
                grade: current.name,
                academic_year: year.name,
            }));
        }

        let enrollment = EnrollmentService::insert(conn, student_id, grade.id, year.id).await?;
        Ok((enrollment, true))
    }

    /// Enrolling a student already placed in this grade is a no-op.
    #[instrument(skip(db))]
    pub async fn enroll_student(
        db: &PgPool,
        grade_id: GradeId,
        student_id: UserId,
    ) -> Result<(StudentEnrollment, bool), AppError> {
        let mut tx = db.begin().await?;
        let grade = GradeService::find_grade(&mut tx, grade_id).await?;
        let (enrollment, created) = Self::enroll_in(&mut tx, &grade, student_id).await?;
        tx.commit().await?;

        if created {
            track_enrollment("enroll");
            info!(%student_id, %grade_id, "Student enrolled");
        }
        Ok((enrollment, created))
    }

    #[instrument(skip(db))]
    pub async fn unenroll_student(
        db: &PgPool,
        grade_id: GradeId,
        student_id: UserId,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;
        GradeService::find_grade(&mut tx, grade_id).await?;
        EnrollmentService::soft_delete(&mut tx, student_id, grade_id).await?;
        tx.commit().await?;

        track_enrollment("unenroll");
        info!(%student_id, %grade_id, "Student unenrolled");
        Ok(())
    }

    /// Moves a student between two grades of the same year.
    #[instrument(skip(db))]
    pub async fn transfer_student(
        db: &PgPool,
        dto: TransferStudentDto,
    ) -> Result<StudentEnrollment, AppError> {
        let mut tx = db.begin().await?;

        let from = GradeService::find_grade(&mut tx, dto.from_grade_id).await?;
        let to = GradeService::find_grade(&mut tx, dto.to_grade_id).await?;
        if from.academic_year_id != to.academic_year_id {
            return Err(AppError::bad_request(EnrollmentError::CrossYearTransfer));
        }

        EnrollmentService::soft_delete(&mut tx, dto.student_id, from.id).await?;
        let (enrollment, _) = Self::enroll_in(&mut tx, &to, dto.student_id).await?;
        tx.commit().await?;

        track_enrollment("transfer");
        info!(
            student_id = %dto.student_id,
            from_grade_id = %from.id,
            to_grade_id = %to.id,
            "Student transferred"
        );
        Ok(enrollment)
    }

    /// Enrolls each student in its own transaction. Rule violations are
    /// collected per student; server errors abort the batch.
    #[instrument(skip(db, student_ids), fields(count = student_ids.len()))]
    pub async fn bulk_enroll_students(
        db: &PgPool,
        grade_id: GradeId,
        student_ids: Vec<UserId>,
    ) -> Result<BulkEnrollResponse, AppError> {
        let grade = GradeService::get_grade(db, grade_id).await?;

        let mut enrolled = Vec::new();
        let mut failed = Vec::new();

        for student_id in student_ids {
            let mut tx = db.begin().await?;
            match Self::enroll_in(&mut tx, &grade, student_id).await {
                Ok((enrollment, created)) => {
                    tx.commit().await?;
                    if created {
                        track_enrollment("enroll");
                    }
                    enrolled.push(enrollment);
                }
                Err(e) if e.status.is_server_error() => return Err(e),
                Err(e) => {
                    tx.rollback().await?;
                    failed.push(BulkEnrollFailure {
                        student_id,
                        error: e.message(),
                    });
                }
            }
        }

        if !failed.is_empty() {
            warn!(%grade_id, failed = failed.len(), "Some students could not be enrolled");
        }
        info!(%grade_id, enrolled = enrolled.len(), "Bulk enrollment finished");
        Ok(BulkEnrollResponse { enrolled, failed })
    }

    // Import reporting

    #[instrument(skip(db, dto), fields(task_type = %dto.task_type))]
    pub async fn create_import_task(
        db: &PgPool,
        id: AcademicYearId,
        dto: CreateImportTaskDto,
    ) -> Result<ImportTask, AppError> {
        let mut conn = db.acquire().await?;
        AcademicYearService::find_year(&mut conn, id).await?;

        let task = sqlx::query_as::<_, ImportTask>(&format!(
            r#"INSERT INTO import_tasks (id, academic_year_id, task_type, total_records, file_path)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {IMPORT_TASK_COLUMNS}"#
        ))
        .bind(ImportTaskId::new())
        .bind(id)
        .bind(dto.task_type)
        .bind(dto.total_records)
        .bind(dto.file_path.as_deref().map(str::trim))
        .fetch_one(&mut *conn)
        .await?;

        info!(import_task_id = %task.id, academic_year_id = %id, "Import task created");
        Ok(task)
    }

    /// Locks a task that has not finished yet.
    async fn lock_open_task(
        conn: &mut PgConnection,
        id: ImportTaskId,
    ) -> Result<ImportTask, AppError> {
        let task = ImportTaskService::lock_task(conn, id).await?;
        if matches!(
            task.status,
            ImportTaskStatus::Completed | ImportTaskStatus::Failed
        ) {
            return Err(AppError::bad_request(anyhow!(
                "Import task is already {}",
                task.status
            )));
        }
        Ok(task)
    }

    #[instrument(skip(db))]
    pub async fn report_import_started(
        db: &PgPool,
        id: ImportTaskId,
    ) -> Result<ImportTask, AppError> {
        let mut tx = db.begin().await?;
        let mut task = Self::lock_open_task(&mut tx, id).await?;
        task.status = ImportTaskStatus::InProgress;
        let task = ImportTaskService::save(&mut tx, &task).await?;
        tx.commit().await?;
        Ok(task)
    }

    /// Existing error details are kept when none are reported.
    #[instrument(skip(db, dto))]
    pub async fn report_import_progress(
        db: &PgPool,
        id: ImportTaskId,
        dto: ImportProgressDto,
    ) -> Result<ImportTask, AppError> {
        let mut tx = db.begin().await?;
        let mut task = Self::lock_open_task(&mut tx, id).await?;

        task.processed_records = dto.processed;
        task.success_count = dto.success;
        task.error_count = dto.errors;
        if let Some(details) = dto.error_details.filter(|d| !d.is_null()) {
            task.error_details = Some(details);
        }

        let task = ImportTaskService::save(&mut tx, &task).await?;
        tx.commit().await?;
        Ok(task)
    }

    /// Completes the task and, for grade and student imports, the matching
    /// setup step (recorded as a CSV import) unless it is already done.
    #[instrument(skip(db))]
    pub async fn report_import_completed(
        db: &PgPool,
        id: ImportTaskId,
    ) -> Result<ImportTask, AppError> {
        let mut tx = db.begin().await?;
        let mut task = Self::lock_open_task(&mut tx, id).await?;

        task.status = ImportTaskStatus::Completed;
        task.completed_at = Some(Utc::now());
        let task = ImportTaskService::save(&mut tx, &task).await?;

        if let Some(step) = task.task_type.completes_step() {
            let done = AcademicYearService::find_setup(&mut tx, task.academic_year_id)
                .await?
                .is_some_and(|setup| setup.is_step_completed(step));
            if !done {
                Self::mark_step_in(&mut tx, task.academic_year_id, step, Some(ImportMethod::Csv))
                    .await?;
            }
        }

        tx.commit().await?;
        track_import_finished(task.task_type.as_str(), task.status.as_str());
        info!(import_task_id = %id, task_type = %task.task_type, "Import completed");
        Ok(task)
    }

    #[instrument(skip(db, details))]
    pub async fn report_import_failed(
        db: &PgPool,
        id: ImportTaskId,
        details: Option<serde_json::Value>,
    ) -> Result<ImportTask, AppError> {
        let mut tx = db.begin().await?;
        let mut task = Self::lock_open_task(&mut tx, id).await?;

        task.status = ImportTaskStatus::Failed;
        task.completed_at = Some(Utc::now());
        if let Some(details) = details.filter(|d| !d.is_null()) {
            task.error_details = Some(details);
        }

        let task = ImportTaskService::save(&mut tx, &task).await?;
        tx.commit().await?;
        track_import_finished(task.task_type.as_str(), task.status.as_str());
        warn!(import_task_id = %id, task_type = %task.task_type, "Import failed");
        Ok(task)
    }

    // Queries

    /// The first live ACTIVE year, oldest start date first.
    #[instrument(skip(db))]
    pub async fn get_active_academic_year(db: &PgPool) -> Result<Option<AcademicYear>, AppError> {
        let year = sqlx::query_as::<_, AcademicYear>(&format!(
            r#"SELECT {YEAR_COLUMNS} FROM academic_years
               WHERE status = $1 AND is_deleted = FALSE
               ORDER BY start_date
               LIMIT 1"#
        ))
        .bind(AcademicYearStatus::Active)
        .fetch_optional(db)
        .await?;

        Ok(year)
    }

    pub async fn get_grades_for_academic_year(
        db: &PgPool,
        id: AcademicYearId,
    ) -> Result<Vec<Grade>, AppError> {
        GradeService::get_grades_for_academic_year(db, id, Default::default()).await
    }

    pub async fn get_student_enrollment(
        db: &PgPool,
        student_id: UserId,
        id: AcademicYearId,
    ) -> Result<Option<StudentEnrollment>, AppError> {
        EnrollmentService::get_student_enrollment(db, student_id, id).await
    }

    pub async fn get_students_in_grade(
        db: &PgPool,
        grade_id: GradeId,
    ) -> Result<Vec<SchoolUser>, AppError> {
        GradeService::get_students_in_grade(db, grade_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use schoolyard_models::{CreateUserDto, DeploymentType, Email};
    use uuid::Uuid;

    use crate::modules::users::factory::UserProfileFactory;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn year_dto(name: &str, deployment_type: DeploymentType) -> CreateAcademicYearDto {
        CreateAcademicYearDto {
            name: name.to_string(),
            start_date: date(2025, 9, 1),
            end_date: date(2026, 7, 15),
            deployment_type,
            enrollment_start_date: None,
            enrollment_end_date: None,
        }
    }

    fn grade_dto(name: &str, grade: &str) -> CreateGradeDto {
        CreateGradeDto {
            name: name.to_string(),
            grade: grade.to_string(),
            grade_type: String::new(),
            grade_subtype: String::new(),
            description: String::new(),
        }
    }

    fn user_dto(first: &str) -> CreateUserDto {
        CreateUserDto {
            first_name: first.to_string(),
            last_name: "Tester".to_string(),
            email: Email::new(format!("{}-{}@school.example", first.to_lowercase(), Uuid::new_v4()))
                .unwrap(),
            password: "password123".to_string(),
            phone_number: None,
            date_of_birth: None,
            address: None,
            attributes: None,
        }
    }

    async fn complete_setup(pool: &PgPool, id: AcademicYearId) {
        for (step, method) in [
            (SetupStep::BasicInfo, None),
            (SetupStep::ImportGrades, Some(ImportMethod::Manual)),
            (SetupStep::ImportStudents, Some(ImportMethod::Manual)),
            (SetupStep::AssignClassrooms, Some(ImportMethod::Manual)),
            (SetupStep::Review, None),
        ] {
            AcademicYearOrchestrator::mark_step_complete(pool, id, step, method)
                .await
                .unwrap();
        }
    }

    async fn student(pool: &PgPool, first: &str) -> UserId {
        UserProfileFactory::create_student(pool, user_dto(first))
            .await
            .unwrap()
            .id()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_academic_year_starts_in_setup_with_checklist(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("2025/2026", DeploymentType::FreshStart),
        )
        .await
        .unwrap();

        assert_eq!(year.status, AcademicYearStatus::Setup);
        assert!(!year.setup_completed);

        let progress = AcademicYearOrchestrator::get_setup_progress(&pool, year.id)
            .await
            .unwrap();
        assert_eq!(progress.setup.current_step, SetupStep::BasicInfo);
        assert_eq!(progress.completion_percentage, 0.0);
        assert_eq!(progress.required_steps, REQUIRED_STEPS.to_vec());
        assert!(!progress.is_complete);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_academic_year_rejects_bad_dates_and_duplicates(pool: PgPool) {
        let mut dto = year_dto("Backwards", DeploymentType::FreshStart);
        dto.end_date = date(2025, 1, 1);
        let err = AcademicYearOrchestrator::create_academic_year(&pool, dto)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Start date must be before end date.");

        AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("2025/2026", DeploymentType::FreshStart),
        )
        .await
        .unwrap();
        let err = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("2025/2026", DeploymentType::MidYear),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let setups: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM academic_year_setups")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(setups, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_fresh_start_lifecycle(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Fresh", DeploymentType::FreshStart),
        )
        .await
        .unwrap();

        let err = AcademicYearOrchestrator::transition_to_enrollment(&pool, year.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message().contains("Setup must be complete"));

        complete_setup(&pool, year.id).await;
        assert!(
            AcademicYearOrchestrator::is_setup_complete(&pool, year.id)
                .await
                .unwrap()
        );

        let err = AcademicYearOrchestrator::transition_to_active(&pool, year.id)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Fresh start must go through ENROLLMENT phase");

        let year = AcademicYearOrchestrator::transition_to_enrollment(&pool, year.id)
            .await
            .unwrap();
        assert_eq!(year.status, AcademicYearStatus::Enrollment);
        assert!(year.setup_completed);

        let year = AcademicYearOrchestrator::transition_to_active(&pool, year.id)
            .await
            .unwrap();
        assert_eq!(year.status, AcademicYearStatus::Active);

        let again = AcademicYearOrchestrator::transition_to_active(&pool, year.id)
            .await
            .unwrap();
        assert_eq!(again.updated_at, year.updated_at);

        let active = AcademicYearOrchestrator::get_active_academic_year(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.id, year.id);

        let year = AcademicYearOrchestrator::transition_to_completed(&pool, year.id)
            .await
            .unwrap();
        assert_eq!(year.status, AcademicYearStatus::Completed);
        assert!(!year.is_active);

        let err = AcademicYearOrchestrator::transition_to_active(&pool, year.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_mid_year_goes_straight_to_active(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Mid", DeploymentType::MidYear),
        )
        .await
        .unwrap();
        complete_setup(&pool, year.id).await;

        let err = AcademicYearOrchestrator::transition_to_enrollment(&pool, year.id)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Mid-year deployment should transition directly to ACTIVE");

        let year = AcademicYearOrchestrator::transition_to_active(&pool, year.id)
            .await
            .unwrap();
        assert_eq!(year.status, AcademicYearStatus::Active);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_completing_from_setup_marks_setup_done(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Abandoned", DeploymentType::FreshStart),
        )
        .await
        .unwrap();

        let year = AcademicYearOrchestrator::transition_to_completed(&pool, year.id)
            .await
            .unwrap();
        assert_eq!(year.status, AcademicYearStatus::Completed);
        assert!(year.setup_completed);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_mark_import_step_requires_method(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Steps", DeploymentType::FreshStart),
        )
        .await
        .unwrap();

        let err = AcademicYearOrchestrator::mark_step_complete(
            &pool,
            year.id,
            SetupStep::ImportGrades,
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let progress = AcademicYearOrchestrator::mark_step_complete(
            &pool,
            year.id,
            SetupStep::BasicInfo,
            None,
        )
        .await
        .unwrap();
        assert_eq!(progress.completion_percentage, 20.0);
        assert_eq!(progress.setup.current_step, SetupStep::ImportGrades);
        assert!(!progress.setup.import_grades_completed);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_completion_percentage_and_missing_setup_row(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Percentages", DeploymentType::MidYear),
        )
        .await
        .unwrap();

        assert_eq!(
            AcademicYearOrchestrator::get_completion_percentage(&pool, year.id)
                .await
                .unwrap(),
            0.0
        );

        for (step, method) in [
            (SetupStep::BasicInfo, None),
            (SetupStep::ImportGrades, Some(ImportMethod::Csv)),
        ] {
            AcademicYearOrchestrator::mark_step_complete(&pool, year.id, step, method)
                .await
                .unwrap();
        }
        assert_eq!(
            AcademicYearOrchestrator::get_completion_percentage(&pool, year.id)
                .await
                .unwrap(),
            40.0
        );
        assert!(!AcademicYearOrchestrator::is_setup_complete(&pool, year.id).await.unwrap());

        complete_setup(&pool, year.id).await;
        assert_eq!(
            AcademicYearOrchestrator::get_completion_percentage(&pool, year.id)
                .await
                .unwrap(),
            100.0
        );
        assert!(AcademicYearOrchestrator::is_setup_complete(&pool, year.id).await.unwrap());

        sqlx::query(
            "UPDATE academic_year_setups SET is_deleted = TRUE, deleted_at = NOW() \
             WHERE academic_year_id = $1",
        )
        .bind(year.id)
        .execute(&pool)
        .await
        .unwrap();

        assert_eq!(
            AcademicYearOrchestrator::get_completion_percentage(&pool, year.id)
                .await
                .unwrap(),
            0.0
        );
        assert!(!AcademicYearOrchestrator::is_setup_complete(&pool, year.id).await.unwrap());
        let err = AcademicYearOrchestrator::get_setup_progress(&pool, year.id)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_grades_only_while_setup_or_enrollment(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Grades", DeploymentType::MidYear),
        )
        .await
        .unwrap();

        AcademicYearOrchestrator::create_grade(&pool, year.id, grade_dto("1A", " 1 "))
            .await
            .unwrap();
        AcademicYearOrchestrator::create_grade(&pool, year.id, grade_dto("KG Blue", "KG"))
            .await
            .unwrap();

        let grades = AcademicYearOrchestrator::get_grades_for_academic_year(&pool, year.id)
            .await
            .unwrap();
        let levels: Vec<_> = grades.iter().map(|g| g.grade.as_str()).collect();
        assert_eq!(levels, vec!["1", "KG"]);

        let err = AcademicYearOrchestrator::create_grade(&pool, year.id, grade_dto("1A", "1"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        complete_setup(&pool, year.id).await;
        AcademicYearOrchestrator::transition_to_active(&pool, year.id)
            .await
            .unwrap();

        let err = AcademicYearOrchestrator::create_grade(&pool, year.id, grade_dto("2A", "2"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message().starts_with("Cannot create grades for academic year in Active"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_bulk_create_grades_is_all_or_nothing(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Bulk", DeploymentType::FreshStart),
        )
        .await
        .unwrap();

        let err = AcademicYearOrchestrator::bulk_create_grades(
            &pool,
            year.id,
            vec![grade_dto("1A", "1"), grade_dto("1B", "   ")],
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Cannot be empty or just blank spaces");

        let grades = AcademicYearOrchestrator::get_grades_for_academic_year(&pool, year.id)
            .await
            .unwrap();
        assert!(grades.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_enrollment_rules(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Enroll", DeploymentType::FreshStart),
        )
        .await
        .unwrap();
        let one_a = AcademicYearOrchestrator::create_grade(&pool, year.id, grade_dto("1A", "1"))
            .await
            .unwrap();
        let one_b = AcademicYearOrchestrator::create_grade(&pool, year.id, grade_dto("1B", "1"))
            .await
            .unwrap();
        let stu = student(&pool, "Stu").await;

        let (first, created) = AcademicYearOrchestrator::enroll_student(&pool, one_a.id, stu)
            .await
            .unwrap();
        assert!(created);

        let (again, created) = AcademicYearOrchestrator::enroll_student(&pool, one_a.id, stu)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(again.id, first.id);

        let err = AcademicYearOrchestrator::enroll_student(&pool, one_b.id, stu)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Student is already enrolled in 1A for Enroll");

        let parent = UserProfileFactory::create_parent(&pool, user_dto("Pat"))
            .await
            .unwrap();
        let err = AcademicYearOrchestrator::enroll_student(&pool, one_a.id, parent.id())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "User must have STUDENT role to be enrolled");

        let err = AcademicYearOrchestrator::enroll_student(&pool, one_a.id, UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unenroll_then_reenroll_and_closed_year(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Unenroll", DeploymentType::FreshStart),
        )
        .await
        .unwrap();
        let grade = AcademicYearOrchestrator::create_grade(&pool, year.id, grade_dto("3A", "3"))
            .await
            .unwrap();
        let stu = student(&pool, "Una").await;

        let err = AcademicYearOrchestrator::unenroll_student(&pool, grade.id, stu)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Student is not enrolled in this grade");

        AcademicYearOrchestrator::enroll_student(&pool, grade.id, stu)
            .await
            .unwrap();
        AcademicYearOrchestrator::unenroll_student(&pool, grade.id, stu)
            .await
            .unwrap();
        assert!(
            AcademicYearOrchestrator::get_student_enrollment(&pool, stu, year.id)
                .await
                .unwrap()
                .is_none()
        );

        let (_, created) = AcademicYearOrchestrator::enroll_student(&pool, grade.id, stu)
            .await
            .unwrap();
        assert!(created);

        AcademicYearOrchestrator::transition_to_completed(&pool, year.id)
            .await
            .unwrap();
        let other = student(&pool, "Late").await;
        let err = AcademicYearOrchestrator::enroll_student(&pool, grade.id, other)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Cannot enroll students when academic year is Completed");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_transfer_within_year_only(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("This year", DeploymentType::FreshStart),
        )
        .await
        .unwrap();
        let mut next_dto = year_dto("Next year", DeploymentType::FreshStart);
        next_dto.start_date = date(2026, 9, 1);
        next_dto.end_date = date(2027, 7, 15);
        let next = AcademicYearOrchestrator::create_academic_year(&pool, next_dto)
            .await
            .unwrap();

        let from = AcademicYearOrchestrator::create_grade(&pool, year.id, grade_dto("4A", "4"))
            .await
            .unwrap();
        let to = AcademicYearOrchestrator::create_grade(&pool, year.id, grade_dto("4B", "4"))
            .await
            .unwrap();
        let elsewhere = AcademicYearOrchestrator::create_grade(&pool, next.id, grade_dto("5A", "5"))
            .await
            .unwrap();
        let stu = student(&pool, "Tom").await;
        AcademicYearOrchestrator::enroll_student(&pool, from.id, stu)
            .await
            .unwrap();

        let err = AcademicYearOrchestrator::transfer_student(
            &pool,
            TransferStudentDto {
                student_id: stu,
                from_grade_id: from.id,
                to_grade_id: elsewhere.id,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.message(), "Cannot transfer student between different academic years");

        let moved = AcademicYearOrchestrator::transfer_student(
            &pool,
            TransferStudentDto {
                student_id: stu,
                from_grade_id: from.id,
                to_grade_id: to.id,
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.grade_id, to.id);

        let in_from = AcademicYearOrchestrator::get_students_in_grade(&pool, from.id)
            .await
            .unwrap();
        let in_to = AcademicYearOrchestrator::get_students_in_grade(&pool, to.id)
            .await
            .unwrap();
        assert!(in_from.is_empty());
        assert_eq!(in_to.len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_bulk_enroll_collects_failures(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Bulk enroll", DeploymentType::FreshStart),
        )
        .await
        .unwrap();
        let grade = AcademicYearOrchestrator::create_grade(&pool, year.id, grade_dto("6A", "6"))
            .await
            .unwrap();
        let a = student(&pool, "Amy").await;
        let b = student(&pool, "Ben").await;
        let teacher = UserProfileFactory::create_teacher(&pool, user_dto("Tess"))
            .await
            .unwrap();

        let result = AcademicYearOrchestrator::bulk_enroll_students(
            &pool,
            grade.id,
            vec![a, teacher.id(), b],
        )
        .await
        .unwrap();

        assert_eq!(result.enrolled.len(), 2);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].student_id, teacher.id());
        assert_eq!(result.failed[0].error, "User must have STUDENT role to be enrolled");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_import_completion_marks_setup_step(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Imports", DeploymentType::FreshStart),
        )
        .await
        .unwrap();

        let task = AcademicYearOrchestrator::create_import_task(
            &pool,
            year.id,
            CreateImportTaskDto {
                task_type: schoolyard_models::ImportTaskType::Grades,
                total_records: 10,
                file_path: Some("uploads/grades.csv".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(task.status, ImportTaskStatus::Pending);

        let task = AcademicYearOrchestrator::report_import_started(&pool, task.id)
            .await
            .unwrap();
        assert_eq!(task.status, ImportTaskStatus::InProgress);

        let task = AcademicYearOrchestrator::report_import_progress(
            &pool,
            task.id,
            ImportProgressDto {
                processed: 5,
                success: 4,
                errors: 1,
                error_details: Some(serde_json::json!({"row 3": "missing grade"})),
            },
        )
        .await
        .unwrap();
        assert_eq!(task.progress_percentage(), 50.0);

        let task = AcademicYearOrchestrator::report_import_completed(&pool, task.id)
            .await
            .unwrap();
        assert_eq!(task.status, ImportTaskStatus::Completed);
        assert!(task.completed_at.is_some());
        assert!(task.error_details.is_some());

        let progress = AcademicYearOrchestrator::get_setup_progress(&pool, year.id)
            .await
            .unwrap();
        assert!(progress.setup.import_grades_completed);
        assert_eq!(progress.setup.grades_import_method, ImportMethod::Csv);

        let err = AcademicYearOrchestrator::report_import_failed(&pool, task.id, None)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_import_completion_keeps_existing_method(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Manual first", DeploymentType::FreshStart),
        )
        .await
        .unwrap();
        AcademicYearOrchestrator::mark_step_complete(
            &pool,
            year.id,
            SetupStep::ImportStudents,
            Some(ImportMethod::Api),
        )
        .await
        .unwrap();

        let task = AcademicYearOrchestrator::create_import_task(
            &pool,
            year.id,
            CreateImportTaskDto {
                task_type: schoolyard_models::ImportTaskType::Students,
                total_records: 0,
                file_path: None,
            },
        )
        .await
        .unwrap();
        AcademicYearOrchestrator::report_import_completed(&pool, task.id)
            .await
            .unwrap();

        let progress = AcademicYearOrchestrator::get_setup_progress(&pool, year.id)
            .await
            .unwrap();
        assert_eq!(progress.setup.students_import_method, ImportMethod::Api);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_failed_import_records_details(pool: PgPool) {
        let year = AcademicYearOrchestrator::create_academic_year(
            &pool,
            year_dto("Failing", DeploymentType::FreshStart),
        )
        .await
        .unwrap();
        let task = AcademicYearOrchestrator::create_import_task(
            &pool,
            year.id,
            CreateImportTaskDto {
                task_type: schoolyard_models::ImportTaskType::Classrooms,
                total_records: 3,
                file_path: None,
            },
        )
        .await
        .unwrap();

        let task = AcademicYearOrchestrator::report_import_failed(
            &pool,
            task.id,
            Some(serde_json::json!({"error": "file unreadable"})),
        )
        .await
        .unwrap();
        assert_eq!(task.status, ImportTaskStatus::Failed);
        assert!(task.completed_at.is_some());
        assert_eq!(
            task.error_details,
            Some(serde_json::json!({"error": "file unreadable"}))
        );
    }
}
