use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use schoolyard_core::{AppError, PaginationParams};
use schoolyard_models::{
    AcademicYear, AcademicYearDetail, AcademicYearFilterParams, AcademicYearId,
    BulkCreateGradesDto, CreateAcademicYearDto, CreateGradeDto, CreateImportTaskDto, Grade,
    GradeFilterParams, ImportTaskResponse, MarkStepCompleteDto, PaginatedAcademicYearsResponse,
    SetupProgressResponse, SetupStep, StudentEnrollment, UserId, academic_setup::parse_step,
};

use crate::middleware::role::{RequireAdministrator, RequireStaff};
use crate::modules::academic_years::orchestrator::AcademicYearOrchestrator;
use crate::modules::academic_years::service::AcademicYearService;
use crate::modules::grades::service::GradeService;
use crate::modules::import_tasks::service::ImportTaskService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create an academic year in SETUP together with its setup checklist
#[utoipa::path(
    post,
    path = "/api/academic-years",
    request_body = CreateAcademicYearDto,
    responses(
        (status = 201, description = "Academic year created", body = AcademicYear),
        (status = 400, description = "Invalid dates or duplicate name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 422, description = "Validation error")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_academic_year(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    ValidatedJson(dto): ValidatedJson<CreateAcademicYearDto>,
) -> Result<(StatusCode, Json<AcademicYear>), AppError> {
    let year = AcademicYearOrchestrator::create_academic_year(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(year)))
}

#[utoipa::path(
    get,
    path = "/api/academic-years",
    params(AcademicYearFilterParams, PaginationParams),
    responses(
        (status = 200, description = "Academic years", body = PaginatedAcademicYearsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _staff))]
pub async fn get_academic_years(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Query(filters): Query<AcademicYearFilterParams>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedAcademicYearsResponse>, AppError> {
    let years = AcademicYearService::get_academic_years(&state.db, filters, pagination).await?;
    Ok(Json(years))
}

/// The current ACTIVE academic year
#[utoipa::path(
    get,
    path = "/api/academic-years/active",
    responses(
        (status = 200, description = "Active academic year", body = AcademicYear),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "No active academic year")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _staff))]
pub async fn get_active_academic_year(
    State(state): State<AppState>,
    _staff: RequireStaff,
) -> Result<Json<AcademicYear>, AppError> {
    AcademicYearOrchestrator::get_active_academic_year(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("No active academic year")))
}

#[utoipa::path(
    get,
    path = "/api/academic-years/{id}",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    responses(
        (status = 200, description = "Academic year with setup progress", body = AcademicYearDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _staff))]
pub async fn get_academic_year(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Path(id): Path<AcademicYearId>,
) -> Result<Json<AcademicYearDetail>, AppError> {
    let detail = AcademicYearService::get_academic_year_detail(&state.db, id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    delete,
    path = "/api/academic-years/{id}",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    responses(
        (status = 204, description = "Academic year soft-deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_academic_year(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<AcademicYearId>,
) -> Result<StatusCode, AppError> {
    AcademicYearService::delete_academic_year(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/academic-years/{id}/restore",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    responses(
        (status = 200, description = "Academic year restored", body = AcademicYear),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Deleted academic year not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn restore_academic_year(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<AcademicYearId>,
) -> Result<Json<AcademicYear>, AppError> {
    let year = AcademicYearService::restore_academic_year(&state.db, id).await?;
    Ok(Json(year))
}

/// SETUP → ENROLLMENT (fresh start only)
#[utoipa::path(
    post,
    path = "/api/academic-years/{id}/start-enrollment",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    responses(
        (status = 200, description = "Year moved to ENROLLMENT", body = AcademicYear),
        (status = 400, description = "Transition not allowed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn start_enrollment(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<AcademicYearId>,
) -> Result<Json<AcademicYear>, AppError> {
    let year = AcademicYearOrchestrator::transition_to_enrollment(&state.db, id).await?;
    Ok(Json(year))
}

/// → ACTIVE (from SETUP for mid-year adoption, from ENROLLMENT otherwise)
#[utoipa::path(
    post,
    path = "/api/academic-years/{id}/activate",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    responses(
        (status = 200, description = "Year is ACTIVE", body = AcademicYear),
        (status = 400, description = "Transition not allowed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn activate(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<AcademicYearId>,
) -> Result<Json<AcademicYear>, AppError> {
    let year = AcademicYearOrchestrator::transition_to_active(&state.db, id).await?;
    Ok(Json(year))
}

#[utoipa::path(
    post,
    path = "/api/academic-years/{id}/complete",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    responses(
        (status = 200, description = "Year is COMPLETED", body = AcademicYear),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn complete(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<AcademicYearId>,
) -> Result<Json<AcademicYear>, AppError> {
    let year = AcademicYearOrchestrator::transition_to_completed(&state.db, id).await?;
    Ok(Json(year))
}

#[utoipa::path(
    get,
    path = "/api/academic-years/{id}/setup",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    responses(
        (status = 200, description = "Setup progress", body = SetupProgressResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Academic year or setup not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _staff))]
pub async fn get_setup_progress(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Path(id): Path<AcademicYearId>,
) -> Result<Json<SetupProgressResponse>, AppError> {
    let progress = AcademicYearOrchestrator::get_setup_progress(&state.db, id).await?;
    Ok(Json(progress))
}

#[utoipa::path(
    get,
    path = "/api/academic-years/{id}/setup/steps",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    responses(
        (status = 200, description = "Required setup steps in order", body = Vec<SetupStep>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _staff))]
pub async fn get_required_steps(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Path(id): Path<AcademicYearId>,
) -> Result<Json<Vec<SetupStep>>, AppError> {
    let steps = AcademicYearOrchestrator::get_required_steps(&state.db, id).await?;
    Ok(Json(steps))
}

/// Mark a setup step complete; import steps need an import method
#[utoipa::path(
    post,
    path = "/api/academic-years/{id}/setup/steps/{step}",
    params(
        ("id" = Uuid, Path, description = "Academic year ID"),
        ("step" = String, Path, description = "Setup step, e.g. IMPORT_GRADES")
    ),
    request_body = MarkStepCompleteDto,
    responses(
        (status = 200, description = "Updated setup progress", body = SetupProgressResponse),
        (status = 400, description = "Unknown step or missing import method"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Academic year or setup not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn mark_step_complete(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path((id, step)): Path<(AcademicYearId, String)>,
    ValidatedJson(dto): ValidatedJson<MarkStepCompleteDto>,
) -> Result<Json<SetupProgressResponse>, AppError> {
    let step = parse_step(&step).map_err(AppError::bad_request)?;
    let progress =
        AcademicYearOrchestrator::mark_step_complete(&state.db, id, step, dto.import_method)
            .await?;
    Ok(Json(progress))
}

#[utoipa::path(
    post,
    path = "/api/academic-years/{id}/grades",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    request_body = CreateGradeDto,
    responses(
        (status = 201, description = "Grade created", body = Grade),
        (status = 400, description = "Year closed for grades, invalid level or duplicate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Academic year not found"),
        (status = 422, description = "Validation error")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_grade(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<AcademicYearId>,
    ValidatedJson(dto): ValidatedJson<CreateGradeDto>,
) -> Result<(StatusCode, Json<Grade>), AppError> {
    let grade = AcademicYearOrchestrator::create_grade(&state.db, id, dto).await?;
    Ok((StatusCode::CREATED, Json(grade)))
}

/// Create several grades; nothing is created if any row fails
#[utoipa::path(
    post,
    path = "/api/academic-years/{id}/grades/bulk",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    request_body = BulkCreateGradesDto,
    responses(
        (status = 201, description = "Grades created", body = Vec<Grade>),
        (status = 400, description = "Year closed for grades, invalid level or duplicate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Academic year not found"),
        (status = 422, description = "Validation error")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn bulk_create_grades(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<AcademicYearId>,
    ValidatedJson(dto): ValidatedJson<BulkCreateGradesDto>,
) -> Result<(StatusCode, Json<Vec<Grade>>), AppError> {
    let grades = AcademicYearOrchestrator::bulk_create_grades(&state.db, id, dto.grades).await?;
    Ok((StatusCode::CREATED, Json(grades)))
}

#[utoipa::path(
    get,
    path = "/api/academic-years/{id}/grades",
    params(("id" = Uuid, Path, description = "Academic year ID"), GradeFilterParams),
    responses(
        (status = 200, description = "Grades ordered by level and name", body = Vec<Grade>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _staff))]
pub async fn get_grades(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Path(id): Path<AcademicYearId>,
    Query(filters): Query<GradeFilterParams>,
) -> Result<Json<Vec<Grade>>, AppError> {
    let grades = GradeService::get_grades_for_academic_year(&state.db, id, filters).await?;
    Ok(Json(grades))
}

#[utoipa::path(
    get,
    path = "/api/academic-years/{id}/students/{student_id}/enrollment",
    params(
        ("id" = Uuid, Path, description = "Academic year ID"),
        ("student_id" = Uuid, Path, description = "Student user ID")
    ),
    responses(
        (status = 200, description = "Live enrollment", body = StudentEnrollment),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Student is not enrolled this year")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _staff))]
pub async fn get_student_enrollment(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Path((id, student_id)): Path<(AcademicYearId, UserId)>,
) -> Result<Json<StudentEnrollment>, AppError> {
    AcademicYearOrchestrator::get_student_enrollment(&state.db, student_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::not_found(anyhow::anyhow!("Student is not enrolled this academic year"))
        })
}

#[utoipa::path(
    post,
    path = "/api/academic-years/{id}/import-tasks",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    request_body = CreateImportTaskDto,
    responses(
        (status = 201, description = "Import task created in PENDING", body = ImportTaskResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Academic year not found"),
        (status = 422, description = "Validation error")
    ),
    tag = "Import Tasks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_import_task(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<AcademicYearId>,
    ValidatedJson(dto): ValidatedJson<CreateImportTaskDto>,
) -> Result<(StatusCode, Json<ImportTaskResponse>), AppError> {
    let task = AcademicYearOrchestrator::create_import_task(&state.db, id, dto).await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

#[utoipa::path(
    get,
    path = "/api/academic-years/{id}/import-tasks",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    responses(
        (status = 200, description = "Import tasks, newest first", body = Vec<ImportTaskResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Import Tasks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_import_tasks(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<AcademicYearId>,
) -> Result<Json<Vec<ImportTaskResponse>>, AppError> {
    let tasks = ImportTaskService::get_import_tasks_for_academic_year(&state.db, id).await?;
    Ok(Json(tasks.into_iter().map(ImportTaskResponse::from).collect()))
}
