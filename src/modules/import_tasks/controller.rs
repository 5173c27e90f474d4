use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use schoolyard_core::AppError;
use schoolyard_models::{ImportFailedDto, ImportProgressDto, ImportTaskId, ImportTaskResponse};

use crate::middleware::role::RequireAdministrator;
use crate::modules::academic_years::orchestrator::AcademicYearOrchestrator;
use crate::modules::import_tasks::service::ImportTaskService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/import-tasks/{id}",
    params(("id" = Uuid, Path, description = "Import task ID")),
    responses(
        (status = 200, description = "Import task with progress", body = ImportTaskResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Import task not found")
    ),
    tag = "Import Tasks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_import_task(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<ImportTaskId>,
) -> Result<Json<ImportTaskResponse>, AppError> {
    let task = ImportTaskService::get_import_task(&state.db, id).await?;
    Ok(Json(task.into()))
}

#[utoipa::path(
    post,
    path = "/api/import-tasks/{id}/started",
    params(("id" = Uuid, Path, description = "Import task ID")),
    responses(
        (status = 200, description = "Task is IN_PROGRESS", body = ImportTaskResponse),
        (status = 400, description = "Task already finished"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Import task not found")
    ),
    tag = "Import Tasks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn report_started(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<ImportTaskId>,
) -> Result<Json<ImportTaskResponse>, AppError> {
    let task = AcademicYearOrchestrator::report_import_started(&state.db, id).await?;
    Ok(Json(task.into()))
}

#[utoipa::path(
    post,
    path = "/api/import-tasks/{id}/progress",
    params(("id" = Uuid, Path, description = "Import task ID")),
    request_body = ImportProgressDto,
    responses(
        (status = 200, description = "Counters updated", body = ImportTaskResponse),
        (status = 400, description = "Task already finished"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Import task not found"),
        (status = 422, description = "Validation error")
    ),
    tag = "Import Tasks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn report_progress(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<ImportTaskId>,
    ValidatedJson(dto): ValidatedJson<ImportProgressDto>,
) -> Result<Json<ImportTaskResponse>, AppError> {
    let task = AcademicYearOrchestrator::report_import_progress(&state.db, id, dto).await?;
    Ok(Json(task.into()))
}

/// Complete a task; grade and student imports also complete their setup step
#[utoipa::path(
    post,
    path = "/api/import-tasks/{id}/completed",
    params(("id" = Uuid, Path, description = "Import task ID")),
    responses(
        (status = 200, description = "Task is COMPLETED", body = ImportTaskResponse),
        (status = 400, description = "Task already finished"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Import task not found")
    ),
    tag = "Import Tasks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn report_completed(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<ImportTaskId>,
) -> Result<Json<ImportTaskResponse>, AppError> {
    let task = AcademicYearOrchestrator::report_import_completed(&state.db, id).await?;
    Ok(Json(task.into()))
}

#[utoipa::path(
    post,
    path = "/api/import-tasks/{id}/failed",
    params(("id" = Uuid, Path, description = "Import task ID")),
    request_body = ImportFailedDto,
    responses(
        (status = 200, description = "Task is FAILED", body = ImportTaskResponse),
        (status = 400, description = "Task already finished"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Import task not found")
    ),
    tag = "Import Tasks",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn report_failed(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<ImportTaskId>,
    ValidatedJson(dto): ValidatedJson<ImportFailedDto>,
) -> Result<Json<ImportTaskResponse>, AppError> {
    let task =
        AcademicYearOrchestrator::report_import_failed(&state.db, id, dto.error_details).await?;
    Ok(Json(task.into()))
}
