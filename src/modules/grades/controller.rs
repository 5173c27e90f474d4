use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use schoolyard_core::AppError;
use schoolyard_models::{Grade, GradeId, SchoolUser};

use crate::middleware::role::{RequireAdministrator, RequireStaff};
use crate::modules::grades::service::GradeService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/grades/{id}",
    params(("id" = Uuid, Path, description = "Grade ID")),
    responses(
        (status = 200, description = "Grade details", body = Grade),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Grade not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _staff))]
pub async fn get_grade(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Path(id): Path<GradeId>,
) -> Result<Json<Grade>, AppError> {
    let grade = GradeService::get_grade(&state.db, id).await?;
    Ok(Json(grade))
}

/// Soft-delete a grade and its enrollments
#[utoipa::path(
    delete,
    path = "/api/grades/{id}",
    params(("id" = Uuid, Path, description = "Grade ID")),
    responses(
        (status = 204, description = "Grade soft-deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Grade not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_grade(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<GradeId>,
) -> Result<StatusCode, AppError> {
    GradeService::delete_grade(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/grades/{id}/restore",
    params(("id" = Uuid, Path, description = "Grade ID")),
    responses(
        (status = 200, description = "Grade restored", body = Grade),
        (status = 400, description = "A live duplicate exists"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Deleted grade not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn restore_grade(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(id): Path<GradeId>,
) -> Result<Json<Grade>, AppError> {
    let grade = GradeService::restore_grade(&state.db, id).await?;
    Ok(Json(grade))
}

#[utoipa::path(
    get,
    path = "/api/grades/{id}/students",
    params(("id" = Uuid, Path, description = "Grade ID")),
    responses(
        (status = 200, description = "Students enrolled in the grade", body = Vec<SchoolUser>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Grade not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _staff))]
pub async fn get_students(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Path(id): Path<GradeId>,
) -> Result<Json<Vec<SchoolUser>>, AppError> {
    let students = GradeService::get_students_in_grade(&state.db, id).await?;
    Ok(Json(students))
}
