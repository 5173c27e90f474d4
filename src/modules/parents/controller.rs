use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use schoolyard_core::AppError;
use schoolyard_models::{AddChildDto, SchoolUser, UserId};

use crate::modules::parents::service::ParentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/parents/{id}/children",
    params(("id" = Uuid, Path, description = "Parent user ID")),
    responses(
        (status = 200, description = "Children holding the Student role", body = Vec<SchoolUser>),
        (status = 400, description = "User is not a parent"),
        (status = 404, description = "Parent not found")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_children(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<SchoolUser>>, AppError> {
    let children = ParentService::get_validated_children(&state.db, id).await?;
    Ok(Json(children))
}

#[utoipa::path(
    post,
    path = "/api/parents/{id}/children",
    params(("id" = Uuid, Path, description = "Parent user ID")),
    request_body = AddChildDto,
    responses(
        (status = 201, description = "Child linked", body = SchoolUser),
        (status = 400, description = "User is not a parent or child is not a student"),
        (status = 404, description = "Parent or student not found")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn add_child(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<AddChildDto>,
) -> Result<(StatusCode, Json<SchoolUser>), AppError> {
    let child = ParentService::add_child_with_validation(&state.db, id, dto.student_id).await?;
    Ok((StatusCode::CREATED, Json(child)))
}

#[utoipa::path(
    delete,
    path = "/api/parents/{id}/children/{student_id}",
    params(
        ("id" = Uuid, Path, description = "Parent user ID"),
        ("student_id" = Uuid, Path, description = "Student user ID")
    ),
    responses(
        (status = 204, description = "Child unlinked"),
        (status = 404, description = "Child is not linked to this parent")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn remove_child(
    State(state): State<AppState>,
    Path((id, student_id)): Path<(UserId, UserId)>,
) -> Result<StatusCode, AppError> {
    ParentService::remove_child(&state.db, id, student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
