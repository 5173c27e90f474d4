use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use schoolyard_core::{AppError, PaginationParams};
use schoolyard_models::{
    CreateSchoolUserDto, PaginatedUsersResponse, SchoolUser, StaffMetrics, UserFilterParams,
    UserId,
};

use crate::modules::users::factory::UserProfileFactory;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a user with the profile their role requires
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateSchoolUserDto,
    responses(
        (status = 201, description = "User created", body = SchoolUser),
        (status = 400, description = "Role has no profile mapping or email already exists"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 422, description = "Validation error")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto), fields(role = %dto.role))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateSchoolUserDto>,
) -> Result<(StatusCode, Json<SchoolUser>), AppError> {
    let user = UserProfileFactory::create_school_user(&state.db, dto.role, dto.user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilterParams, PaginationParams),
    responses(
        (status = 200, description = "Users with roles and profile types", body = PaginatedUsersResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    Query(filters): Query<UserFilterParams>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let users = UserService::get_users(&state.db, filters, pagination).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = SchoolUser),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<SchoolUser>, AppError> {
    let user = UserService::get_school_user(&state.db, id).await?;
    Ok(Json(user))
}

/// Headcount of staff, split into teaching and non-teaching
#[utoipa::path(
    get,
    path = "/api/users/staff-metrics",
    responses(
        (status = 200, description = "Staff metrics", body = StaffMetrics),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_staff_metrics(
    State(state): State<AppState>,
) -> Result<Json<StaffMetrics>, AppError> {
    let metrics = UserService::get_staff_metrics(&state.db).await?;
    Ok(Json(metrics))
}
