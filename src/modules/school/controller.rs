use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use schoolyard_config::SchoolConfig;
use schoolyard_core::AppError;
use schoolyard_models::{PrincipalSetupDto, SchoolUser};

use crate::modules::school::service::SchoolService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/school",
    responses((status = 200, description = "School identity and attributes", body = SchoolConfig)),
    tag = "School"
)]
#[instrument(skip(state))]
pub async fn get_school_config(State(state): State<AppState>) -> Json<SchoolConfig> {
    Json(state.school_config.as_ref().clone())
}

/// First-run setup: create the principal account
#[utoipa::path(
    post,
    path = "/api/school/principal",
    request_body = PrincipalSetupDto,
    responses(
        (status = 201, description = "Principal created", body = SchoolUser),
        (status = 400, description = "A principal already exists or email is taken"),
        (status = 422, description = "Validation error, including mismatched passwords")
    ),
    tag = "School"
)]
#[instrument(skip(state, dto))]
pub async fn setup_principal(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<PrincipalSetupDto>,
) -> Result<(StatusCode, Json<SchoolUser>), AppError> {
    let principal = SchoolService::setup_principal(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(principal)))
}
