use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use schoolyard_auth::verify_token;
use schoolyard_core::AppError;
use schoolyard_models::{SchoolUser, UserId};

use crate::middleware::auth::bearer_token;
use crate::modules::users::service::UserService;
use crate::state::AppState;

/// The caller as resolved by [`attach_school_user`]; `None` for anonymous
/// or unresolvable callers.
#[derive(Debug, Clone)]
pub struct ResolvedUser(pub Option<SchoolUser>);

async fn resolve(state: &AppState, token: Option<String>) -> Option<SchoolUser> {
    let claims = verify_token(&token?, &state.jwt_config).ok()?;
    let user_id: UserId = claims.sub.parse().ok()?;

    match UserService::find_school_user(&state.db, user_id).await {
        Ok(Some(user)) if user.user.is_active => Some(user),
        Ok(_) => {
            debug!(%user_id, "Token subject is missing or inactive");
            None
        }
        Err(e) => {
            warn!(%user_id, error = %e.message(), "Failed to load school user");
            None
        }
    }
}

/// Attaches a [`ResolvedUser`] to the request. Never rejects.
pub async fn attach_school_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.extensions().get::<ResolvedUser>().is_none() {
        let token = bearer_token(req.headers()).ok().map(str::to_owned);
        let user = resolve(&state, token).await;
        req.extensions_mut().insert(ResolvedUser(user));
    }

    next.run(req).await
}

/// Extractor for handlers that need a signed-in user but no particular role.
#[derive(Debug, Clone)]
pub struct CurrentSchoolUser(pub SchoolUser);

pub(crate) fn resolved_user(parts: &Parts) -> Result<SchoolUser, AppError> {
    parts
        .extensions
        .get::<ResolvedUser>()
        .and_then(|resolved| resolved.0.clone())
        .ok_or_else(|| AppError::unauthorized(anyhow!("Authentication required")))
}

impl<S> FromRequestParts<S> for CurrentSchoolUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        resolved_user(parts).map(CurrentSchoolUser)
    }
}
