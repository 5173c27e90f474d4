use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::role::require_administrator;
use crate::middleware::school_user::attach_school_user;
use crate::modules::academic_years::init_academic_years_router;
use crate::modules::auth::init_auth_router;
use crate::modules::enrollments::init_enrollments_router;
use crate::modules::grades::init_grades_router;
use crate::modules::import_tasks::init_import_tasks_router;
use crate::modules::parents::init_parents_router;
use crate::modules::school::init_school_router;
use crate::modules::users::init_users_router;
use crate::state::AppState;

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router())
                .nest("/school", init_school_router())
                .nest(
                    "/users",
                    init_users_router().route_layer(middleware::from_fn(require_administrator)),
                )
                .nest(
                    "/parents",
                    init_parents_router().route_layer(middleware::from_fn(require_administrator)),
                )
                // Mixed read/write guards are applied per handler.
                .nest("/academic-years", init_academic_years_router())
                .nest("/grades", init_grades_router())
                .nest("/enrollments", init_enrollments_router())
                .nest("/import-tasks", init_import_tasks_router()),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            attach_school_user,
        ))
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
