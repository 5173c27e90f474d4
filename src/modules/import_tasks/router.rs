use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    get_import_task, report_completed, report_failed, report_progress, report_started,
};

pub fn init_import_tasks_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_import_task))
        .route("/{id}/started", post(report_started))
        .route("/{id}/progress", post(report_progress))
        .route("/{id}/completed", post(report_completed))
        .route("/{id}/failed", post(report_failed))
}
