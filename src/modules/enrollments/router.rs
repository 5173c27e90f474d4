use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::transfer_student;

/// Grade-scoped enrollment routes live on the grades router.
pub fn init_enrollments_router() -> Router<AppState> {
    Router::new().route("/transfer", post(transfer_student))
}
