use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

use super::controller::{add_child, get_children, remove_child};

pub fn init_parents_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/children", get(get_children).post(add_child))
        .route("/{id}/children/{student_id}", delete(remove_child))
}
