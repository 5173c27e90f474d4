use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{get_school_config, setup_principal};

pub fn init_school_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_school_config))
        .route("/principal", post(setup_principal))
}
