use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    activate, bulk_create_grades, complete, create_academic_year, create_grade,
    create_import_task, delete_academic_year, get_academic_year, get_academic_years,
    get_active_academic_year, get_grades, get_import_tasks, get_required_steps,
    get_setup_progress, get_student_enrollment, mark_step_complete, restore_academic_year,
    start_enrollment,
};

pub fn init_academic_years_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_academic_years).post(create_academic_year))
        .route("/active", get(get_active_academic_year))
        .route("/{id}", get(get_academic_year).delete(delete_academic_year))
        .route("/{id}/restore", post(restore_academic_year))
        .route("/{id}/start-enrollment", post(start_enrollment))
        .route("/{id}/activate", post(activate))
        .route("/{id}/complete", post(complete))
        .route("/{id}/setup", get(get_setup_progress))
        .route("/{id}/setup/steps", get(get_required_steps))
        .route("/{id}/setup/steps/{step}", post(mark_step_complete))
        .route("/{id}/grades", get(get_grades).post(create_grade))
        .route("/{id}/grades/bulk", post(bulk_create_grades))
        .route(
            "/{id}/students/{student_id}/enrollment",
            get(get_student_enrollment),
        )
        .route(
            "/{id}/import-tasks",
            get(get_import_tasks).post(create_import_task),
        )
}
