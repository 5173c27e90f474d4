use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::modules::enrollments::controller::{bulk_enroll, enroll_student, unenroll_student};
use crate::state::AppState;

use super::controller::{delete_grade, get_grade, get_students, restore_grade};

pub fn init_grades_router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_grade).delete(delete_grade))
        .route("/{id}/restore", post(restore_grade))
        .route("/{id}/students", get(get_students))
        .route("/{id}/enrollments", post(enroll_student))
        .route("/{id}/enrollments/bulk", post(bulk_enroll))
        .route("/{id}/enrollments/{student_id}", delete(unenroll_student))
}
