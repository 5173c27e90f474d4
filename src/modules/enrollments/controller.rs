use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use schoolyard_core::AppError;
use schoolyard_models::{
    BulkEnrollDto, BulkEnrollResponse, EnrollStudentDto, GradeId, StudentEnrollment,
    TransferStudentDto, UserId,
};

use crate::middleware::role::RequireAdministrator;
use crate::modules::academic_years::orchestrator::AcademicYearOrchestrator;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Enroll a student in a grade
///
/// Returns 200 with the existing enrollment when the student is already in
/// this grade.
#[utoipa::path(
    post,
    path = "/api/grades/{id}/enrollments",
    params(("id" = Uuid, Path, description = "Grade ID")),
    request_body = EnrollStudentDto,
    responses(
        (status = 201, description = "Student enrolled", body = StudentEnrollment),
        (status = 200, description = "Student was already enrolled in this grade", body = StudentEnrollment),
        (status = 400, description = "Not a student, year closed or enrolled in another grade"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Grade or student not found")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto), fields(student_id = %dto.student_id))]
pub async fn enroll_student(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(grade_id): Path<GradeId>,
    ValidatedJson(dto): ValidatedJson<EnrollStudentDto>,
) -> Result<(StatusCode, Json<StudentEnrollment>), AppError> {
    let (enrollment, created) =
        AcademicYearOrchestrator::enroll_student(&state.db, grade_id, dto.student_id).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(enrollment)))
}

/// Enroll several students, reporting per-student failures
#[utoipa::path(
    post,
    path = "/api/grades/{id}/enrollments/bulk",
    params(("id" = Uuid, Path, description = "Grade ID")),
    request_body = BulkEnrollDto,
    responses(
        (status = 200, description = "Enrolled students and failures", body = BulkEnrollResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Grade not found"),
        (status = 422, description = "Validation error")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn bulk_enroll(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path(grade_id): Path<GradeId>,
    ValidatedJson(dto): ValidatedJson<BulkEnrollDto>,
) -> Result<Json<BulkEnrollResponse>, AppError> {
    let result =
        AcademicYearOrchestrator::bulk_enroll_students(&state.db, grade_id, dto.student_ids)
            .await?;
    Ok(Json(result))
}

#[utoipa::path(
    delete,
    path = "/api/grades/{id}/enrollments/{student_id}",
    params(
        ("id" = Uuid, Path, description = "Grade ID"),
        ("student_id" = Uuid, Path, description = "Student user ID")
    ),
    responses(
        (status = 204, description = "Enrollment soft-deleted"),
        (status = 400, description = "Student is not enrolled in this grade"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Grade not found")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn unenroll_student(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Path((grade_id, student_id)): Path<(GradeId, UserId)>,
) -> Result<StatusCode, AppError> {
    AcademicYearOrchestrator::unenroll_student(&state.db, grade_id, student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a student between two grades of the same academic year
#[utoipa::path(
    post,
    path = "/api/enrollments/transfer",
    request_body = TransferStudentDto,
    responses(
        (status = 200, description = "New enrollment", body = StudentEnrollment),
        (status = 400, description = "Different academic years or not enrolled in the source grade"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - administrators only"),
        (status = 404, description = "Grade or student not found")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn transfer_student(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    ValidatedJson(dto): ValidatedJson<TransferStudentDto>,
) -> Result<Json<StudentEnrollment>, AppError> {
    let enrollment = AcademicYearOrchestrator::transfer_student(&state.db, dto).await?;
    Ok(Json(enrollment))
}
