use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use schoolyard_config::{AttributeType, SchoolAttribute, SchoolConfig};
use schoolyard_core::{PaginationMeta, PaginationParams};
use schoolyard_models::{
    AcademicYear, AcademicYearDetail, AcademicYearSetup, AcademicYearStatus, AddChildDto,
    BulkCreateGradesDto, BulkEnrollDto, BulkEnrollFailure, BulkEnrollResponse,
    CreateAcademicYearDto, CreateGradeDto, CreateImportTaskDto, CreateSchoolUserDto,
    CreateUserDto, DeploymentType, EnrollStudentDto, Grade, ImportFailedDto, ImportMethod,
    ImportProgressDto, ImportTask, ImportTaskResponse, ImportTaskStatus, ImportTaskType,
    LoginRequest, LoginResponse, MarkStepCompleteDto, MessageResponse,
    PaginatedAcademicYearsResponse, PaginatedUsersResponse, PrincipalSetupDto, ProfileType,
    RefreshTokenRequest, RoleEnum, SchoolUser, SetupProgressResponse, SetupStep, StaffMetrics,
    StudentEnrollment, TokenPair, TransferStudentDto, User,
};

use crate::modules::auth::controller::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::get_me,
        crate::modules::school::controller::get_school_config,
        crate::modules::school::controller::setup_principal,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::get_staff_metrics,
        crate::modules::parents::controller::get_children,
        crate::modules::parents::controller::add_child,
        crate::modules::parents::controller::remove_child,
        crate::modules::academic_years::controller::create_academic_year,
        crate::modules::academic_years::controller::get_academic_years,
        crate::modules::academic_years::controller::get_active_academic_year,
        crate::modules::academic_years::controller::get_academic_year,
        crate::modules::academic_years::controller::delete_academic_year,
        crate::modules::academic_years::controller::restore_academic_year,
        crate::modules::academic_years::controller::start_enrollment,
        crate::modules::academic_years::controller::activate,
        crate::modules::academic_years::controller::complete,
        crate::modules::academic_years::controller::get_setup_progress,
        crate::modules::academic_years::controller::get_required_steps,
        crate::modules::academic_years::controller::mark_step_complete,
        crate::modules::academic_years::controller::create_grade,
        crate::modules::academic_years::controller::bulk_create_grades,
        crate::modules::academic_years::controller::get_grades,
        crate::modules::academic_years::controller::get_student_enrollment,
        crate::modules::academic_years::controller::create_import_task,
        crate::modules::academic_years::controller::get_import_tasks,
        crate::modules::grades::controller::get_grade,
        crate::modules::grades::controller::delete_grade,
        crate::modules::grades::controller::restore_grade,
        crate::modules::grades::controller::get_students,
        crate::modules::enrollments::controller::enroll_student,
        crate::modules::enrollments::controller::bulk_enroll,
        crate::modules::enrollments::controller::unenroll_student,
        crate::modules::enrollments::controller::transfer_student,
        crate::modules::import_tasks::controller::get_import_task,
        crate::modules::import_tasks::controller::report_started,
        crate::modules::import_tasks::controller::report_progress,
        crate::modules::import_tasks::controller::report_completed,
        crate::modules::import_tasks::controller::report_failed,
    ),
    components(
        schemas(
            User,
            SchoolUser,
            RoleEnum,
            ProfileType,
            CreateUserDto,
            CreateSchoolUserDto,
            PrincipalSetupDto,
            AddChildDto,
            StaffMetrics,
            PaginatedUsersResponse,
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            TokenPair,
            MessageResponse,
            ErrorResponse,
            SchoolConfig,
            SchoolAttribute,
            AttributeType,
            AcademicYear,
            AcademicYearStatus,
            DeploymentType,
            AcademicYearDetail,
            AcademicYearSetup,
            SetupStep,
            ImportMethod,
            SetupProgressResponse,
            MarkStepCompleteDto,
            CreateAcademicYearDto,
            PaginatedAcademicYearsResponse,
            Grade,
            CreateGradeDto,
            BulkCreateGradesDto,
            StudentEnrollment,
            EnrollStudentDto,
            BulkEnrollDto,
            BulkEnrollFailure,
            BulkEnrollResponse,
            TransferStudentDto,
            ImportTask,
            ImportTaskType,
            ImportTaskStatus,
            ImportTaskResponse,
            CreateImportTaskDto,
            ImportProgressDto,
            ImportFailedDto,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, token refresh and current user"),
        (name = "School", description = "School identity and first-run principal setup"),
        (name = "Users", description = "School users, roles and profiles"),
        (name = "Parents", description = "Parent/child links"),
        (name = "Academic Years", description = "Academic year lifecycle and setup checklist"),
        (name = "Grades", description = "Grades within an academic year"),
        (name = "Enrollments", description = "Student placement in grades"),
        (name = "Import Tasks", description = "Bulk import progress reporting"),
    ),
    info(
        title = "Schoolyard API",
        version = "0.1.0",
        description = "School management API: users and profiles, academic years, grades and enrollments",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
