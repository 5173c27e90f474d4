//! # Schoolyard Models
//!
//! Domain types, rules and DTOs shared by the API server and the CLI.
//!
//! Everything in here is pure: validation, lifecycle transitions and the
//! role/profile rules never touch the database. Services in the server
//! crate load rows, call these methods and persist the result.
//!
//! # Modules
//!
//! - [`roles`] / [`profile_rules`]: which profile each role requires
//! - [`academic_years`] / [`academic_setup`]: year lifecycle and setup checklist
//! - [`grades`] / [`enrollments`]: classes and student placement
//! - [`import_tasks`]: bulk import progress tracking
//! - [`users`]: users, profiles and the role-aware [`SchoolUser`]

pub mod academic_setup;
pub mod academic_years;
pub mod auth;
pub mod enrollments;
pub mod grades;
pub mod ids;
pub mod import_tasks;
pub mod profile_rules;
pub mod roles;
mod text_enum;
pub mod users;
pub mod value_types;

pub use academic_setup::{
    AcademicYearSetup, ImportMethod, MarkStepCompleteDto, REQUIRED_STEPS, SetupError,
    SetupProgressResponse, SetupStep,
};
pub use academic_years::{
    AcademicYear, AcademicYearDetail, AcademicYearError, AcademicYearFilterParams,
    AcademicYearStatus, CreateAcademicYearDto, DeploymentType, PaginatedAcademicYearsResponse,
};
pub use auth::{LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest, TokenPair};
pub use enrollments::{
    BulkEnrollDto, BulkEnrollFailure, BulkEnrollResponse, EnrollStudentDto, EnrollmentError,
    StudentEnrollment, TransferStudentDto,
};
pub use grades::{BulkCreateGradesDto, CreateGradeDto, Grade, GradeError, GradeFilterParams};
pub use ids::{
    AcademicYearId, AcademicYearSetupId, EnrollmentId, GradeId, ImportTaskId, ProfileId, UserId,
};
pub use import_tasks::{
    CreateImportTaskDto, ImportFailedDto, ImportProgressDto, ImportTask, ImportTaskResponse,
    ImportTaskStatus, ImportTaskType,
};
pub use profile_rules::{ProfileCombination, ProfileRuleError, ProfileType};
pub use roles::RoleEnum;
pub use text_enum::UnknownVariant;
pub use users::{
    AddChildDto, CreateSchoolUserDto, CreateUserDto, PaginatedUsersResponse, PrincipalSetupDto,
    Profile, SchoolUser, StaffMetrics, User, UserError, UserFilterParams,
};
pub use value_types::{Email, PhoneNumber, ValueTypeError};
