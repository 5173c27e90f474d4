//! Academic years and their lifecycle.
//!
//! A year moves `SETUP → ENROLLMENT → ACTIVE → COMPLETED` (fresh start) or
//! `SETUP → ACTIVE → COMPLETED` (mid-year adoption). The transition rules
//! live here as pure methods on [`AcademicYear`]; persisting the result is
//! the orchestrator's job.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use schoolyard_core::PaginationMeta;

use crate::academic_setup::AcademicYearSetup;
use crate::ids::AcademicYearId;
use crate::text_enum::text_enum;

pub const ACADEMIC_YEAR_NAME_MAX_LEN: usize = 32;

text_enum! {
    AcademicYearStatus {
        Setup => "SETUP",
        Enrollment => "ENROLLMENT",
        Active => "ACTIVE",
        Completed => "COMPLETED",
    }
}

impl AcademicYearStatus {
    /// Human-readable label used in error messages.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Setup => "Setup Phase",
            Self::Enrollment => "Enrollment Phase",
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

impl Default for AcademicYearStatus {
    fn default() -> Self {
        Self::Setup
    }
}

text_enum! {
    /// How the school started using the system for this year.
    DeploymentType {
        /// Onboarded before the year starts; goes through enrollment.
        FreshStart => "FRESH_START",
        /// Adopted mid-year with students already placed.
        MidYear => "MID_YEAR",
    }
}

impl Default for DeploymentType {
    fn default() -> Self {
        Self::FreshStart
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcademicYearError {
    #[error("Name cannot be blank.")]
    BlankName,
    #[error("Name must be at most 32 characters.")]
    NameTooLong,
    #[error("Start date must be before end date.")]
    StartNotBeforeEnd,
    #[error("Both enrollment start and end dates must be set.")]
    EnrollmentDatesIncomplete,
    #[error("Enrollment period must be within academic year dates.")]
    EnrollmentOutsideYear,
    #[error("Mid-year adoption should not have an enrollment phase.")]
    MidYearEnrollment,
    #[error("setup_completed must be true when status is not SETUP.")]
    SetupFlagNotSet,
    #[error("Cannot be in SETUP status when setup is already completed.")]
    SetupAlreadyCompleted,
    #[error("Cannot transition to {to} from {}", .from.label())]
    InvalidTransition {
        to: AcademicYearStatus,
        from: AcademicYearStatus,
    },
    #[error("Setup must be complete before transitioning to {0}")]
    SetupIncomplete(AcademicYearStatus),
    #[error("Mid-year deployment should transition directly to ACTIVE")]
    MidYearSkipsEnrollment,
    #[error("Fresh start must go through ENROLLMENT phase")]
    FreshStartNeedsEnrollment,
    #[error("Only fresh start should have ENROLLMENT phase")]
    EnrollmentOnlyForFreshStart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub status: AcademicYearStatus,
    pub deployment_type: DeploymentType,
    pub setup_completed: bool,
    pub enrollment_start_date: Option<NaiveDate>,
    pub enrollment_end_date: Option<NaiveDate>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AcademicYear {
    /// A fresh year in SETUP, not yet persisted.
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        deployment_type: DeploymentType,
        enrollment_start_date: Option<NaiveDate>,
        enrollment_end_date: Option<NaiveDate>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AcademicYearId::new(),
            name: name.into(),
            start_date,
            end_date,
            is_active: true,
            status: AcademicYearStatus::Setup,
            deployment_type,
            setup_completed: false,
            enrollment_start_date,
            enrollment_end_date,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Field and cross-field invariants, checked before every write.
    pub fn validate(&self) -> Result<(), AcademicYearError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AcademicYearError::BlankName);
        }
        if name.chars().count() > ACADEMIC_YEAR_NAME_MAX_LEN {
            return Err(AcademicYearError::NameTooLong);
        }

        if self.start_date >= self.end_date {
            return Err(AcademicYearError::StartNotBeforeEnd);
        }

        match (self.enrollment_start_date, self.enrollment_end_date) {
            (None, None) => {}
            (Some(start), Some(end)) => {
                let within = self.start_date <= start && start < end && end <= self.end_date;
                if !within {
                    return Err(AcademicYearError::EnrollmentOutsideYear);
                }
            }
            _ => return Err(AcademicYearError::EnrollmentDatesIncomplete),
        }

        if self.deployment_type == DeploymentType::MidYear
            && self.status == AcademicYearStatus::Enrollment
        {
            return Err(AcademicYearError::MidYearEnrollment);
        }

        match (self.status, self.setup_completed) {
            (AcademicYearStatus::Setup, true) => Err(AcademicYearError::SetupAlreadyCompleted),
            (status, false) if status != AcademicYearStatus::Setup => {
                Err(AcademicYearError::SetupFlagNotSet)
            }
            _ => Ok(()),
        }
    }

    pub fn is_in_setup(&self) -> bool {
        self.status == AcademicYearStatus::Setup
    }

    pub fn is_in_enrollment(&self) -> bool {
        self.status == AcademicYearStatus::Enrollment
    }

    /// Any status before COMPLETED.
    pub fn is_active_year(&self) -> bool {
        self.status != AcademicYearStatus::Completed
    }

    pub fn can_accept_grades(&self) -> bool {
        matches!(
            self.status,
            AcademicYearStatus::Setup | AcademicYearStatus::Enrollment
        )
    }

    pub fn can_accept_enrollments(&self) -> bool {
        self.is_active_year()
    }

    /// SETUP → ENROLLMENT, fresh start only.
    pub fn transition_to_enrollment(&mut self, setup_complete: bool) -> Result<(), AcademicYearError> {
        if self.status != AcademicYearStatus::Setup {
            return Err(AcademicYearError::InvalidTransition {
                to: AcademicYearStatus::Enrollment,
                from: self.status,
            });
        }
        if !setup_complete {
            return Err(AcademicYearError::SetupIncomplete(
                AcademicYearStatus::Enrollment,
            ));
        }
        if self.deployment_type == DeploymentType::MidYear {
            return Err(AcademicYearError::MidYearSkipsEnrollment);
        }

        self.status = AcademicYearStatus::Enrollment;
        self.setup_completed = true;
        Ok(())
    }

    /// SETUP → ACTIVE (mid-year) or ENROLLMENT → ACTIVE (fresh start).
    ///
    /// Returns `Ok(false)` when the year is already active.
    pub fn transition_to_active(&mut self, setup_complete: bool) -> Result<bool, AcademicYearError> {
        match self.status {
            AcademicYearStatus::Setup => {
                if self.deployment_type != DeploymentType::MidYear {
                    return Err(AcademicYearError::FreshStartNeedsEnrollment);
                }
                if !setup_complete {
                    return Err(AcademicYearError::SetupIncomplete(
                        AcademicYearStatus::Active,
                    ));
                }
            }
            AcademicYearStatus::Enrollment => {
                if self.deployment_type != DeploymentType::FreshStart {
                    return Err(AcademicYearError::EnrollmentOnlyForFreshStart);
                }
            }
            AcademicYearStatus::Active => return Ok(false),
            AcademicYearStatus::Completed => {
                return Err(AcademicYearError::InvalidTransition {
                    to: AcademicYearStatus::Active,
                    from: self.status,
                });
            }
        }

        self.status = AcademicYearStatus::Active;
        self.setup_completed = true;
        Ok(true)
    }

    /// Any status → COMPLETED. Returns `false` when already completed.
    pub fn transition_to_completed(&mut self) -> bool {
        if self.status == AcademicYearStatus::Completed {
            return false;
        }

        self.status = AcademicYearStatus::Completed;
        self.is_active = false;
        // A year closed straight from SETUP still leaves setup behind it.
        self.setup_completed = true;
        true
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAcademicYearDto {
    #[validate(length(min = 1, max = 32))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub deployment_type: DeploymentType,
    pub enrollment_start_date: Option<NaiveDate>,
    pub enrollment_end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AcademicYearFilterParams {
    pub status: Option<AcademicYearStatus>,
    pub deployment_type: Option<DeploymentType>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedAcademicYearsResponse {
    pub data: Vec<AcademicYear>,
    pub meta: PaginationMeta,
}

/// A year together with its setup checklist.
#[derive(Debug, Serialize, ToSchema)]
pub struct AcademicYearDetail {
    #[serde(flatten)]
    pub academic_year: AcademicYear,
    pub setup: Option<AcademicYearSetup>,
    pub completion_percentage: f64,
}
