//! Users, profiles and the role-aware [`SchoolUser`] view.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use schoolyard_core::PaginationMeta;

use crate::ids::{ProfileId, UserId};
use crate::profile_rules::{ProfileRuleError, ProfileType};
use crate::roles::RoleEnum;
use crate::value_types::{Email, PhoneNumber};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("Role-profile validation failed: {0}")]
    ProfileRules(#[from] ProfileRuleError),
    #[error("User {user} already has a {profile} profile")]
    ProfileExists { user: String, profile: ProfileType },
    #[error("Unsupported role: {0}")]
    UnsupportedRole(RoleEnum),
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("Principal account has already been created.")]
    PrincipalExists,
    #[error("User {0} must have STUDENT role to be added as a child.")]
    ChildNotStudent(String),
    #[error("All children must have STUDENT role. Invalid users: {}", .0.join(", "))]
    InvalidChildren(Vec<String>),
    #[error("User is not a parent")]
    NotAParent,
    #[error("Child is not linked to this parent")]
    ChildNotLinked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<PhoneNumber>,
    pub date_of_birth: Option<NaiveDate>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// `first last`, or the email when both are blank.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.to_string()
        } else {
            full.to_string()
        }
    }

    pub fn short_name(&self) -> String {
        if self.first_name.is_empty() {
            self.email.local_part().to_string()
        } else {
            self.first_name.clone()
        }
    }

    pub fn initials(&self) -> String {
        let first = self.first_name.chars().next();
        let last = self.last_name.chars().next();
        let initials: String = match (first, last) {
            (Some(f), Some(l)) => [f, l].iter().collect(),
            (Some(f), None) => f.to_string(),
            _ => self.email.as_str().chars().take(1).collect(),
        };
        initials.to_uppercase()
    }
}

/// The domain record attached to a user. One per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub profile_type: ProfileType,
    pub address: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user with roles and profile types loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SchoolUser {
    #[serde(flatten)]
    pub user: User,
    /// In the order they were assigned
    pub roles: Vec<RoleEnum>,
    pub profile_types: Vec<ProfileType>,
}

impl SchoolUser {
    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn has_profile(&self, profile: ProfileType) -> bool {
        self.profile_types.contains(&profile)
    }

    pub fn is_parent(&self) -> bool {
        self.has_profile(ProfileType::Parent)
    }

    pub fn is_student(&self) -> bool {
        self.has_profile(ProfileType::Student)
    }

    pub fn is_school_staff(&self) -> bool {
        self.has_profile(ProfileType::SchoolStaff)
    }

    pub fn is_principal(&self) -> bool {
        self.has_role(RoleEnum::Principal) && self.is_school_staff()
    }

    pub fn is_vp(&self) -> bool {
        self.has_role(RoleEnum::VicePrincipal) && self.is_school_staff()
    }

    pub fn is_teacher(&self) -> bool {
        self.has_role(RoleEnum::Teacher) && self.is_school_staff()
    }

    pub fn primary_role(&self) -> Option<RoleEnum> {
        self.roles.first().copied()
    }

    pub fn roles(&self) -> &[RoleEnum] {
        &self.roles
    }

    pub fn has_role(&self, role: RoleEnum) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[RoleEnum]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }

    pub fn has_all_roles(&self, roles: &[RoleEnum]) -> bool {
        roles.iter().all(|r| self.has_role(*r))
    }

    pub fn is_administrator(&self) -> bool {
        self.roles.iter().any(RoleEnum::is_administrator)
    }

    pub fn is_staff_member(&self) -> bool {
        self.has_role(RoleEnum::Admin) || self.roles.iter().any(RoleEnum::is_staff_role)
    }

    pub fn full_name(&self) -> String {
        self.user.full_name()
    }

    pub fn short_name(&self) -> String {
        self.user.short_name()
    }

    pub fn initials(&self) -> String {
        self.user.initials()
    }
}

/// Fields shared by every user creation path.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(max = 150))]
    #[serde(default)]
    pub first_name: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub last_name: String,
    pub email: Email,
    #[validate(length(min = 8))]
    pub password: String,
    pub phone_number: Option<PhoneNumber>,
    pub date_of_birth: Option<NaiveDate>,
    /// Stored on the profile
    pub address: Option<String>,
    /// Stored on the profile
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSchoolUserDto {
    pub role: RoleEnum,
    #[serde(flatten)]
    #[validate(nested)]
    pub user: CreateUserDto,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    /// Only users holding this role
    pub role: Option<RoleEnum>,
    /// Only users holding a staff role
    #[serde(default)]
    pub staff: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<SchoolUser>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StaffMetrics {
    pub total_staff: i64,
    pub teaching_staff: i64,
    pub non_teaching_staff: i64,
}

impl StaffMetrics {
    pub fn new(total_staff: i64, teaching_staff: i64) -> Self {
        Self {
            total_staff,
            teaching_staff,
            non_teaching_staff: total_staff - teaching_staff,
        }
    }
}

fn validate_passwords_match(dto: &PrincipalSetupDto) -> Result<(), ValidationError> {
    if dto.password != dto.confirm_password {
        return Err(ValidationError::new("password_mismatch")
            .with_message(UserError::PasswordMismatch.to_string().into()));
    }
    Ok(())
}

/// First-run form that creates the school's principal.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_passwords_match", skip_on_field_errors = false))]
pub struct PrincipalSetupDto {
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
    pub email: Email,
    #[validate(length(min = 8))]
    pub password: String,
    pub confirm_password: String,
    #[serde(alias = "phone")]
    pub phone_number: Option<PhoneNumber>,
}

impl PrincipalSetupDto {
    pub fn check_passwords(&self) -> Result<(), UserError> {
        validate_passwords_match(self).map_err(|_| UserError::PasswordMismatch)
    }

    pub fn into_user(self) -> CreateUserDto {
        CreateUserDto {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: self.password,
            phone_number: self.phone_number,
            date_of_birth: None,
            address: None,
            attributes: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddChildDto {
    pub student_id: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            email: Email::new("grace.hopper@navy.example").unwrap(),
            first_name: first.into(),
            last_name: last.into(),
            phone_number: None,
            date_of_birth: None,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            is_verified: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn school_user(roles: &[RoleEnum], profiles: &[ProfileType]) -> SchoolUser {
        SchoolUser {
            user: user("Grace", "Hopper"),
            roles: roles.to_vec(),
            profile_types: profiles.to_vec(),
        }
    }

    #[test]
    fn test_names() {
        let u = user("grace", "hopper");
        assert_eq!(u.full_name(), "grace hopper");
        assert_eq!(u.short_name(), "grace");
        assert_eq!(u.initials(), "GH");

        let u = user("", "");
        assert_eq!(u.full_name(), "grace.hopper@navy.example");
        assert_eq!(u.short_name(), "grace.hopper");
        assert_eq!(u.initials(), "G");

        assert_eq!(user("ada", "").initials(), "A");
    }

    #[test]
    fn test_role_predicates_need_staff_profile() {
        let principal = school_user(&[RoleEnum::Principal], &[ProfileType::SchoolStaff]);
        assert!(principal.is_principal());
        assert!(principal.is_administrator());
        assert!(principal.is_staff_member());
        assert!(!principal.is_teacher());

        let no_profile = school_user(&[RoleEnum::Principal], &[]);
        assert!(!no_profile.is_principal());
    }

    #[test]
    fn test_role_queries() {
        let u = school_user(
            &[RoleEnum::Teacher, RoleEnum::Counselor],
            &[ProfileType::SchoolStaff],
        );
        assert_eq!(u.primary_role(), Some(RoleEnum::Teacher));
        assert!(u.is_teacher());
        assert!(u.has_any_role(&[RoleEnum::Nurse, RoleEnum::Counselor]));
        assert!(u.has_all_roles(&[RoleEnum::Teacher, RoleEnum::Counselor]));
        assert!(!u.has_all_roles(&[RoleEnum::Teacher, RoleEnum::Nurse]));
        assert!(!u.is_administrator());

        let parent = school_user(&[RoleEnum::Parent], &[ProfileType::Parent]);
        assert!(parent.is_parent());
        assert!(!parent.is_staff_member());
        assert_eq!(school_user(&[], &[]).primary_role(), None);
    }

    #[test]
    fn test_staff_metrics() {
        let m = StaffMetrics::new(12, 7);
        assert_eq!(m.non_teaching_staff, 5);
    }

    #[test]
    fn test_principal_setup_passwords() {
        let dto: PrincipalSetupDto = serde_json::from_value(serde_json::json!({
            "first_name": "Pat",
            "last_name": "Lee",
            "email": "pat@school.example",
            "password": "password123",
            "confirm_password": "password124",
            "phone": "+14155550100"
        }))
        .unwrap();

        assert!(dto.phone_number.is_some());
        assert_eq!(dto.check_passwords(), Err(UserError::PasswordMismatch));
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_create_school_user_dto_flattens_user() {
        let dto: CreateSchoolUserDto = serde_json::from_value(serde_json::json!({
            "role": "Vice Principal",
            "email": "vp@school.example",
            "password": "password123"
        }))
        .unwrap();
        assert_eq!(dto.role, RoleEnum::VicePrincipal);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_invalid_children_message() {
        let err = UserError::InvalidChildren(vec!["a@x.example".into(), "b@x.example".into()]);
        assert_eq!(
            err.to_string(),
            "All children must have STUDENT role. Invalid users: a@x.example, b@x.example"
        );
    }
}
