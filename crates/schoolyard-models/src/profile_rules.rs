//! Role/profile consistency rules.
//!
//! Every role except `Admin` requires exactly one profile type, and a user
//! may currently hold only one profile type. The allowed combinations live
//! in a single table ([`allowed_profile_combinations`]) so that widening the
//! policy (e.g. letting a teacher also hold a counselor profile) is a data
//! change rather than a code change.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::roles::RoleEnum;
use crate::text_enum::text_enum;

text_enum! {
    /// The kind of profile record attached to a user.
    ProfileType {
        Parent => "Parent",
        Student => "Student",
        SchoolStaff => "SchoolStaff",
    }
}

/// Formats a set as `{A, B}` for error messages.
struct SetDisplay<'a>(&'a BTreeSet<ProfileType>);

impl fmt::Display for SetDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<&str> = self.0.iter().map(ProfileType::as_str).collect();
        write!(f, "{{{}}}", items.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileRuleError {
    #[error("Role {0} has no profile mapping")]
    NoProfileMapping(RoleEnum),
    #[error("User must have at least one role")]
    NoRoles,
    #[error("User must have at least one profile")]
    NoProfiles,
    #[error("Missing required profiles: {}", SetDisplay(.0))]
    MissingProfiles(BTreeSet<ProfileType>),
    #[error("User has unauthorized profiles: {}", SetDisplay(.0))]
    UnauthorizedProfiles(BTreeSet<ProfileType>),
    #[error("Profile combination not allowed: {}", SetDisplay(.0))]
    CombinationNotAllowed(BTreeSet<ProfileType>),
    #[error("Profile combination must have at least one profile type")]
    EmptyCombination,
}

/// A non-empty set of profile types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileCombination {
    profiles: BTreeSet<ProfileType>,
}

impl ProfileCombination {
    pub fn new(profiles: BTreeSet<ProfileType>) -> Result<Self, ProfileRuleError> {
        if profiles.is_empty() {
            return Err(ProfileRuleError::EmptyCombination);
        }
        Ok(Self { profiles })
    }

    pub fn single(profile: ProfileType) -> Self {
        Self {
            profiles: BTreeSet::from([profile]),
        }
    }

    pub fn dual(first: ProfileType, second: ProfileType) -> Self {
        Self {
            profiles: BTreeSet::from([first, second]),
        }
    }

    pub fn profiles(&self) -> &BTreeSet<ProfileType> {
        &self.profiles
    }

    pub fn contains(&self, profile: ProfileType) -> bool {
        self.profiles.contains(&profile)
    }

    /// True when `existing ∪ self` is one of the allowed combinations.
    pub fn is_compatible_with(&self, existing: &BTreeSet<ProfileType>) -> bool {
        let combined: BTreeSet<ProfileType> = existing.union(&self.profiles).copied().collect();
        allowed_profile_combinations()
            .iter()
            .any(|allowed| allowed.profiles == combined)
    }
}

pub fn allowed_profile_combinations() -> Vec<ProfileCombination> {
    vec![
        ProfileCombination::single(ProfileType::Parent),
        ProfileCombination::single(ProfileType::Student),
        ProfileCombination::single(ProfileType::SchoolStaff),
    ]
}

/// Roles that may eventually hold a second profile alongside their own.
pub const MULTI_PROFILE_CAPABLE_ROLES: [RoleEnum; 3] =
    [RoleEnum::Teacher, RoleEnum::Counselor, RoleEnum::Staff];

/// The profile type a role requires, or `None` for `Admin`.
pub const fn role_profile(role: RoleEnum) -> Option<ProfileType> {
    match role {
        RoleEnum::Principal
        | RoleEnum::VicePrincipal
        | RoleEnum::Teacher
        | RoleEnum::Staff
        | RoleEnum::Librarian
        | RoleEnum::Accountant
        | RoleEnum::Counselor
        | RoleEnum::Nurse
        | RoleEnum::Receptionist => Some(ProfileType::SchoolStaff),
        RoleEnum::Student => Some(ProfileType::Student),
        RoleEnum::Parent => Some(ProfileType::Parent),
        RoleEnum::Admin => None,
    }
}

pub fn get_required_profile_type(role: RoleEnum) -> Result<ProfileType, ProfileRuleError> {
    role_profile(role).ok_or(ProfileRuleError::NoProfileMapping(role))
}

pub fn can_have_multiple_profiles(role: RoleEnum) -> bool {
    MULTI_PROFILE_CAPABLE_ROLES.contains(&role)
}

/// One profile type per user for now; an empty set is never valid.
pub fn validate_profile_combination(profile_types: &BTreeSet<ProfileType>) -> bool {
    profile_types.len() == 1
}

pub fn get_allowed_additional_profiles(
    existing: &BTreeSet<ProfileType>,
    role: RoleEnum,
) -> Result<BTreeSet<ProfileType>, ProfileRuleError> {
    if !can_have_multiple_profiles(role) {
        return Ok(BTreeSet::new());
    }

    let required = get_required_profile_type(role)?;
    if existing.contains(&required) {
        return Ok(BTreeSet::new());
    }

    Ok(BTreeSet::from([required]))
}

/// Checks that `profile_types` is exactly what `roles` require.
///
/// Failures are reported in a fixed order: no roles, no profiles, an
/// unmapped role, missing profiles, extra profiles, disallowed combination.
pub fn validate_role_profile_consistency(
    roles: &BTreeSet<RoleEnum>,
    profile_types: &BTreeSet<ProfileType>,
) -> Result<(), ProfileRuleError> {
    if roles.is_empty() {
        return Err(ProfileRuleError::NoRoles);
    }
    if profile_types.is_empty() {
        return Err(ProfileRuleError::NoProfiles);
    }

    let required = roles
        .iter()
        .map(|role| get_required_profile_type(*role))
        .collect::<Result<BTreeSet<_>, _>>()?;

    let missing: BTreeSet<ProfileType> = required.difference(profile_types).copied().collect();
    if !missing.is_empty() {
        return Err(ProfileRuleError::MissingProfiles(missing));
    }

    let extra: BTreeSet<ProfileType> = profile_types.difference(&required).copied().collect();
    if !extra.is_empty() {
        return Err(ProfileRuleError::UnauthorizedProfiles(extra));
    }

    if !validate_profile_combination(profile_types) {
        return Err(ProfileRuleError::CombinationNotAllowed(
            profile_types.clone(),
        ));
    }

    Ok(())
}
