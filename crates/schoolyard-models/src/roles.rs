//! School roles.
//!
//! A role is what a user *does* (teach, enroll, administer); the profile
//! type in [`crate::profile_rules`] is what kind of record they *are*.
//! Roles are persisted in `user_roles.role` as their display text.

use crate::text_enum::text_enum;

text_enum! {
    /// Every role a school user can hold.
    RoleEnum {
        Admin => "Admin",
        Principal => "Principal",
        VicePrincipal => "Vice Principal",
        Teacher => "Teacher",
        Staff => "Staff",
        Librarian => "Librarian",
        Accountant => "Accountant",
        Counselor => "Counselor",
        Nurse => "Nurse",
        Receptionist => "Receptionist",
        Student => "Student",
        Parent => "Parent",
    }
}

impl RoleEnum {
    /// All roles, in declaration order.
    pub fn to_list() -> Vec<RoleEnum> {
        Self::ALL.to_vec()
    }

    /// Everyone employed by the school, excluding the platform admin.
    pub fn staff_roles() -> Vec<RoleEnum> {
        Self::ALL
            .iter()
            .copied()
            .filter(|role| role.is_staff_role())
            .collect()
    }

    pub fn regular_roles() -> Vec<RoleEnum> {
        vec![RoleEnum::Parent, RoleEnum::Student]
    }

    pub fn is_staff_role(&self) -> bool {
        !matches!(self, RoleEnum::Student | RoleEnum::Parent | RoleEnum::Admin)
    }

    /// Roles allowed to manage academic years, grades and users.
    pub fn is_administrator(&self) -> bool {
        matches!(
            self,
            RoleEnum::Admin | RoleEnum::Principal | RoleEnum::VicePrincipal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_values() {
        assert_eq!(RoleEnum::VicePrincipal.as_str(), "Vice Principal");
        assert_eq!(RoleEnum::Accountant.as_str(), "Accountant");
        assert_eq!(RoleEnum::Counselor.as_str(), "Counselor");
        assert_eq!(RoleEnum::Receptionist.as_str(), "Receptionist");
        assert_eq!(
            "Vice Principal".parse::<RoleEnum>().unwrap(),
            RoleEnum::VicePrincipal
        );
    }

    #[test]
    fn test_to_list_has_every_role() {
        let roles = RoleEnum::to_list();
        assert_eq!(roles.len(), 12);
        assert_eq!(roles.first(), Some(&RoleEnum::Admin));
        assert_eq!(roles.last(), Some(&RoleEnum::Parent));
    }

    #[test]
    fn test_staff_roles_exclude_students_parents_and_admin() {
        let staff = RoleEnum::staff_roles();
        assert_eq!(staff.len(), 9);
        assert!(!staff.contains(&RoleEnum::Admin));
        assert!(!staff.contains(&RoleEnum::Student));
        assert!(!staff.contains(&RoleEnum::Parent));
        assert!(staff.contains(&RoleEnum::Principal));
        assert!(staff.contains(&RoleEnum::Nurse));
    }

    #[test]
    fn test_regular_roles() {
        assert_eq!(
            RoleEnum::regular_roles(),
            vec![RoleEnum::Parent, RoleEnum::Student]
        );
    }

    #[test]
    fn test_administrators() {
        let admins: Vec<_> = RoleEnum::ALL
            .iter()
            .filter(|r| r.is_administrator())
            .collect();
        assert_eq!(
            admins,
            vec![
                &RoleEnum::Admin,
                &RoleEnum::Principal,
                &RoleEnum::VicePrincipal
            ]
        );
    }
}
