//! Configuration for seeding runs.

use schoolyard_models::RoleEnum;

/// Seed data for creating a user.
pub struct UserSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: RoleEnum,
}

/// Staff accounts to create, by role.
#[derive(Clone)]
pub struct StaffCounts {
    pub teachers: usize,
    pub staff: usize,
}

impl Default for StaffCounts {
    fn default() -> Self {
        Self {
            teachers: 8,
            staff: 3,
        }
    }
}

/// Complete configuration for database seeding.
#[derive(Clone)]
pub struct SeedConfig {
    pub staff: StaffCounts,
    pub students: usize,
    /// Parents are linked to students round-robin.
    pub parents: usize,
    /// Grade levels `1..=grades` in the seeded academic year.
    pub grades: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            staff: StaffCounts::default(),
            students: 120,
            parents: 60,
            grades: 6,
        }
    }
}

impl SeedConfig {
    pub fn with_staff(mut self, staff: StaffCounts) -> Self {
        self.staff = staff;
        self
    }

    pub fn with_students(mut self, students: usize) -> Self {
        self.students = students;
        self
    }

    pub fn with_parents(mut self, parents: usize) -> Self {
        self.parents = parents;
        self
    }

    pub fn with_grades(mut self, grades: usize) -> Self {
        self.grades = grades;
        self
    }

    pub fn total_users(&self) -> usize {
        self.staff.teachers + self.staff.staff + self.students + self.parents
    }
}
