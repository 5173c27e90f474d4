pub mod academic_years;
pub mod auth;
pub mod enrollments;
pub mod grades;
pub mod import_tasks;
pub mod parents;
pub mod school;
pub mod users;
