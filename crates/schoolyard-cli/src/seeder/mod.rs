//! Development data: users of every school role, one academic year with
//! grades, and enrollments.
//!
//! Every seeded account shares the password [`SEED_PASSWORD`] and an
//! `@example.com` address, which is how [`clear_all`] finds them again.

mod academic;
mod models;
mod users;

use schoolyard_core::hash_password;
use sqlx::PgPool;
use std::time::Instant;

pub use academic::{
    SEED_YEAR_PREFIX, clear_academic_years, generate_grades, seed_academic_year,
    seed_enrollments,
};
pub use models::{SeedConfig, StaffCounts, UserSeed};
pub use users::{SEED_EMAIL_DOMAIN, SeededUsers, clear_users, generate_users, seed_users};

pub const SEED_PASSWORD: &str = "password123";

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🌱 Starting database seeding...\n");

    // Hashed once; bcrypt per user would dominate the run.
    let password_hash =
        hash_password(SEED_PASSWORD).map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let users = seed_users(db, &config, &password_hash).await?;
    let (year, grades) = seed_academic_year(db, config.grades).await?;
    let enrolled = seed_enrollments(db, &year, &grades, &users.students).await?;

    println!("\n✅ Seeding completed in {:?}", start_time.elapsed());
    println!("   Users: {}", users.staff.len() + users.students.len() + users.parents.len());
    println!("   Academic year: {} ({})", year.name, year.status.label());
    println!("   Grades: {}", grades.len());
    println!("   Enrollments: {}", enrolled);
    println!("   Password for all seeded users: {}", SEED_PASSWORD);

    Ok(())
}

pub async fn clear_all(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🧹 Clearing all seeded data...\n");

    let years = clear_academic_years(db).await?;
    let users = clear_users(db).await?;

    println!(
        "\n✅ Cleared {} academic years and {} users in {:?}",
        years,
        users,
        start_time.elapsed()
    );

    Ok(())
}
