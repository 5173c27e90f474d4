//! A seeded academic year with grades and enrolled students.

use chrono::{Datelike, NaiveDate, Utc};
use schoolyard::modules::academic_years::orchestrator::AcademicYearOrchestrator;
use schoolyard_models::{
    AcademicYear, CreateAcademicYearDto, CreateGradeDto, DeploymentType, Grade, UserId,
};
use sqlx::PgPool;
use std::time::Instant;

pub const SEED_YEAR_PREFIX: &str = "Seeded ";

fn seed_year_dto(today: NaiveDate) -> Option<CreateAcademicYearDto> {
    let start_year = if today.month() >= 8 {
        today.year()
    } else {
        today.year() - 1
    };

    Some(CreateAcademicYearDto {
        name: format!("{SEED_YEAR_PREFIX}{}-{}", start_year, start_year + 1),
        start_date: NaiveDate::from_ymd_opt(start_year, 9, 1)?,
        end_date: NaiveDate::from_ymd_opt(start_year + 1, 6, 30)?,
        deployment_type: DeploymentType::FreshStart,
        enrollment_start_date: NaiveDate::from_ymd_opt(start_year, 8, 1),
        enrollment_end_date: NaiveDate::from_ymd_opt(start_year, 8, 31),
    })
}

/// Grade levels `1..=count`, one section each.
pub fn generate_grades(count: usize) -> Vec<CreateGradeDto> {
    (1..=count)
        .map(|level| CreateGradeDto {
            name: format!("Grade {level}A"),
            grade: level.to_string(),
            grade_type: String::new(),
            grade_subtype: String::new(),
            description: format!("Seeded section for grade {level}"),
        })
        .collect()
}

/// Creates the current school year in SETUP with its grades.
pub async fn seed_academic_year(
    db: &PgPool,
    grades: usize,
) -> Result<(AcademicYear, Vec<Grade>), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    let dto = seed_year_dto(Utc::now().date_naive()).ok_or("Could not compute seed year dates")?;
    println!("📅 Seeding academic year '{}' with {} grades...", dto.name, grades);

    let year = AcademicYearOrchestrator::create_academic_year(db, dto)
        .await
        .map_err(|e| e.message())?;

    let grades = if grades > 0 {
        AcademicYearOrchestrator::bulk_create_grades(db, year.id, generate_grades(grades))
            .await
            .map_err(|e| e.message())?
    } else {
        Vec::new()
    };

    println!(
        "   ✓ Created year and {} grades in {:?}",
        grades.len(),
        start_time.elapsed()
    );

    Ok((year, grades))
}

/// Spreads students over the grades round-robin.
pub async fn seed_enrollments(
    db: &PgPool,
    year: &AcademicYear,
    grades: &[Grade],
    students: &[UserId],
) -> Result<usize, Box<dyn std::error::Error>> {
    if grades.is_empty() || students.is_empty() {
        return Ok(0);
    }

    let start_time = Instant::now();
    println!("🎓 Enrolling {} students...", students.len());

    let grade_ids: Vec<_> = (0..students.len())
        .map(|i| grades[i % grades.len()].id)
        .collect();

    let enrolled = sqlx::query(
        "INSERT INTO student_enrollments (student_id, grade_id, academic_year_id)
         SELECT s, g, $3 FROM UNNEST($1::uuid[], $2::uuid[]) AS t(s, g)
         ON CONFLICT DO NOTHING",
    )
    .bind(students)
    .bind(&grade_ids)
    .bind(year.id)
    .execute(db)
    .await?
    .rows_affected();

    println!(
        "   ✓ Enrolled {} students in {:?}",
        enrolled,
        start_time.elapsed()
    );

    Ok(enrolled as usize)
}

/// Deletes seeded years; grades, setups and enrollments cascade.
pub async fn clear_academic_years(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded academic years...");

    let result = sqlx::query("DELETE FROM academic_years WHERE name LIKE $1")
        .bind(format!("{SEED_YEAR_PREFIX}%"))
        .execute(db)
        .await?
        .rows_affected();

    println!(
        "   ✓ Deleted {} academic years in {:?}",
        result,
        start_time.elapsed()
    );

    Ok(result)
}
