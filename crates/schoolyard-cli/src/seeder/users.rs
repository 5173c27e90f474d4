//! Fake users with their profiles, roles and parent links.

use fake::Fake;
use fake::faker::name::en::*;
use rayon::prelude::*;
use schoolyard_models::profile_rules::role_profile;
use schoolyard_models::{RoleEnum, UserId};
use sqlx::{PgConnection, PgPool};
use std::time::Instant;

use super::models::{SeedConfig, UserSeed};

pub const SEED_EMAIL_DOMAIN: &str = "example.com";

/// Generates `count` users holding `role`
pub fn generate_users(
    role: RoleEnum,
    count: usize,
    prefix: &str,
    password_hash: &str,
) -> Vec<UserSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| generate_user(role, idx, prefix, password_hash))
        .collect()
}

fn generate_user(role: RoleEnum, idx: usize, prefix: &str, password_hash: &str) -> UserSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();

    let email = format!(
        "{}.{}+{}{}@{}",
        first_name.to_lowercase().replace(' ', ""),
        last_name.to_lowercase().replace(' ', ""),
        prefix,
        idx,
        SEED_EMAIL_DOMAIN
    );

    UserSeed {
        first_name,
        last_name,
        email,
        password_hash: password_hash.to_string(),
        role,
    }
}

/// Users created by one seeding run, grouped by role.
#[derive(Default)]
pub struct SeededUsers {
    pub staff: Vec<UserId>,
    pub students: Vec<UserId>,
    pub parents: Vec<UserId>,
}

/// Seeds staff, students and parents, then links parents to students.
pub async fn seed_users(
    db: &PgPool,
    config: &SeedConfig,
    password_hash: &str,
) -> Result<SeededUsers, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("👥 Seeding {} users...", config.total_users());

    let mut users = generate_users(
        RoleEnum::Teacher,
        config.staff.teachers,
        "teacher",
        password_hash,
    );
    users.extend(generate_users(
        RoleEnum::Staff,
        config.staff.staff,
        "staff",
        password_hash,
    ));
    users.extend(generate_users(
        RoleEnum::Student,
        config.students,
        "student",
        password_hash,
    ));
    users.extend(generate_users(
        RoleEnum::Parent,
        config.parents,
        "parent",
        password_hash,
    ));

    let mut tx = db.begin().await?;
    let ids = insert_users_batch(&mut tx, &users).await?;
    assign_roles_batch(&mut tx, &ids).await?;
    create_profiles_batch(&mut tx, &ids).await?;

    let mut seeded = SeededUsers::default();
    for (user_id, role) in ids {
        match role {
            RoleEnum::Student => seeded.students.push(user_id),
            RoleEnum::Parent => seeded.parents.push(user_id),
            _ => seeded.staff.push(user_id),
        }
    }

    let links = link_parents(&mut tx, &seeded.parents, &seeded.students).await?;
    tx.commit().await?;

    println!(
        "   ✓ Inserted {} staff, {} students, {} parents ({} links) in {:?}",
        seeded.staff.len(),
        seeded.students.len(),
        seeded.parents.len(),
        links,
        start_time.elapsed()
    );

    Ok(seeded)
}

/// Inserts users in chunks, returning `(user_id, role)` in input order.
pub async fn insert_users_batch(
    conn: &mut PgConnection,
    users: &[UserSeed],
) -> Result<Vec<(UserId, RoleEnum)>, Box<dyn std::error::Error>> {
    // 5 params per user
    const BATCH_SIZE: usize = 1000;

    let mut all = Vec::with_capacity(users.len());

    for chunk in users.chunks(BATCH_SIZE) {
        let mut query = String::from(
            "INSERT INTO users (first_name, last_name, email, password, is_staff) VALUES ",
        );
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            let p = i * 5;
            query.push_str(&format!(
                "(${}, ${}, ${}, ${}, ${})",
                p + 1,
                p + 2,
                p + 3,
                p + 4,
                p + 5
            ));
        }
        // Fake names can collide; a duplicate address is skipped.
        query.push_str(" ON CONFLICT (email) DO NOTHING RETURNING id, email");

        let mut q = sqlx::query_as::<_, (UserId, String)>(&query);
        for user in chunk {
            q = q
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.email)
                .bind(&user.password_hash)
                .bind(user.role.is_staff_role());
        }

        let inserted = q.fetch_all(&mut *conn).await?;
        for (user_id, email) in inserted {
            if let Some(seed) = chunk.iter().find(|u| u.email == email) {
                all.push((user_id, seed.role));
            }
        }
    }

    Ok(all)
}

async fn assign_roles_batch(
    conn: &mut PgConnection,
    users: &[(UserId, RoleEnum)],
) -> Result<(), Box<dyn std::error::Error>> {
    const BATCH_SIZE: usize = 2000;

    for chunk in users.chunks(BATCH_SIZE) {
        let mut query = String::from("INSERT INTO user_roles (user_id, role) VALUES ");
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            let p = i * 2;
            query.push_str(&format!("(${}, ${})", p + 1, p + 2));
        }
        query.push_str(" ON CONFLICT (user_id, role) DO NOTHING");

        let mut q = sqlx::query(&query);
        for (user_id, role) in chunk {
            q = q.bind(user_id).bind(role);
        }
        q.execute(&mut *conn).await?;
    }

    Ok(())
}

/// One profile per user, typed by the role's required profile.
async fn create_profiles_batch(
    conn: &mut PgConnection,
    users: &[(UserId, RoleEnum)],
) -> Result<(), Box<dyn std::error::Error>> {
    const BATCH_SIZE: usize = 2000;

    let rows: Vec<_> = users
        .iter()
        .filter_map(|&(user_id, role)| role_profile(role).map(|profile| (user_id, profile)))
        .collect();

    for chunk in rows.chunks(BATCH_SIZE) {
        let mut query = String::from("INSERT INTO profiles (user_id, profile_type) VALUES ");
        for i in 0..chunk.len() {
            if i > 0 {
                query.push_str(", ");
            }
            let p = i * 2;
            query.push_str(&format!("(${}, ${})", p + 1, p + 2));
        }
        query.push_str(" ON CONFLICT (user_id) DO NOTHING");

        let mut q = sqlx::query(&query);
        for (user_id, profile) in chunk {
            q = q.bind(user_id).bind(profile);
        }
        q.execute(&mut *conn).await?;
    }

    Ok(())
}

/// Gives each student one parent, cycling through the parents.
async fn link_parents(
    conn: &mut PgConnection,
    parents: &[UserId],
    students: &[UserId],
) -> Result<usize, Box<dyn std::error::Error>> {
    if parents.is_empty() || students.is_empty() {
        return Ok(0);
    }

    let (parent_ids, student_ids): (Vec<UserId>, Vec<UserId>) = students
        .iter()
        .enumerate()
        .map(|(i, &student)| (parents[i % parents.len()], student))
        .unzip();

    sqlx::query(
        "INSERT INTO parent_children (parent_user_id, student_user_id)
         SELECT * FROM UNNEST($1::uuid[], $2::uuid[])
         ON CONFLICT DO NOTHING",
    )
    .bind(&parent_ids)
    .bind(&student_ids)
    .execute(&mut *conn)
    .await?;

    Ok(student_ids.len())
}

/// Clears all seeded users (preserves admins)
pub async fn clear_users(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded users...");

    let result = sqlx::query(
        "DELETE FROM users u
         WHERE u.email LIKE $1
         AND NOT EXISTS (
             SELECT 1 FROM user_roles ur
             WHERE ur.user_id = u.id
             AND ur.role = $2
         )",
    )
    .bind(format!("%@{SEED_EMAIL_DOMAIN}"))
    .bind(RoleEnum::Admin)
    .execute(db)
    .await?
    .rows_affected();

    println!(
        "   ✓ Deleted {} users in {:?}",
        result,
        start_time.elapsed()
    );

    Ok(result)
}
