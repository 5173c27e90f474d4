//! Platform administrator accounts.
//!
//! Admins hold the `Admin` role and no profile, so they cannot go through
//! the user/profile factory. This is the only way to create one.

use schoolyard_core::hash_password;
use schoolyard_models::{Email, RoleEnum, UserId};
use sqlx::PgPool;

pub struct AdminInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Creates a staff superuser holding the `Admin` role.
pub async fn create_admin(
    db: &PgPool,
    input: &AdminInput,
) -> Result<UserId, Box<dyn std::error::Error>> {
    let email = Email::new(&input.email)?;
    if input.password.chars().count() < 8 {
        return Err("Password must be at least 8 characters".into());
    }

    let hashed_password = hash_password(&input.password)
        .map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let mut tx = db.begin().await?;

    let user_id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (first_name, last_name, email, password, is_staff, is_superuser, is_verified)
         VALUES ($1, $2, $3, $4, TRUE, TRUE, TRUE)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(input.first_name.trim())
    .bind(input.last_name.trim())
    .bind(email.as_str())
    .bind(&hashed_password)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_id) = user_id else {
        tx.rollback().await?;
        return Err("User with this email already exists".into());
    };

    sqlx::query(
        "INSERT INTO user_roles (user_id, role)
         VALUES ($1, $2)
         ON CONFLICT (user_id, role) DO NOTHING",
    )
    .bind(user_id)
    .bind(RoleEnum::Admin)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(user_id)
}
