//! Creates users together with the single profile their role requires.
//!
//! Every path goes through [`UserProfileFactory::create_in`]: resolve the
//! profile type for the role, check role/profile consistency, insert the
//! user, insert the profile, assign the role. The `*_in` variants run inside
//! a caller's transaction; the rest open their own.

use std::collections::BTreeSet;

use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use schoolyard_core::{AppError, hash_password};
use schoolyard_models::profile_rules::{
    get_required_profile_type, validate_role_profile_consistency,
};
use schoolyard_models::{
    CreateUserDto, Profile, ProfileType, RoleEnum, SchoolUser, User, UserError, UserId,
};

use crate::metrics::track_user_created;
use crate::modules::users::service::USER_COLUMNS;

/// Roles `create_staff_user` accepts.
pub const STAFF_USER_ROLES: [RoleEnum; 3] =
    [RoleEnum::Teacher, RoleEnum::VicePrincipal, RoleEnum::Staff];

pub struct UserProfileFactory;

impl UserProfileFactory {
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn create_user_with_profile(
        db: &PgPool,
        role: RoleEnum,
        is_staff_user: bool,
        dto: CreateUserDto,
    ) -> Result<SchoolUser, AppError> {
        let mut tx = db.begin().await?;
        let user = Self::create_in(&mut tx, role, is_staff_user, dto).await?;
        tx.commit().await?;

        track_user_created(role.as_str());
        info!(user_id = %user.id(), %role, "Created school user");

        Ok(user)
    }

    pub(crate) async fn create_in(
        conn: &mut PgConnection,
        role: RoleEnum,
        is_staff_user: bool,
        dto: CreateUserDto,
    ) -> Result<SchoolUser, AppError> {
        let profile_type = get_required_profile_type(role)
            .map_err(|e| AppError::bad_request(UserError::from(e)))?;
        validate_role_profile_consistency(
            &BTreeSet::from([role]),
            &BTreeSet::from([profile_type]),
        )
        .map_err(|e| AppError::bad_request(UserError::from(e)))?;

        let password_hash = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users AS u
                   (email, password, first_name, last_name, phone_number, date_of_birth, is_staff)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(&dto.email)
        .bind(&password_hash)
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(&dto.phone_number)
        .bind(dto.date_of_birth)
        .bind(is_staff_user)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow!("A user with this email already exists"));
            }
            AppError::from(e)
        })?;

        Self::create_profile(
            conn,
            user.id,
            profile_type,
            dto.address.as_deref(),
            dto.attributes.as_ref(),
        )
        .await?;
        Self::assign_role(conn, user.id, role).await?;

        Ok(SchoolUser {
            user,
            roles: vec![role],
            profile_types: vec![profile_type],
        })
    }

    /// Adds the user's profile. A user holds at most one profile of any type.
    pub(crate) async fn create_profile(
        conn: &mut PgConnection,
        user_id: UserId,
        profile_type: ProfileType,
        address: Option<&str>,
        attributes: Option<&serde_json::Value>,
    ) -> Result<Profile, AppError> {
        let existing = sqlx::query_scalar::<_, ProfileType>(
            "SELECT profile_type FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(profile) = existing {
            return Err(AppError::bad_request(UserError::ProfileExists {
                user: user_id.to_string(),
                profile,
            }));
        }

        let profile = sqlx::query_as::<_, Profile>(
            r#"INSERT INTO profiles (user_id, profile_type, address, attributes)
               VALUES ($1, $2, $3, $4)
               RETURNING id, user_id, profile_type, address, attributes, created_at, updated_at"#,
        )
        .bind(user_id)
        .bind(profile_type)
        .bind(address)
        .bind(attributes)
        .fetch_one(&mut *conn)
        .await?;

        Ok(profile)
    }

    pub(crate) async fn assign_role(
        conn: &mut PgConnection,
        user_id: UserId,
        role: RoleEnum,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(role)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Staff roles get `is_staff`, students and parents do not.
    pub async fn create_school_user(
        db: &PgPool,
        role: RoleEnum,
        dto: CreateUserDto,
    ) -> Result<SchoolUser, AppError> {
        Self::create_user_with_profile(db, role, role.is_staff_role(), dto).await
    }

    pub async fn create_principal(db: &PgPool, dto: CreateUserDto) -> Result<SchoolUser, AppError> {
        Self::create_user_with_profile(db, RoleEnum::Principal, true, dto).await
    }

    pub async fn create_vice_principal(
        db: &PgPool,
        dto: CreateUserDto,
    ) -> Result<SchoolUser, AppError> {
        Self::create_user_with_profile(db, RoleEnum::VicePrincipal, true, dto).await
    }

    pub async fn create_teacher(db: &PgPool, dto: CreateUserDto) -> Result<SchoolUser, AppError> {
        Self::create_user_with_profile(db, RoleEnum::Teacher, true, dto).await
    }

    pub async fn create_staff(db: &PgPool, dto: CreateUserDto) -> Result<SchoolUser, AppError> {
        Self::create_user_with_profile(db, RoleEnum::Staff, true, dto).await
    }

    pub async fn create_student(db: &PgPool, dto: CreateUserDto) -> Result<SchoolUser, AppError> {
        Self::create_user_with_profile(db, RoleEnum::Student, false, dto).await
    }

    pub async fn create_parent(db: &PgPool, dto: CreateUserDto) -> Result<SchoolUser, AppError> {
        Self::create_user_with_profile(db, RoleEnum::Parent, false, dto).await
    }

    pub async fn create_staff_user(
        db: &PgPool,
        role: RoleEnum,
        dto: CreateUserDto,
    ) -> Result<SchoolUser, AppError> {
        if !STAFF_USER_ROLES.contains(&role) {
            return Err(AppError::bad_request(UserError::UnsupportedRole(role)));
        }
        Self::create_user_with_profile(db, role, true, dto).await
    }
}
