use std::collections::HashMap;

use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use schoolyard_core::{AppError, PaginationMeta, PaginationParams};
use schoolyard_models::{
    PaginatedUsersResponse, ProfileType, RoleEnum, SchoolUser, StaffMetrics, User,
    UserFilterParams, UserId,
};

pub(crate) const USER_COLUMNS: &str = "u.id, u.email, u.first_name, u.last_name, u.phone_number, \
     u.date_of_birth, u.is_active, u.is_staff, u.is_superuser, u.is_verified, u.last_login, \
     u.created_at, u.updated_at";

fn role_names(roles: &[RoleEnum]) -> Vec<String> {
    roles.iter().map(|role| role.as_str().to_string()).collect()
}

pub struct UserService;

impl UserService {
    /// Loads roles and profile types for `users`, keeping their order.
    pub(crate) async fn attach_roles(
        conn: &mut PgConnection,
        users: Vec<User>,
    ) -> Result<Vec<SchoolUser>, AppError> {
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();

        let roles = sqlx::query_as::<_, (UserId, RoleEnum)>(
            r#"SELECT user_id, role FROM user_roles
               WHERE user_id = ANY($1)
               ORDER BY assigned_at, role"#,
        )
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

        let profiles = sqlx::query_as::<_, (UserId, ProfileType)>(
            "SELECT user_id, profile_type FROM profiles WHERE user_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

        let mut roles_by_user: HashMap<UserId, Vec<RoleEnum>> = HashMap::new();
        for (user_id, role) in roles {
            roles_by_user.entry(user_id).or_default().push(role);
        }
        let mut profiles_by_user: HashMap<UserId, Vec<ProfileType>> = HashMap::new();
        for (user_id, profile_type) in profiles {
            profiles_by_user.entry(user_id).or_default().push(profile_type);
        }

        Ok(users
            .into_iter()
            .map(|user| SchoolUser {
                roles: roles_by_user.remove(&user.id).unwrap_or_default(),
                profile_types: profiles_by_user.remove(&user.id).unwrap_or_default(),
                user,
            })
            .collect())
    }

    pub(crate) async fn find_school_user_in(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<Option<SchoolUser>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        Ok(Self::attach_roles(conn, vec![user]).await?.pop())
    }

    #[instrument(skip(db))]
    pub async fn find_school_user(
        db: &PgPool,
        user_id: UserId,
    ) -> Result<Option<SchoolUser>, AppError> {
        let mut conn = db.acquire().await?;
        Self::find_school_user_in(&mut conn, user_id).await
    }

    #[instrument(skip(db))]
    pub async fn get_school_user(db: &PgPool, user_id: UserId) -> Result<SchoolUser, AppError> {
        Self::find_school_user(db, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_users(
        db: &PgPool,
        filters: UserFilterParams,
        pagination: PaginationParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let roles: Vec<RoleEnum> = match (filters.role, filters.staff) {
            (Some(role), _) => vec![role],
            (None, true) => RoleEnum::staff_roles(),
            (None, false) => Vec::new(),
        };
        let filter_by_role = !roles.is_empty();
        let role_names = role_names(&roles);

        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM users u
               WHERE NOT $1 OR EXISTS (
                   SELECT 1 FROM user_roles ur
                   WHERE ur.user_id = u.id AND ur.role = ANY($2::text[])
               )"#,
        )
        .bind(filter_by_role)
        .bind(&role_names)
        .fetch_one(db)
        .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users u
               WHERE NOT $1 OR EXISTS (
                   SELECT 1 FROM user_roles ur
                   WHERE ur.user_id = u.id AND ur.role = ANY($2::text[])
               )
               ORDER BY u.last_name, u.first_name, u.created_at
               LIMIT $3 OFFSET $4"#
        ))
        .bind(filter_by_role)
        .bind(&role_names)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        let mut conn = db.acquire().await?;
        let data = Self::attach_roles(&mut conn, users).await?;

        Ok(PaginatedUsersResponse {
            data,
            meta: PaginationMeta::from_params(total, &pagination),
        })
    }

    /// Every user holding any of `roles`, ordered by name.
    #[instrument(skip(db))]
    pub async fn get_users_with_roles(
        db: &PgPool,
        roles: &[RoleEnum],
    ) -> Result<Vec<SchoolUser>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users u
               WHERE EXISTS (
                   SELECT 1 FROM user_roles ur
                   WHERE ur.user_id = u.id AND ur.role = ANY($1::text[])
               )
               ORDER BY u.last_name, u.first_name, u.created_at"#
        ))
        .bind(role_names(roles))
        .fetch_all(db)
        .await?;

        let mut conn = db.acquire().await?;
        Self::attach_roles(&mut conn, users).await
    }

    pub async fn get_staff(db: &PgPool) -> Result<Vec<SchoolUser>, AppError> {
        Self::get_users_with_roles(db, &RoleEnum::staff_roles()).await
    }

    pub async fn get_teachers(db: &PgPool) -> Result<Vec<SchoolUser>, AppError> {
        Self::get_users_with_roles(db, &[RoleEnum::Teacher]).await
    }

    pub async fn get_students(db: &PgPool) -> Result<Vec<SchoolUser>, AppError> {
        Self::get_users_with_roles(db, &[RoleEnum::Student]).await
    }

    pub async fn get_parents(db: &PgPool) -> Result<Vec<SchoolUser>, AppError> {
        Self::get_users_with_roles(db, &[RoleEnum::Parent]).await
    }

    pub async fn get_principals(db: &PgPool) -> Result<Vec<SchoolUser>, AppError> {
        Self::get_users_with_roles(db, &[RoleEnum::Principal]).await
    }

    /// Users holding at least one staff role; teaching staff hold Teacher.
    #[instrument(skip(db))]
    pub async fn get_staff_metrics(db: &PgPool) -> Result<StaffMetrics, AppError> {
        let (total, teaching) = sqlx::query_as::<_, (i64, i64)>(
            r#"SELECT
                   COUNT(DISTINCT ur.user_id),
                   COUNT(DISTINCT ur.user_id) FILTER (WHERE ur.role = $2)
               FROM user_roles ur
               WHERE ur.role = ANY($1::text[])"#,
        )
        .bind(role_names(&RoleEnum::staff_roles()))
        .bind(RoleEnum::Teacher.as_str())
        .fetch_one(db)
        .await?;

        Ok(StaffMetrics::new(total, teaching))
    }

    pub(crate) async fn principal_exists(conn: &mut PgConnection) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE role = $1)",
        )
        .bind(RoleEnum::Principal.as_str())
        .fetch_one(conn)
        .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::users::factory::UserProfileFactory;
    use schoolyard_models::{CreateUserDto, Email};
    use uuid::Uuid;

    fn dto(first: &str, last: &str) -> CreateUserDto {
        CreateUserDto {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: Email::new(format!("{}-{}@school.example", first.to_lowercase(), Uuid::new_v4()))
                .unwrap(),
            password: "password123".to_string(),
            phone_number: None,
            date_of_birth: None,
            address: None,
            attributes: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_role_listings_filter_and_order(pool: PgPool) {
        UserProfileFactory::create_teacher(&pool, dto("Zoe", "Young")).await.unwrap();
        UserProfileFactory::create_teacher(&pool, dto("Adam", "Baker")).await.unwrap();
        UserProfileFactory::create_student(&pool, dto("Sam", "Stone")).await.unwrap();
        UserProfileFactory::create_parent(&pool, dto("Pat", "Stone")).await.unwrap();
        UserProfileFactory::create_principal(&pool, dto("Pia", "North")).await.unwrap();

        let teachers = UserService::get_teachers(&pool).await.unwrap();
        let names: Vec<&str> = teachers.iter().map(|t| t.user.last_name.as_str()).collect();
        assert_eq!(names, vec!["Baker", "Young"]);

        assert_eq!(UserService::get_students(&pool).await.unwrap().len(), 1);
        assert_eq!(UserService::get_parents(&pool).await.unwrap().len(), 1);
        assert_eq!(UserService::get_principals(&pool).await.unwrap().len(), 1);

        let staff = UserService::get_staff(&pool).await.unwrap();
        assert_eq!(staff.len(), 3);
        assert!(staff.iter().all(|u| u.is_staff_member()));
    }
}
