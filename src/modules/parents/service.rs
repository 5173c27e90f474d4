//! Parent/child links. A child must hold the Student role.

use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument};

use schoolyard_core::AppError;
use schoolyard_models::{RoleEnum, SchoolUser, User, UserError, UserId};

use crate::modules::users::service::{USER_COLUMNS, UserService};

pub struct ParentService;

impl ParentService {
    async fn load_parent(db: &PgPool, parent_id: UserId) -> Result<SchoolUser, AppError> {
        let parent = UserService::find_school_user(db, parent_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Parent not found")))?;

        if !parent.is_parent() {
            return Err(AppError::bad_request(UserError::NotAParent));
        }
        Ok(parent)
    }

    async fn linked_children(db: &PgPool, parent_id: UserId) -> Result<Vec<SchoolUser>, AppError> {
        let children = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users u
               JOIN parent_children pc ON pc.student_user_id = u.id
               WHERE pc.parent_user_id = $1
               ORDER BY u.first_name, u.last_name"#
        ))
        .bind(parent_id)
        .fetch_all(db)
        .await?;

        let mut conn = db.acquire().await?;
        UserService::attach_roles(&mut conn, children).await
    }

    #[instrument(skip(db))]
    pub async fn add_child_with_validation(
        db: &PgPool,
        parent_id: UserId,
        student_id: UserId,
    ) -> Result<SchoolUser, AppError> {
        Self::load_parent(db, parent_id).await?;

        let child = UserService::find_school_user(db, student_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Student not found")))?;

        if !child.has_role(RoleEnum::Student) {
            return Err(AppError::bad_request(UserError::ChildNotStudent(
                child.user.email.to_string(),
            )));
        }

        sqlx::query(
            r#"INSERT INTO parent_children (parent_user_id, student_user_id)
               VALUES ($1, $2)
               ON CONFLICT DO NOTHING"#,
        )
        .bind(parent_id)
        .bind(student_id)
        .execute(db)
        .await?;

        info!(%parent_id, %student_id, "Linked child to parent");
        Ok(child)
    }

    #[instrument(skip(db))]
    pub async fn remove_child(
        db: &PgPool,
        parent_id: UserId,
        student_id: UserId,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM parent_children WHERE parent_user_id = $1 AND student_user_id = $2",
        )
        .bind(parent_id)
        .bind(student_id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(UserError::ChildNotLinked));
        }
        Ok(())
    }

    /// Linked children that still hold the Student role.
    #[instrument(skip(db))]
    pub async fn get_validated_children(
        db: &PgPool,
        parent_id: UserId,
    ) -> Result<Vec<SchoolUser>, AppError> {
        Self::load_parent(db, parent_id).await?;

        let children = Self::linked_children(db, parent_id).await?;
        Ok(children
            .into_iter()
            .filter(|child| child.has_role(RoleEnum::Student))
            .collect())
    }

    /// Fails with the emails of every linked child missing the Student role.
    #[instrument(skip(db))]
    pub async fn validate_all_children_have_student_role(
        db: &PgPool,
        parent_id: UserId,
    ) -> Result<(), AppError> {
        Self::load_parent(db, parent_id).await?;

        let invalid: Vec<String> = Self::linked_children(db, parent_id)
            .await?
            .into_iter()
            .filter(|child| !child.has_role(RoleEnum::Student))
            .map(|child| child.user.email.to_string())
            .collect();

        if !invalid.is_empty() {
            return Err(AppError::bad_request(UserError::InvalidChildren(invalid)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use schoolyard_models::{CreateUserDto, Email};
    use uuid::Uuid;

    use crate::modules::users::factory::UserProfileFactory;

    fn dto(name: &str) -> CreateUserDto {
        CreateUserDto {
            first_name: name.to_string(),
            last_name: "Family".to_string(),
            email: Email::new(format!("{name}-{}@home.example", Uuid::new_v4())).unwrap(),
            password: "password123".to_string(),
            phone_number: None,
            date_of_birth: None,
            address: None,
            attributes: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_add_and_list_children(pool: PgPool) {
        let parent = UserProfileFactory::create_parent(&pool, dto("mum")).await.unwrap();
        let kid = UserProfileFactory::create_student(&pool, dto("kid")).await.unwrap();

        ParentService::add_child_with_validation(&pool, parent.id(), kid.id())
            .await
            .unwrap();
        // Linking twice is harmless.
        ParentService::add_child_with_validation(&pool, parent.id(), kid.id())
            .await
            .unwrap();

        let children = ParentService::get_validated_children(&pool, parent.id())
            .await
            .unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id(), kid.id());

        ParentService::validate_all_children_have_student_role(&pool, parent.id())
            .await
            .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_child_must_be_student(pool: PgPool) {
        let parent = UserProfileFactory::create_parent(&pool, dto("dad")).await.unwrap();
        let teacher = UserProfileFactory::create_teacher(&pool, dto("teach")).await.unwrap();

        let err = ParentService::add_child_with_validation(&pool, parent.id(), teacher.id())
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message().contains("must have STUDENT role"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_only_parents_can_have_children(pool: PgPool) {
        let teacher = UserProfileFactory::create_teacher(&pool, dto("t")).await.unwrap();
        let kid = UserProfileFactory::create_student(&pool, dto("k")).await.unwrap();

        let err = ParentService::add_child_with_validation(&pool, teacher.id(), kid.id())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "User is not a parent");

        let err = ParentService::validate_all_children_have_student_role(&pool, teacher.id())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = ParentService::validate_all_children_have_student_role(&pool, UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_validation_reports_children_without_student_role(pool: PgPool) {
        let parent = UserProfileFactory::create_parent(&pool, dto("p")).await.unwrap();
        let kid = UserProfileFactory::create_student(&pool, dto("k")).await.unwrap();
        ParentService::add_child_with_validation(&pool, parent.id(), kid.id())
            .await
            .unwrap();

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(kid.id())
            .execute(&pool)
            .await
            .unwrap();

        let err = ParentService::validate_all_children_have_student_role(&pool, parent.id())
            .await
            .unwrap_err();
        assert!(err.message().contains(kid.user.email.as_str()));

        let children = ParentService::get_validated_children(&pool, parent.id())
            .await
            .unwrap();
        assert!(children.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_remove_child(pool: PgPool) {
        let parent = UserProfileFactory::create_parent(&pool, dto("p")).await.unwrap();
        let kid = UserProfileFactory::create_student(&pool, dto("k")).await.unwrap();
        ParentService::add_child_with_validation(&pool, parent.id(), kid.id())
            .await
            .unwrap();

        ParentService::remove_child(&pool, parent.id(), kid.id())
            .await
            .unwrap();
        let err = ParentService::remove_child(&pool, parent.id(), kid.id())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
