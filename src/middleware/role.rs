//! Role guards.
//!
//! Both flavours read the [`ResolvedUser`] attached by
//! [`attach_school_user`](crate::middleware::school_user::attach_school_user):
//!
//! - layer functions ([`require_administrator`], [`require_staff`]) for
//!   routers where every route has the same guard
//! - extractors ([`RequireAdministrator`], [`RequireStaff`]) for routers that
//!   mix read and write guards

use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use schoolyard_core::AppError;
use schoolyard_models::SchoolUser;

use crate::middleware::school_user::{ResolvedUser, resolved_user};

pub fn check_administrator(user: &SchoolUser) -> Result<(), AppError> {
    if user.is_administrator() {
        return Ok(());
    }
    Err(AppError::forbidden(anyhow!(
        "Access denied. Administrator role required"
    )))
}

pub fn check_staff(user: &SchoolUser) -> Result<(), AppError> {
    if user.is_staff_member() {
        return Ok(());
    }
    Err(AppError::forbidden(anyhow!("Access denied. Staff role required")))
}

fn guard(req: &Request, check: fn(&SchoolUser) -> Result<(), AppError>) -> Result<(), AppError> {
    let user = req
        .extensions()
        .get::<ResolvedUser>()
        .and_then(|resolved| resolved.0.as_ref())
        .ok_or_else(|| AppError::unauthorized(anyhow!("Authentication required")))?;
    check(user)
}

pub async fn require_administrator(req: Request, next: Next) -> Response {
    match guard(&req, check_administrator) {
        Ok(()) => next.run(req).await,
        Err(e) => e.into_response(),
    }
}

pub async fn require_staff(req: Request, next: Next) -> Response {
    match guard(&req, check_staff) {
        Ok(()) => next.run(req).await,
        Err(e) => e.into_response(),
    }
}

macro_rules! role_extractor {
    ($name:ident, $check:path) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub SchoolUser);

        impl<S> FromRequestParts<S> for $name
        where
            S: Send + Sync,
        {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                _state: &S,
            ) -> Result<Self, Self::Rejection> {
                let user = resolved_user(parts)?;
                $check(&user)?;
                Ok($name(user))
            }
        }
    };
}

role_extractor!(RequireAdministrator, check_administrator);
role_extractor!(RequireStaff, check_staff);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;
    use schoolyard_models::{Email, ProfileType, RoleEnum, User, UserId};

    fn school_user(roles: Vec<RoleEnum>) -> SchoolUser {
        let now = Utc::now();
        SchoolUser {
            user: User {
                id: UserId::new(),
                email: Email::new("someone@school.example").unwrap(),
                first_name: "Sam".to_string(),
                last_name: "Lee".to_string(),
                phone_number: None,
                date_of_birth: None,
                is_active: true,
                is_staff: false,
                is_superuser: false,
                is_verified: false,
                last_login: None,
                created_at: now,
                updated_at: now,
            },
            roles,
            profile_types: vec![ProfileType::SchoolStaff],
        }
    }

    #[test]
    fn test_administrators_pass_both_guards() {
        for role in [RoleEnum::Admin, RoleEnum::Principal, RoleEnum::VicePrincipal] {
            let user = school_user(vec![role]);
            assert!(check_administrator(&user).is_ok(), "{role}");
            assert!(check_staff(&user).is_ok(), "{role}");
        }
    }

    #[test]
    fn test_teacher_is_staff_but_not_administrator() {
        let user = school_user(vec![RoleEnum::Teacher]);

        assert!(check_staff(&user).is_ok());
        let err = check_administrator(&user).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_students_and_parents_are_rejected() {
        for role in [RoleEnum::Student, RoleEnum::Parent] {
            let user = school_user(vec![role]);
            assert_eq!(check_staff(&user).unwrap_err().status, StatusCode::FORBIDDEN);
            assert_eq!(
                check_administrator(&user).unwrap_err().status,
                StatusCode::FORBIDDEN
            );
        }
    }

    #[test]
    fn test_guard_without_resolved_user_is_unauthorized() {
        let req = Request::new(axum::body::Body::empty());
        let err = guard(&req, check_staff).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
