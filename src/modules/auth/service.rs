use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use schoolyard_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use schoolyard_config::JwtConfig;
use schoolyard_core::{AppError, verify_password};
use schoolyard_models::{Email, LoginRequest, LoginResponse, SchoolUser, TokenPair, UserId};

use crate::metrics::{track_jwt_issued, track_user_login_failure, track_user_login_success};
use crate::modules::users::service::UserService;

fn invalid_credentials() -> AppError {
    AppError::unauthorized(anyhow!("Invalid email or password"))
}

pub struct AuthService;

impl AuthService {
    fn issue_tokens(user: &SchoolUser, jwt_config: &JwtConfig) -> Result<TokenPair, AppError> {
        let roles = user.roles.iter().map(|role| role.to_string()).collect();
        let access_token =
            create_access_token(user.id().into_inner(), user.user.email.as_str(), roles, jwt_config)?;
        let refresh_token =
            create_refresh_token(user.id().into_inner(), user.user.email.as_str(), jwt_config)?;
        track_jwt_issued();

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    #[instrument(skip(db, dto, jwt_config), fields(email = %dto.email))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let credentials = sqlx::query_as::<_, (UserId, String, bool)>(
            "SELECT id, password, is_active FROM users WHERE email = $1",
        )
        .bind(Email::normalize(dto.email.trim()))
        .fetch_optional(db)
        .await?;

        let Some((user_id, password_hash, is_active)) = credentials else {
            track_user_login_failure("unknown_email");
            return Err(invalid_credentials());
        };

        if !verify_password(&dto.password, &password_hash)? {
            track_user_login_failure("bad_password");
            return Err(invalid_credentials());
        }

        if !is_active {
            track_user_login_failure("inactive");
            warn!(%user_id, "Login attempt for inactive account");
            return Err(AppError::unauthorized(anyhow!("Account is disabled")));
        }

        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;

        let user = UserService::get_school_user(db, user_id).await?;
        let tokens = Self::issue_tokens(&user, jwt_config)?;

        track_user_login_success();
        info!(%user_id, "User logged in");

        Ok(LoginResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user,
        })
    }

    #[instrument(skip_all)]
    pub async fn refresh(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<TokenPair, AppError> {
        let claims = verify_refresh_token(refresh_token, jwt_config)?;
        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized(anyhow!("Invalid or expired refresh token")))?;

        let user = UserService::find_school_user(db, user_id)
            .await?
            .filter(|user| user.user.is_active)
            .ok_or_else(|| AppError::unauthorized(anyhow!("Invalid or expired refresh token")))?;

        Self::issue_tokens(&user, jwt_config)
    }
}
