use sqlx::PgPool;
use tracing::{info, instrument};

use schoolyard_core::AppError;
use schoolyard_models::{PrincipalSetupDto, RoleEnum, SchoolUser, UserError};

use crate::metrics::track_user_created;
use crate::modules::users::factory::UserProfileFactory;
use crate::modules::users::service::UserService;

/// Arbitrary key for the transaction-scoped lock serializing principal setup.
const PRINCIPAL_SETUP_LOCK: i64 = 0x5C40_0001;

pub struct SchoolService;

impl SchoolService {
    /// Creates the school's first principal. Fails once any principal exists.
    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn setup_principal(
        db: &PgPool,
        dto: PrincipalSetupDto,
    ) -> Result<SchoolUser, AppError> {
        dto.check_passwords().map_err(AppError::bad_request)?;

        let mut tx = db.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(PRINCIPAL_SETUP_LOCK)
            .execute(&mut *tx)
            .await?;

        if UserService::principal_exists(&mut tx).await? {
            return Err(AppError::bad_request(UserError::PrincipalExists));
        }

        let principal =
            UserProfileFactory::create_in(&mut tx, RoleEnum::Principal, true, dto.into_user())
                .await?;
        tx.commit().await?;

        track_user_created(RoleEnum::Principal.as_str());
        info!(user_id = %principal.id(), "Principal account created");

        Ok(principal)
    }
}
