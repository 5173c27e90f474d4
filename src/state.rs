use std::sync::Arc;

use sqlx::PgPool;

use schoolyard_config::{CorsConfig, JwtConfig, SchoolConfig};
use schoolyard_db::init_db_pool;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub school_config: Arc<SchoolConfig>,
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    Ok(AppState {
        db: init_db_pool().await?,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        school_config: Arc::new(SchoolConfig::load()?),
    })
}
