//! # Schoolyard Auth
//!
//! JWT claims and token helpers.
//!
//! - **Access token** ([`Claims`]): short-lived, carries the user's role names
//! - **Refresh token** ([`RefreshTokenClaims`]): long-lived, exchanged for a new
//!   access token
//!
//! Role names in the access token are informational. Authorization decisions
//! are made against the roles loaded from the database for each request.
//!
//! # Example
//!
//! ```ignore
//! use schoolyard_auth::{create_access_token, verify_token};
//! use schoolyard_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "teacher@school.example", vec!["Teacher".into()], &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

pub mod claims;
pub mod jwt;

pub use claims::{Claims, RefreshTokenClaims};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
