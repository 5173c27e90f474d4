//! # Schoolyard Config
//!
//! Configuration types for the Schoolyard API.
//!
//! Runtime settings come from environment variables (after `dotenvy` has
//! loaded `.env`); the school's identity comes from a YAML file read through
//! figment:
//!
//! - [`jwt`]: token secret and lifetimes
//! - [`cors`]: allowed origins
//! - [`server`]: listener ports
//! - [`school`]: `school_config.yaml` (name, contact details, attributes)
//!
//! # Example
//!
//! ```ignore
//! use schoolyard_config::{CorsConfig, JwtConfig, SchoolConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let school = SchoolConfig::load()?;
//! ```

pub mod cors;
pub mod error;
pub mod jwt;
pub mod school;
pub mod server;

pub use cors::CorsConfig;
pub use error::ConfigError;
pub use jwt::JwtConfig;
pub use school::{AttributeType, SchoolAttribute, SchoolConfig};
pub use server::ServerConfig;
