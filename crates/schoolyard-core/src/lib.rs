//! # Schoolyard Core
//!
//! Foundational types shared by every Schoolyard crate:
//!
//! - [`errors`]: [`AppError`], the HTTP-aware error used by services and handlers
//! - [`pagination`]: limit/offset/page query parameters and response metadata
//! - [`password`]: bcrypt hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use schoolyard_core::{AppError, PaginationParams, hash_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Grade not found"));
//! let hash = hash_password("secure_password")?;
//! let limit = PaginationParams::default().limit();
//! ```

pub mod errors;
pub mod pagination;
pub mod password;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
