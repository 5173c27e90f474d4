//! Request middleware and extractors.
//!
//! - [`auth`]: bearer token extraction
//! - [`school_user`]: resolves the caller into a role-aware
//!   [`SchoolUser`](schoolyard_models::SchoolUser) once per request
//! - [`role`]: administrator and staff guards built on the resolved user
//!
//! # Flow
//!
//! 1. `attach_school_user` runs for every request. A valid token for an
//!    active user attaches `ResolvedUser(Some(user))`, anything else attaches
//!    `ResolvedUser(None)`. It never rejects.
//! 2. Guards (`require_administrator`, `RequireStaff`, ...) read the attached
//!    user and reject with 401 (nobody) or 403 (wrong roles).
//!
//! ```ignore
//! async fn list_grades(RequireStaff(user): RequireStaff) -> impl IntoResponse { ... }
//! ```

pub mod auth;
pub mod role;
pub mod school_user;
