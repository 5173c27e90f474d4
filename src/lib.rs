//! # Schoolyard API
//!
//! A REST backend for running a single school: who works and studies
//! there, how each academic year is set up and run, and which students sit
//! in which grade. Built with Axum, sqlx and PostgreSQL.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── schoolyard-core/     # AppError, pagination
//! ├── schoolyard-config/   # JWT, CORS, server ports, school YAML
//! ├── schoolyard-db/       # connection pool
//! ├── schoolyard-auth/     # JWT claims, bcrypt
//! ├── schoolyard-models/   # domain types and pure rules
//! └── schoolyard-cli/      # admin bootstrap and seeding
//! src/
//! ├── middleware/          # school user resolution, role guards
//! └── modules/             # feature modules
//!     ├── academic_years/  # lifecycle and setup orchestration
//!     ├── grades/          # grade factory, soft delete
//!     ├── enrollments/     # enrollment routes and row access
//!     ├── import_tasks/    # import progress reporting
//!     ├── users/           # user/profile factory, listings
//!     ├── parents/         # parent/child links
//!     ├── school/          # school config, principal bootstrap
//!     └── auth/            # login, refresh, current user
//! ```
//!
//! Each feature module has a `controller.rs` (handlers), `service.rs`
//! (queries and business logic) and `router.rs`.
//!
//! ## Academic year lifecycle
//!
//! ```text
//! FRESH_START:  SETUP → ENROLLMENT → ACTIVE → COMPLETED
//! MID_YEAR:     SETUP → ACTIVE → COMPLETED
//! ```
//!
//! Leaving SETUP requires every setup step to be complete. All transitions
//! go through [`modules::academic_years::orchestrator::AcademicYearOrchestrator`].
//!
//! ## Access
//!
//! Every request passes through
//! [`middleware::school_user::attach_school_user`], which resolves the
//! bearer token to a [`schoolyard_models::SchoolUser`] with roles and
//! profiles loaded. Guards then check roles against the database, not the
//! token:
//!
//! | Guard | Roles |
//! |-------|-------|
//! | administrator | Admin, Principal, Vice Principal |
//! | staff | Admin and every school staff role |
//!
//! The first principal is created through `POST /api/school/principal`;
//! platform admins only through `schoolyard-cli create-admin`.
//!
//! ## API documentation
//!
//! - Swagger UI: `http://localhost:3000/swagger-ui`
//! - Scalar: `http://localhost:3000/scalar`

pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod validator;

// Re-export workspace crates for convenience
pub use schoolyard_auth;
pub use schoolyard_config;
pub use schoolyard_core;
pub use schoolyard_db;
pub use schoolyard_models;
