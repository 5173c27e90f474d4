//! # Schoolyard CLI
//!
//! Administrative bootstrap and database seeding for development.
//!
//! ## Usage
//!
//! ```ignore
//! use schoolyard_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::default().with_students(200);
//! seed_all(&pool, config).await?;
//! ```

pub mod admin;
pub mod seeder;
