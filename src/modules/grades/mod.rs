pub mod controller;
pub mod factory;
pub mod router;
pub mod service;

pub use router::init_grades_router;
