pub mod controller;
pub mod router;
pub mod service;

pub use router::init_import_tasks_router;
