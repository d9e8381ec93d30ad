//! Persistence layer modules.

pub mod blocker_repo;
pub mod completed_repo;
pub mod db;
pub mod job_repo;
pub mod schema;
pub mod state_repo;
pub mod task_repo;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;
