//! Database plumbing for the salon operations toolkit.
//!
//! Connection setup, the migration runner, idempotent schema evolution,
//! backfills, inspection and credential maintenance. Used by the admin CLI.

pub mod config;
pub mod credentials;
pub mod error;
pub mod infra;

pub use config::db;
pub use error::DbInfraError;
pub use infra::db::core::{
    build_admin_pool, close_pool, orchestrate_migration, orchestrate_migration_internal,
};
