pub mod backfill;
pub mod core;
pub mod ident;
pub mod inspect;
pub mod locking;
pub mod purge;
pub mod schema;

pub use backfill::{backfill, BackfillSpec};
pub use core::{
    build_admin_pool, close_pool, orchestrate_migration, orchestrate_migration_internal,
    sanitize_db_url,
};
pub use locking::{BootstrapLock, Guard, InMemoryLock, PgAdvisoryLock, SqliteFileLock};
pub use schema::{
    ensure_column, ensure_sequence, ensure_table, ColumnSpec, EnsureOutcome, SequenceSpec,
};
