//! Throwaway SQLite databases for tests.

use std::path::Path;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Open a private in-memory SQLite database.
///
/// The pool is pinned to a single connection: every SQLite `:memory:`
/// connection is its own database, so a second pooled connection would see
/// an empty schema.
pub async fn sqlite_memory() -> Result<DatabaseConnection, DbErr> {
    crate::logging::init();
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.min_connections(1)
        .max_connections(1)
        .sqlx_logging(false);
    Database::connect(opt).await
}

/// Open (creating if needed) a SQLite database file at `path`.
pub async fn sqlite_file(path: &Path) -> Result<DatabaseConnection, DbErr> {
    crate::logging::init();
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let mut opt = ConnectOptions::new(url);
    opt.min_connections(1)
        .max_connections(1)
        .sqlx_logging(false);
    Database::connect(opt).await
}
