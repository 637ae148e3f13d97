//! Check-then-act schema steps shared by the migrations and the admin CLI.
//!
//! Each step asks the catalog first and only issues DDL/DML when the target
//! state is missing, so re-running a step is a no-op.

use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr, Statement, Value};
use sea_orm_migration::sea_query::{TableAlterStatement, UpdateStatement};
use tracing::info;

/// Which branch an idempotent step took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    AlreadyPresent,
}

impl EnsureOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            EnsureOutcome::Created => "created",
            EnsureOutcome::AlreadyPresent => "present",
        }
    }
}

async fn count<C: ConnectionTrait>(
    conn: &C,
    sql: &str,
    values: Vec<Value>,
) -> Result<i64, DbErr> {
    let backend = conn.get_database_backend();
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?
        .ok_or_else(|| DbErr::Custom("catalog query returned no row".to_string()))?;
    row.try_get::<i64>("", "n")
}

fn unsupported(backend: DatabaseBackend) -> DbErr {
    DbErr::Custom(format!("catalog lookups are not supported on {backend:?}"))
}

pub async fn table_exists<C: ConnectionTrait>(conn: &C, table: &str) -> Result<bool, DbErr> {
    let sql = match conn.get_database_backend() {
        DatabaseBackend::Postgres => {
            "SELECT COUNT(*) AS n FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1"
        }
        DatabaseBackend::Sqlite => {
            "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = ?"
        }
        other => return Err(unsupported(other)),
    };
    Ok(count(conn, sql, vec![table.into()]).await? > 0)
}

pub async fn column_exists<C: ConnectionTrait>(
    conn: &C,
    table: &str,
    column: &str,
) -> Result<bool, DbErr> {
    let sql = match conn.get_database_backend() {
        DatabaseBackend::Postgres => {
            "SELECT COUNT(*) AS n FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2"
        }
        DatabaseBackend::Sqlite => {
            "SELECT COUNT(*) AS n FROM pragma_table_info(?) WHERE name = ?"
        }
        other => return Err(unsupported(other)),
    };
    Ok(count(conn, sql, vec![table.into(), column.into()]).await? > 0)
}

/// Run `alter` (an `ADD COLUMN`) unless `table.column` already exists.
///
/// SQLite accepts a single ALTER option per statement, so `alter` must add
/// exactly one column.
pub async fn add_column_if_missing<C: ConnectionTrait>(
    conn: &C,
    table: &str,
    column: &str,
    alter: &TableAlterStatement,
) -> Result<EnsureOutcome, DbErr> {
    if column_exists(conn, table, column).await? {
        info!(ensure = "present", table, column);
        return Ok(EnsureOutcome::AlreadyPresent);
    }

    let backend = conn.get_database_backend();
    conn.execute(backend.build(alter)).await?;
    info!(ensure = "created", table, column);
    Ok(EnsureOutcome::Created)
}

/// Run `alter` (a `DROP COLUMN`) only when `table.column` exists.
pub async fn drop_column_if_present<C: ConnectionTrait>(
    conn: &C,
    table: &str,
    column: &str,
    alter: &TableAlterStatement,
) -> Result<bool, DbErr> {
    if !column_exists(conn, table, column).await? {
        return Ok(false);
    }
    let backend = conn.get_database_backend();
    conn.execute(backend.build(alter)).await?;
    info!(dropped = "column", table, column);
    Ok(true)
}

/// Run a backfill `UPDATE` whose `WHERE` only matches unfilled rows.
///
/// Returns the rows touched; a second run returns 0.
pub async fn fill_missing<C: ConnectionTrait>(
    conn: &C,
    update: &UpdateStatement,
) -> Result<u64, DbErr> {
    let backend = conn.get_database_backend();
    Ok(conn.execute(backend.build(update)).await?.rows_affected())
}
