//! Idempotent schema evolution: check the catalog, create only what is missing.
//!
//! Every `ensure_*` call reports which branch it took. DDL errors are logged
//! and returned as-is; nothing is wrapped in a transaction or retried.

use migration::evolve;
use sea_orm::sea_query::{Alias, ColumnDef, Expr, Table, TableCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement, Value};
use tracing::{error, info};

use crate::error::DbInfraError;
use crate::infra::db::ident::{
    quote_ident, validate_fragment, validate_ident, validate_sql_type,
};

pub use migration::evolve::EnsureOutcome;

/// Column to add when missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub table: String,
    pub column: String,
    /// Database type, e.g. `JSONB` or `VARCHAR(32)`.
    pub sql_type: String,
    pub nullable: bool,
    /// SQL expression used as `DEFAULT`, e.g. `'{}'` or `0`.
    pub default_sql: Option<String>,
}

impl ColumnSpec {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        sql_type: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            sql_type: sql_type.into(),
            nullable: true,
            default_sql: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_sql(mut self, expr: impl Into<String>) -> Self {
        self.default_sql = Some(expr.into());
        self
    }

    fn validate(&self) -> Result<(), DbInfraError> {
        validate_ident(&self.table)?;
        validate_ident(&self.column)?;
        validate_sql_type(&self.sql_type)?;
        if let Some(default) = &self.default_sql {
            validate_fragment(default)?;
        }
        Ok(())
    }

    fn to_alter(&self) -> sea_orm::sea_query::TableAlterStatement {
        let mut def = ColumnDef::new(Alias::new(&self.column));
        def.custom(Alias::new(&self.sql_type));
        if !self.nullable {
            def.not_null();
        }
        if let Some(default) = &self.default_sql {
            def.default(Expr::cust(default.clone()));
        }
        Table::alter()
            .table(Alias::new(&self.table))
            .add_column(def)
            .to_owned()
    }
}

/// PostgreSQL sequence to create when missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSpec {
    pub name: String,
    pub start: i64,
    pub increment: i64,
}

impl SequenceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: 1,
            increment: 1,
        }
    }
}

// ----------------------------------------------------------------------------
// Catalog lookups
// ----------------------------------------------------------------------------

async fn count_query<C: ConnectionTrait>(
    conn: &C,
    sql: &str,
    values: Vec<Value>,
) -> Result<i64, DbInfraError> {
    let backend = conn.get_database_backend();
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?
        .ok_or_else(|| DbInfraError::config("catalog query returned no row"))?;
    Ok(row.try_get::<i64>("", "n")?)
}

fn require_catalog(op: &'static str, backend: DatabaseBackend) -> Result<(), DbInfraError> {
    match backend {
        DatabaseBackend::Postgres | DatabaseBackend::Sqlite => Ok(()),
        other => Err(DbInfraError::unsupported(op, other)),
    }
}

pub async fn table_exists<C: ConnectionTrait>(
    conn: &C,
    table: &str,
) -> Result<bool, DbInfraError> {
    validate_ident(table)?;
    require_catalog("table_exists", conn.get_database_backend())?;
    Ok(evolve::table_exists(conn, table).await?)
}

pub async fn column_exists<C: ConnectionTrait>(
    conn: &C,
    table: &str,
    column: &str,
) -> Result<bool, DbInfraError> {
    validate_ident(table)?;
    validate_ident(column)?;
    require_catalog("column_exists", conn.get_database_backend())?;
    Ok(evolve::column_exists(conn, table, column).await?)
}

pub async fn sequence_exists<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<bool, DbInfraError> {
    validate_ident(name)?;
    match conn.get_database_backend() {
        DatabaseBackend::Postgres => {
            let sql = "SELECT COUNT(*) AS n FROM pg_sequences \
                       WHERE schemaname = current_schema() AND sequencename = $1";
            Ok(count_query(conn, sql, vec![name.into()]).await? > 0)
        }
        other => Err(DbInfraError::unsupported("sequences", other)),
    }
}

// ----------------------------------------------------------------------------
// Ensure operations
// ----------------------------------------------------------------------------

fn ddl_failed(what: &str, e: sea_orm::DbErr) -> DbInfraError {
    error!(ensure = "failed", target = what, error = %e);
    DbInfraError::Db(e)
}

async fn run_ddl<C: ConnectionTrait>(
    conn: &C,
    stmt: Statement,
    what: &str,
) -> Result<(), DbInfraError> {
    conn.execute(stmt).await.map_err(|e| ddl_failed(what, e))?;
    Ok(())
}

/// Add `spec.column` to `spec.table` unless it already exists.
pub async fn ensure_column<C: ConnectionTrait>(
    conn: &C,
    spec: &ColumnSpec,
) -> Result<EnsureOutcome, DbInfraError> {
    spec.validate()?;

    if !table_exists(conn, &spec.table).await? {
        return Err(DbInfraError::not_found(format!("table {}", spec.table)));
    }

    let outcome =
        evolve::add_column_if_missing(conn, &spec.table, &spec.column, &spec.to_alter())
            .await
            .map_err(|e| ddl_failed(&format!("{}.{}", spec.table, spec.column), e))?;
    if outcome == EnsureOutcome::Created {
        info!(table = %spec.table, column = %spec.column, sql_type = %spec.sql_type);
    }
    Ok(outcome)
}

/// Create `table` from `stmt` unless it already exists.
pub async fn ensure_table<C: ConnectionTrait>(
    conn: &C,
    table: &str,
    stmt: &TableCreateStatement,
) -> Result<EnsureOutcome, DbInfraError> {
    if table_exists(conn, table).await? {
        info!(ensure = "present", table = %table);
        return Ok(EnsureOutcome::AlreadyPresent);
    }

    let backend = conn.get_database_backend();
    run_ddl(conn, backend.build(stmt), table).await?;
    info!(ensure = "created", table = %table);
    Ok(EnsureOutcome::Created)
}

/// Create a sequence unless it already exists (PostgreSQL only).
pub async fn ensure_sequence<C: ConnectionTrait>(
    conn: &C,
    spec: &SequenceSpec,
) -> Result<EnsureOutcome, DbInfraError> {
    if sequence_exists(conn, &spec.name).await? {
        info!(ensure = "present", sequence = %spec.name);
        return Ok(EnsureOutcome::AlreadyPresent);
    }

    let sql = format!(
        "CREATE SEQUENCE {} START WITH {} INCREMENT BY {}",
        quote_ident(&spec.name)?,
        spec.start,
        spec.increment
    );
    let stmt = Statement::from_string(DatabaseBackend::Postgres, sql);
    run_ddl(conn, stmt, &spec.name).await?;
    info!(ensure = "created", sequence = %spec.name, start = spec.start);
    Ok(EnsureOutcome::Created)
}

/// Move the serial sequence behind `table.column` past the current maximum.
///
/// Needed after rows were inserted with explicit ids. Returns the new value.
pub async fn sync_sequence<C: ConnectionTrait>(
    conn: &C,
    table: &str,
    column: &str,
) -> Result<i64, DbInfraError> {
    let backend = conn.get_database_backend();
    if backend != DatabaseBackend::Postgres {
        return Err(DbInfraError::unsupported("sequences", backend));
    }

    let sql = format!(
        "SELECT setval(pg_get_serial_sequence($1, $2), \
         COALESCE((SELECT MAX({col}) FROM {tbl}), 1)) AS n",
        col = quote_ident(column)?,
        tbl = quote_ident(table)?,
    );
    let row = conn
        .query_one(Statement::from_sql_and_values(
            backend,
            sql,
            vec![table.into(), column.into()],
        ))
        .await?
        .ok_or_else(|| DbInfraError::config("setval returned no row"))?;
    let value = synced_value(row.try_get::<Option<i64>>("", "n")?, table, column)?;
    info!(sequence = "synced", table = %table, column = %column, value);
    Ok(value)
}

/// `setval` yields NULL when the column has no serial sequence behind it.
fn synced_value(raw: Option<i64>, table: &str, column: &str) -> Result<i64, DbInfraError> {
    raw.ok_or_else(|| DbInfraError::not_found(format!("serial sequence for {table}.{column}")))
}
