//! Read-only inspection: tables, columns, counts, samples, ad-hoc selects.

use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseBackend, FromQueryResult, JsonValue, Statement,
    TransactionTrait,
};
use serde::Serialize;

use crate::error::DbInfraError;
use crate::infra::db::ident::{quote_ident, validate_ident};

/// Upper bound on rows returned by [`sample_rows`] and [`run_select`].
pub const MAX_ROWS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct NameRow {
    name: String,
}

#[derive(Debug, FromQueryResult)]
struct PgColumnRow {
    column_name: String,
    data_type: String,
    is_nullable: String,
    column_default: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct SqliteColumnRow {
    name: String,
    data_type: String,
    not_null: i64,
    dflt_value: Option<String>,
}

pub async fn list_tables<C: ConnectionTrait>(conn: &C) -> Result<Vec<String>, DbInfraError> {
    let backend = conn.get_database_backend();
    let sql = match backend {
        DatabaseBackend::Postgres => {
            "SELECT table_name::text AS name FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
             ORDER BY table_name"
        }
        DatabaseBackend::Sqlite => {
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
        }
        other => return Err(DbInfraError::unsupported("list_tables", other)),
    };
    let rows = NameRow::find_by_statement(Statement::from_string(backend, sql))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|r| r.name).collect())
}

pub async fn describe_table<C: ConnectionTrait>(
    conn: &C,
    table: &str,
) -> Result<Vec<ColumnInfo>, DbInfraError> {
    validate_ident(table)?;
    let backend = conn.get_database_backend();
    let columns: Vec<ColumnInfo> = match backend {
        DatabaseBackend::Postgres => {
            let stmt = Statement::from_sql_and_values(
                backend,
                "SELECT column_name::text AS column_name, data_type::text AS data_type, \
                 is_nullable::text AS is_nullable, column_default::text AS column_default \
                 FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name = $1 \
                 ORDER BY ordinal_position",
                vec![table.into()],
            );
            PgColumnRow::find_by_statement(stmt)
                .all(conn)
                .await?
                .into_iter()
                .map(|r| ColumnInfo {
                    name: r.column_name,
                    data_type: r.data_type,
                    nullable: r.is_nullable == "YES",
                    default: r.column_default,
                })
                .collect()
        }
        DatabaseBackend::Sqlite => {
            let stmt = Statement::from_sql_and_values(
                backend,
                "SELECT name, type AS data_type, \"notnull\" AS not_null, dflt_value \
                 FROM pragma_table_info(?) ORDER BY cid",
                vec![table.into()],
            );
            SqliteColumnRow::find_by_statement(stmt)
                .all(conn)
                .await?
                .into_iter()
                .map(|r| ColumnInfo {
                    name: r.name,
                    data_type: r.data_type,
                    nullable: r.not_null == 0,
                    default: r.dflt_value,
                })
                .collect()
        }
        other => return Err(DbInfraError::unsupported("describe_table", other)),
    };

    if columns.is_empty() {
        return Err(DbInfraError::not_found(format!("table {table}")));
    }
    Ok(columns)
}

pub async fn count_rows<C: ConnectionTrait>(conn: &C, table: &str) -> Result<i64, DbInfraError> {
    let backend = conn.get_database_backend();
    let sql = format!("SELECT COUNT(*) AS n FROM {}", quote_ident(table)?);
    let row = conn
        .query_one(Statement::from_string(backend, sql))
        .await?
        .ok_or_else(|| DbInfraError::config("COUNT(*) returned no row"))?;
    Ok(row.try_get::<i64>("", "n")?)
}

/// First `limit` rows of `table` as JSON objects.
pub async fn sample_rows<C: ConnectionTrait>(
    conn: &C,
    table: &str,
    limit: u64,
) -> Result<Vec<JsonValue>, DbInfraError> {
    let backend = conn.get_database_backend();
    let sql = format!(
        "SELECT * FROM {} LIMIT {}",
        quote_ident(table)?,
        limit.min(MAX_ROWS)
    );
    Ok(JsonValue::find_by_statement(Statement::from_string(backend, sql))
        .all(conn)
        .await?)
}

/// Run a single read-only query and return its rows as JSON objects.
///
/// Only `SELECT`/`WITH` statements are accepted and at most [`MAX_ROWS`] rows
/// are returned. The query runs in a transaction the database itself keeps
/// read-only, and that transaction is always rolled back.
pub async fn run_select<C>(conn: &C, sql: &str) -> Result<Vec<JsonValue>, DbInfraError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let sql = ensure_read_only(sql)?;
    let stmt = Statement::from_string(conn.get_database_backend(), sql.to_string());
    let mut rows = query_read_only(conn, stmt).await?;
    rows.truncate(MAX_ROWS as usize);
    Ok(rows)
}

async fn query_read_only<C>(conn: &C, stmt: Statement) -> Result<Vec<JsonValue>, DbInfraError>
where
    C: ConnectionTrait + TransactionTrait,
{
    match conn.get_database_backend() {
        DatabaseBackend::Postgres => {
            let txn = conn
                .begin_with_config(None, Some(AccessMode::ReadOnly))
                .await?;
            let rows = JsonValue::find_by_statement(stmt).all(&txn).await;
            txn.rollback().await?;
            Ok(rows?)
        }
        DatabaseBackend::Sqlite => {
            // SQLite ignores transaction access modes; query_only is per connection.
            let txn = conn.begin().await?;
            txn.execute_unprepared("PRAGMA query_only = ON").await?;
            let rows = JsonValue::find_by_statement(stmt).all(&txn).await;
            txn.execute_unprepared("PRAGMA query_only = OFF").await?;
            txn.rollback().await?;
            Ok(rows?)
        }
        other => Err(DbInfraError::unsupported("run_select", other)),
    }
}

/// Keywords that never belong in an inspection query, matched as whole words
/// outside quoted text and comments.
const WRITE_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "MERGE", "DROP", "ALTER", "TRUNCATE", "CREATE", "GRANT",
    "REVOKE", "ATTACH", "DETACH", "VACUUM", "REINDEX", "PRAGMA", "COPY",
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lexing {
    Code,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
}

/// Upper-cased bare words of `sql` and the byte offset where the statement
/// ends (a trailing `;` or the end of input).
fn scan_words(sql: &str) -> Result<(Vec<String>, usize), DbInfraError> {
    let mut state = Lexing::Code;
    let mut words = Vec::new();
    let mut word = String::new();
    let mut end = sql.len();
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match state {
            Lexing::Code => {
                if c.is_ascii_alphanumeric() || c == '_' {
                    word.push(c.to_ascii_uppercase());
                    continue;
                }
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
                match (c, next) {
                    ('\'', _) => state = Lexing::SingleQuoted,
                    ('"', _) => state = Lexing::DoubleQuoted,
                    ('-', Some('-')) => {
                        chars.next();
                        state = Lexing::LineComment;
                    }
                    ('/', Some('*')) => {
                        chars.next();
                        state = Lexing::BlockComment;
                    }
                    (';', _) => {
                        if !sql[i + 1..].trim().is_empty() {
                            return Err(DbInfraError::rejected(
                                "only a single statement is allowed",
                            ));
                        }
                        end = i;
                        break;
                    }
                    _ => {}
                }
            }
            Lexing::SingleQuoted if c == '\'' => state = Lexing::Code,
            Lexing::DoubleQuoted if c == '"' => state = Lexing::Code,
            Lexing::LineComment if c == '\n' => state = Lexing::Code,
            Lexing::BlockComment if c == '*' && next == Some('/') => {
                chars.next();
                state = Lexing::Code;
            }
            _ => {}
        }
    }
    if !word.is_empty() {
        words.push(word);
    }
    if matches!(state, Lexing::SingleQuoted | Lexing::DoubleQuoted) {
        return Err(DbInfraError::rejected("unterminated quoted text"));
    }
    Ok((words, end))
}

fn ensure_read_only(sql: &str) -> Result<&str, DbInfraError> {
    let (words, end) = scan_words(sql)?;
    let first = words.first().map(String::as_str).unwrap_or_default();
    if first != "SELECT" && first != "WITH" {
        return Err(DbInfraError::rejected(format!(
            "only SELECT/WITH queries are allowed, got '{first}'"
        )));
    }
    if let Some(verb) = words.iter().find(|w| WRITE_KEYWORDS.contains(&w.as_str())) {
        return Err(DbInfraError::rejected(format!(
            "query contains a write keyword ({verb})"
        )));
    }
    Ok(sql[..end].trim())
}

#[cfg(test)]
mod tests {
    use migration::{migrate, MigrationCommand};
    use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
    use test_support::db::sqlite_memory;

    use super::{count_rows, ensure_read_only, query_read_only};

    #[test]
    fn accepts_selects_and_strips_trailing_semicolon() {
        assert_eq!(
            ensure_read_only("  select id from salons; ").unwrap(),
            "select id from salons"
        );
        assert!(ensure_read_only("WITH x AS (SELECT 1) SELECT * FROM x").is_ok());
    }

    #[test]
    fn rejects_writes_and_stacked_statements() {
        assert!(ensure_read_only("DELETE FROM salons").is_err());
        assert!(ensure_read_only("SELECT 1; DROP TABLE salons").is_err());
        assert!(
            ensure_read_only("WITH d AS (DELETE FROM admins RETURNING *) SELECT * FROM d")
                .is_err()
        );
        assert!(ensure_read_only("").is_err());
    }

    #[test]
    fn write_keywords_are_caught_across_any_whitespace() {
        for sql in [
            "WITH d AS (DELETE\nFROM admins RETURNING *) SELECT * FROM d",
            "WITH d AS (DELETE\tFROM admins RETURNING *) SELECT * FROM d",
            "WITH u AS (UPDATE\r\nsalons SET name = 'x' RETURNING id) SELECT * FROM u",
            "SELECT 1;\nDROP TABLE salons",
        ] {
            assert!(ensure_read_only(sql).is_err(), "accepted: {sql:?}");
        }
    }

    #[test]
    fn keywords_inside_quotes_and_comments_are_ignored() {
        let sql = "SELECT id FROM messages WHERE body = 'please UPDATE me; thanks'";
        assert_eq!(ensure_read_only(sql).unwrap(), sql);
        assert!(ensure_read_only(r#"SELECT "delete" FROM flags -- drop later"#).is_ok());
        assert!(ensure_read_only("SELECT 1 /* insert */").is_ok());
        assert!(ensure_read_only("SELECT 'it''s fine'").is_ok());
        assert!(ensure_read_only("SELECT 'unterminated").is_err());
    }

    #[tokio::test]
    async fn database_refuses_writes_that_reach_it() {
        let db = sqlite_memory().await.expect("open sqlite");
        migrate(&db, MigrationCommand::Up).await.expect("up");
        db.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "INSERT INTO salons (name, slug) VALUES ('Main', 'main')",
        ))
        .await
        .unwrap();

        let delete = Statement::from_string(DatabaseBackend::Sqlite, "DELETE FROM salons");
        assert!(query_read_only(&db, delete).await.is_err());
        assert_eq!(count_rows(&db, "salons").await.unwrap(), 1);

        // The connection is writable again once the read-only query is done.
        db.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "INSERT INTO salons (name, slug) VALUES ('Annex', 'annex')",
        ))
        .await
        .unwrap();
        assert_eq!(count_rows(&db, "salons").await.unwrap(), 2);
    }
}
