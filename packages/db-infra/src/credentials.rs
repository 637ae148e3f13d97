//! Password hash inspection and rotation for admin/employee accounts.
//!
//! Hashes are bcrypt. Rotation overwrites the stored hash directly; every
//! write emits an `audit` event (never the plaintext or the hash).

use sea_orm::{ConnectionTrait, DatabaseBackend, Statement, Value};
use tracing::{info, warn};

use crate::error::DbInfraError;
use crate::infra::db::ident::{quote_ident, validate_ident};

pub use bcrypt::DEFAULT_COST;

/// Where an account's login name and password hash live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialTable {
    pub table: String,
    pub username_column: String,
    pub hash_column: String,
}

impl CredentialTable {
    pub fn new(
        table: impl Into<String>,
        username_column: impl Into<String>,
        hash_column: impl Into<String>,
    ) -> Result<Self, DbInfraError> {
        let t = Self {
            table: table.into(),
            username_column: username_column.into(),
            hash_column: hash_column.into(),
        };
        validate_ident(&t.table)?;
        validate_ident(&t.username_column)?;
        validate_ident(&t.hash_column)?;
        Ok(t)
    }

    pub fn admins() -> Self {
        Self {
            table: "admins".into(),
            username_column: "username".into(),
            hash_column: "password_hash".into(),
        }
    }

    pub fn employees() -> Self {
        Self {
            table: "employees".into(),
            username_column: "username".into(),
            hash_column: "password_hash".into(),
        }
    }

    fn quoted(&self) -> Result<(String, String, String), DbInfraError> {
        Ok((
            quote_ident(&self.table)?,
            quote_ident(&self.username_column)?,
            quote_ident(&self.hash_column)?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub username: String,
    /// The candidate that matched, if any.
    pub matched: Option<String>,
    /// How many candidates were compared before stopping.
    pub checked: usize,
}

impl VerifyReport {
    pub fn verified(&self) -> bool {
        self.matched.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Updated,
    Inserted,
}

pub fn hash_password(plain: &str, cost: u32) -> Result<String, DbInfraError> {
    Ok(bcrypt::hash(plain, cost)?)
}

/// Compare every candidate against `hash`, in order.
pub fn verify_each<S: AsRef<str>>(hash: &str, candidates: &[S]) -> Result<Vec<bool>, DbInfraError> {
    candidates
        .iter()
        .map(|c| Ok(bcrypt::verify(c.as_ref(), hash)?))
        .collect()
}

/// The first candidate matching `hash`; stops comparing once one matches.
pub fn first_match<S: AsRef<str>>(
    hash: &str,
    candidates: &[S],
) -> Result<(Option<String>, usize), DbInfraError> {
    for (i, candidate) in candidates.iter().enumerate() {
        if bcrypt::verify(candidate.as_ref(), hash)? {
            return Ok((Some(candidate.as_ref().to_string()), i + 1));
        }
    }
    Ok((None, candidates.len()))
}

fn placeholder(backend: DatabaseBackend, n: usize) -> String {
    match backend {
        DatabaseBackend::Postgres => format!("${n}"),
        _ => "?".to_string(),
    }
}

/// Stored hash for `username`, or `None` if the account doesn't exist.
pub async fn fetch_hash<C: ConnectionTrait>(
    conn: &C,
    target: &CredentialTable,
    username: &str,
) -> Result<Option<String>, DbInfraError> {
    let backend = conn.get_database_backend();
    let (table, user_col, hash_col) = target.quoted()?;
    let sql = format!(
        "SELECT {hash_col} AS hash FROM {table} WHERE {user_col} = {}",
        placeholder(backend, 1)
    );
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, vec![username.into()]))
        .await?;
    match row {
        Some(row) => Ok(row.try_get::<Option<String>>("", "hash")?),
        None => Ok(None),
    }
}

/// Check `candidates` against the stored hash of `username`.
pub async fn verify_stored<C: ConnectionTrait, S: AsRef<str>>(
    conn: &C,
    target: &CredentialTable,
    username: &str,
    candidates: &[S],
) -> Result<VerifyReport, DbInfraError> {
    let hash = fetch_hash(conn, target, username)
        .await?
        .ok_or_else(|| DbInfraError::not_found(format!("{} '{username}'", target.table)))?;

    let (matched, checked) = first_match(&hash, candidates)?;
    info!(
        verify = if matched.is_some() { "match" } else { "no_match" },
        table = %target.table,
        username = %username,
        checked
    );
    Ok(VerifyReport {
        username: username.to_string(),
        matched,
        checked,
    })
}

/// Overwrite the stored hash of `username` with a fresh hash of `plain`.
///
/// Only the targeted row is touched; an unknown username is `NotFound`.
pub async fn rotate_password<C: ConnectionTrait>(
    conn: &C,
    target: &CredentialTable,
    username: &str,
    plain: &str,
    cost: u32,
) -> Result<u64, DbInfraError> {
    let backend = conn.get_database_backend();
    let (table, user_col, hash_col) = target.quoted()?;
    let hash = hash_password(plain, cost)?;

    let sql = format!(
        "UPDATE {table} SET {hash_col} = {} WHERE {user_col} = {}",
        placeholder(backend, 1),
        placeholder(backend, 2)
    );
    let values: Vec<Value> = vec![hash.into(), username.into()];
    let rows = conn
        .execute(Statement::from_sql_and_values(backend, sql, values))
        .await?
        .rows_affected();

    if rows == 0 {
        return Err(DbInfraError::not_found(format!(
            "{} '{username}'",
            target.table
        )));
    }
    warn!(audit = "credential_rotated", table = %target.table, username = %username, rows);
    Ok(rows)
}

/// Rotate when the account exists, otherwise insert a minimal row.
///
/// The insert only fills the username and hash columns, so it works for
/// tables whose other columns are nullable or defaulted (e.g. `admins`).
pub async fn upsert_account<C: ConnectionTrait>(
    conn: &C,
    target: &CredentialTable,
    username: &str,
    plain: &str,
    cost: u32,
) -> Result<UpsertOutcome, DbInfraError> {
    if account_exists(conn, target, username).await? {
        rotate_password(conn, target, username, plain, cost).await?;
        return Ok(UpsertOutcome::Updated);
    }

    let backend = conn.get_database_backend();
    let (table, user_col, hash_col) = target.quoted()?;
    let sql = format!(
        "INSERT INTO {table} ({user_col}, {hash_col}) VALUES ({}, {})",
        placeholder(backend, 1),
        placeholder(backend, 2)
    );
    let hash = hash_password(plain, cost)?;
    let values: Vec<Value> = vec![username.into(), hash.into()];
    conn.execute(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    warn!(audit = "credential_created", table = %target.table, username = %username);
    Ok(UpsertOutcome::Inserted)
}

async fn account_exists<C: ConnectionTrait>(
    conn: &C,
    target: &CredentialTable,
    username: &str,
) -> Result<bool, DbInfraError> {
    let backend = conn.get_database_backend();
    let (table, user_col, _) = target.quoted()?;
    let sql = format!(
        "SELECT COUNT(*) AS n FROM {table} WHERE {user_col} = {}",
        placeholder(backend, 1)
    );
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, vec![username.into()]))
        .await?
        .ok_or_else(|| DbInfraError::config("COUNT(*) returned no row"))?;
    Ok(row.try_get::<i64>("", "n")? > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin123_matches_only_itself() {
        let hash = hash_password("admin123", 4).unwrap();
        let verdicts = verify_each(&hash, &["admin123", "admin1", "123456"]).unwrap();
        assert_eq!(verdicts, vec![true, false, false]);
    }

    #[test]
    fn first_match_stops_early() {
        let hash = hash_password("123456", 4).unwrap();
        let (matched, checked) = first_match(&hash, &["admin123", "123456", "admin1"]).unwrap();
        assert_eq!(matched.as_deref(), Some("123456"));
        assert_eq!(checked, 2);

        let (none, checked) = first_match(&hash, &["nope"]).unwrap();
        assert_eq!(none, None);
        assert_eq!(checked, 1);
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_mismatch() {
        assert!(verify_each("not-a-bcrypt-hash", &["x"]).is_err());
    }

    #[test]
    fn credential_table_validates_identifiers() {
        assert!(CredentialTable::new("admins", "username", "password_hash").is_ok());
        assert!(CredentialTable::new("admins", "user name", "password_hash").is_err());
    }
}
