// Standard library imports
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

// External crate imports
use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

// Internal crate imports
use crate::error::DbInfraError;

/// Advisory lock id for a textual key. Stable across processes and hosts.
pub fn pg_lock_id(key: &str) -> i64 {
    xxh3_64(key.as_bytes()) as i64
}

// ============================================================================
// Guard
// ============================================================================

/// A held migration lock. Call [`Guard::release`] when done; dropping a
/// SQLite guard also releases the OS lock, a Postgres guard is released when
/// its session ends.
pub enum Guard {
    Postgres {
        admin_pool: DatabaseConnection,
        lock_key: i64,
    },
    SqliteFile {
        file: File,
        lock_path: PathBuf,
    },
    Noop,
}

impl Guard {
    pub async fn release(self) -> Result<(), DbInfraError> {
        match self {
            Guard::Noop => Ok(()),
            Guard::SqliteFile { file, lock_path } => {
                use fs4::fs_std::FileExt;

                // Unlock errors are benign here: dropping the handle releases the lock.
                match FileExt::unlock(&file) {
                    Ok(()) => debug!(lock_path = %lock_path.display(), "SQLite file lock released"),
                    Err(e) => debug!(
                        error = %e,
                        lock_path = %lock_path.display(),
                        "SQLite file unlock returned error (may be benign)"
                    ),
                }
                Ok(())
            }
            Guard::Postgres {
                admin_pool,
                lock_key,
            } => {
                let stmt = Statement::from_sql_and_values(
                    DatabaseBackend::Postgres,
                    "SELECT pg_advisory_unlock($1) AS unlocked",
                    vec![lock_key.into()],
                );

                match admin_pool.query_one(stmt).await {
                    Ok(Some(row)) => {
                        let unlocked: bool = row.try_get("", "unlocked").map_err(|e| {
                            DbInfraError::lock(format!("failed to read unlock result: {e}"))
                        })?;
                        if !unlocked {
                            warn!(
                                code = "PG_UNLOCK_FALSE",
                                lock_key,
                                "Advisory lock unlock returned false"
                            );
                        }
                    }
                    Ok(None) => warn!(lock_key, "No result from advisory lock unlock query"),
                    Err(e) => warn!(error = %e, lock_key, "Failed to unlock advisory lock"),
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// BootstrapLock
// ============================================================================

/// Non-blocking lock acquisition for the migration runner.
#[async_trait]
pub trait BootstrapLock {
    /// `Some(Guard)` if acquired, `None` if another process holds it.
    async fn try_acquire(&mut self) -> Result<Option<Guard>, DbInfraError>;
}

/// PostgreSQL session-level advisory lock.
///
/// INVARIANT: the admin pool is configured with min=max=1 so the unlock runs on
/// the same physical session that took the lock.
pub struct PgAdvisoryLock {
    admin_pool: DatabaseConnection,
    lock_key: i64,
}

impl PgAdvisoryLock {
    pub fn new(admin_pool: DatabaseConnection, key: &str) -> Self {
        Self {
            admin_pool,
            lock_key: pg_lock_id(key),
        }
    }
}

#[async_trait]
impl BootstrapLock for PgAdvisoryLock {
    async fn try_acquire(&mut self) -> Result<Option<Guard>, DbInfraError> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT pg_try_advisory_lock($1) AS locked",
            vec![self.lock_key.into()],
        );

        let row = self
            .admin_pool
            .query_one(stmt)
            .await
            .map_err(|e| DbInfraError::lock(format!("failed to acquire advisory lock: {e}")))?
            .ok_or_else(|| DbInfraError::lock("pg_try_advisory_lock returned no row"))?;

        let locked: bool = row
            .try_get("", "locked")
            .map_err(|e| DbInfraError::lock(format!("failed to read lock result: {e}")))?;

        Ok(locked.then(|| Guard::Postgres {
            admin_pool: self.admin_pool.clone(),
            lock_key: self.lock_key,
        }))
    }
}

/// Exclusive OS file lock on `<db>.migrate.lock`, shared by every process
/// that resolves the same path.
pub struct SqliteFileLock {
    lock_path: PathBuf,
}

impl SqliteFileLock {
    pub fn new(lock_path: &Path) -> Self {
        Self {
            lock_path: lock_path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

#[async_trait]
impl BootstrapLock for SqliteFileLock {
    async fn try_acquire(&mut self) -> Result<Option<Guard>, DbInfraError> {
        use fs4::fs_std::FileExt;

        if let Some(parent) = self.lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DbInfraError::lock(format!("failed to create lock file parent directory: {e}"))
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| DbInfraError::lock(format!("failed to open lock file: {e}")))?;

        // Ok(true) = acquired, Ok(false) = held elsewhere
        match file.try_lock_exclusive() {
            Ok(true) => {
                debug!(lock_path = %self.lock_path.display(), "SQLite file lock acquired");
                Ok(Some(Guard::SqliteFile {
                    file,
                    lock_path: self.lock_path.clone(),
                }))
            }
            Ok(false) => {
                debug!(lock_path = %self.lock_path.display(), "SQLite file lock contended");
                Ok(None)
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(DbInfraError::lock(format!(
                "failed to acquire SQLite file lock: {e}"
            ))),
        }
    }
}

/// In-memory databases live in one process; nothing to serialize.
pub struct InMemoryLock;

#[async_trait]
impl BootstrapLock for InMemoryLock {
    async fn try_acquire(&mut self) -> Result<Option<Guard>, DbInfraError> {
        Ok(Some(Guard::Noop))
    }
}

#[cfg(test)]
mod tests {
    use super::pg_lock_id;

    #[test]
    fn lock_id_is_deterministic_per_key() {
        assert_eq!(pg_lock_id("salon:migrate:a"), pg_lock_id("salon:migrate:a"));
        assert_ne!(pg_lock_id("salon:migrate:a"), pg_lock_id("salon:migrate:b"));
    }
}
