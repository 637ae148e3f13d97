use std::future::Future;
use std::time::{Duration, Instant};

use migration::{migrate, MigrationCommand, Migrator, MigratorTrait};
use rand::Rng;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use crate::config::db::{
    build_session_statements, make_conn_spec, migrate_lock_timeout_ms, sqlite_lock_path,
    validate_db_config, DbKind, RuntimeEnv,
};
use crate::error::DbInfraError;
use crate::infra::db::locking::{BootstrapLock, Guard, InMemoryLock, PgAdvisoryLock, SqliteFileLock};

const MIGRATION_BODY_TIMEOUT_MS: u64 = 120_000;

fn get_db_engine(db_kind: DbKind) -> &'static str {
    match db_kind {
        DbKind::Postgres => "postgresql",
        DbKind::SqliteFile | DbKind::SqliteMemory => "sqlite",
    }
}

async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval_ms: u64,
) -> Result<T, DbInfraError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbInfraError>>,
{
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match connect_fn().await {
            Ok(result) => {
                if attempt > 1 {
                    info!("connection_retry=success attempts={attempt} interval_ms={interval_ms}");
                }
                return Ok(result);
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < max_attempts {
                    warn!(
                        "connection_retry=failed attempt={attempt} \
                         max_attempts={max_attempts} interval_ms={interval_ms}"
                    );
                    tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| DbInfraError::config("no connection attempt was made")))
}

/// Open the single-connection pool every command runs on.
///
/// min=max=1: one session per invocation, and the advisory lock relies on it.
pub async fn build_admin_pool(
    env: RuntimeEnv,
    db_kind: DbKind,
) -> Result<DatabaseConnection, DbInfraError> {
    let url = make_conn_spec(env, db_kind)?;
    info!(
        "connect env={env:?} db_kind={db_kind:?} url={}",
        sanitize_db_url(&url)
    );

    let mut opt = ConnectOptions::new(&url);
    opt.min_connections(1)
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let pool = if matches!(db_kind, DbKind::Postgres) {
        retry_connection(
            || {
                let opt = opt.clone();
                async move {
                    Database::connect(opt).await.map_err(|e| {
                        DbInfraError::config(format!("failed to connect to Postgres: {e}"))
                    })
                }
            },
            5,
            500,
        )
        .await?
    } else {
        Database::connect(opt)
            .await
            .map_err(|e| DbInfraError::config(format!("failed to connect to SQLite: {e}")))?
    };

    Ok(pool)
}

/// Explicit teardown so the process never waits on an idle pool.
pub async fn close_pool(pool: DatabaseConnection) -> Result<(), DbInfraError> {
    pool.close().await?;
    info!("connection closed");
    Ok(())
}

/// Mask the password in a connection string for logs and lock keys.
pub fn sanitize_db_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((auth, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match auth.split_once(':') {
        Some((user, _password)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}

async fn fast_path_schema_check(conn: &DatabaseConnection) -> Result<bool, DbInfraError> {
    let expected_count = Migrator::migrations().len();
    let expected_last = Migrator::migrations()
        .last()
        .map(|m| m.name().to_string())
        .unwrap_or_default();

    let (current_count, current_last) = match Migrator::get_applied_migrations(conn).await {
        Ok(migrations) => (
            migrations.len(),
            migrations.last().map(|m| m.name().to_string()),
        ),
        Err(DbErr::Exec(_)) => {
            trace!(fastpath = "miss", reason = "ledger_table_missing");
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    let up_to_date = current_count == expected_count
        && !expected_last.is_empty()
        && current_last.as_deref() == Some(expected_last.as_str());

    trace!(
        fastpath = if up_to_date { "hit" } else { "miss" },
        current_count,
        expected_count,
        current_last = %current_last.as_deref().unwrap_or(""),
        expected_last = %expected_last
    );
    Ok(up_to_date)
}

/// Connect, run one ledger command under the migration lock, disconnect.
pub async fn orchestrate_migration(
    env: RuntimeEnv,
    db_kind: DbKind,
    command: MigrationCommand,
    cancellation_token: CancellationToken,
) -> Result<(), DbInfraError> {
    validate_db_config(env, db_kind)?;

    let admin_pool = build_admin_pool(env, db_kind).await?;
    let result =
        orchestrate_migration_internal(&admin_pool, env, db_kind, command, cancellation_token)
            .await;
    close_pool(admin_pool).await?;
    result
}

pub async fn orchestrate_migration_internal(
    pool: &DatabaseConnection,
    env: RuntimeEnv,
    db_kind: DbKind,
    command: MigrationCommand,
    cancellation_token: CancellationToken,
) -> Result<(), DbInfraError> {
    info!(
        "migrate=start env={env:?} db_kind={db_kind:?} engine={}",
        get_db_engine(db_kind)
    );

    if command.is_read_only() {
        migrate(pool, command).await?;
        info!("migrate=done");
        return Ok(());
    }

    let result = match db_kind {
        DbKind::Postgres => {
            let url = make_conn_spec(env, db_kind)?;
            let key = format!("salon:migrate:{db_kind:?}:{}", sanitize_db_url(&url));
            let lock = PgAdvisoryLock::new(pool.clone(), &key);
            migrate_with_lock(pool, lock, env, db_kind, command, cancellation_token).await
        }
        DbKind::SqliteMemory => {
            migrate_with_lock(pool, InMemoryLock, env, db_kind, command, cancellation_token)
                .await
        }
        DbKind::SqliteFile => {
            let lock = SqliteFileLock::new(&sqlite_lock_path(db_kind, env)?);
            migrate_with_lock(pool, lock, env, db_kind, command, cancellation_token).await
        }
    };

    if let Err(ref e) = result {
        if e.is_sqlite_busy() {
            error!("sqlite_busy op=migrate err={e}");
        }
    }

    info!("migrate=done");
    result
}

/// Acquire `lock` with capped exponential backoff, then run the command.
pub async fn migrate_with_lock<L>(
    pool: &DatabaseConnection,
    mut lock: L,
    env: RuntimeEnv,
    db_kind: DbKind,
    command: MigrationCommand,
    cancellation_token: CancellationToken,
) -> Result<(), DbInfraError>
where
    L: BootstrapLock,
{
    let lock_acquire_ms = migrate_lock_timeout_ms(env);
    info!(
        acquire_ms = lock_acquire_ms,
        env = ?env,
        db_kind = ?db_kind,
        "migration timeouts configured"
    );

    let start = Instant::now();
    let mut attempts: u32 = 0;
    let guard = loop {
        attempts += 1;

        if matches!(command, MigrationCommand::Up) && fast_path_schema_check(pool).await? {
            info!("migrate=skipped up_to_date=true");
            return Ok(());
        }

        if let Some(acquired) = lock.try_acquire().await? {
            trace!(
                lock = "won",
                attempts,
                elapsed_ms = start.elapsed().as_millis() as u64
            );
            break acquired;
        }

        let base_delay_ms = (5u64 << attempts.saturating_sub(1).min(8)).min(80);
        let jitter_ms = rand::rng().random_range(0..4u64);
        let delay_ms = base_delay_ms + jitter_ms;
        trace!(lock = "backoff", attempts, delay_ms);

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {
                if start.elapsed() >= Duration::from_millis(lock_acquire_ms) {
                    return Err(DbInfraError::lock(format!(
                        "migration lock acquisition timeout after {:?} ({attempts} attempts)",
                        start.elapsed()
                    )));
                }
            }
            _ = cancellation_token.cancelled() => {
                info!(attempts, "Migration cancelled during acquire backoff");
                return Err(DbInfraError::lock(format!(
                    "migration cancelled during acquire backoff after {}ms",
                    start.elapsed().as_millis()
                )));
            }
        }
    };

    let result = run_under_guard(pool, &guard, env, db_kind, command, cancellation_token).await;

    if let Err(release_err) = guard.release().await {
        warn!(error = %release_err, "Failed to release migration guard");
    }
    result
}

async fn run_under_guard(
    pool: &DatabaseConnection,
    _guard: &Guard,
    env: RuntimeEnv,
    db_kind: DbKind,
    command: MigrationCommand,
    cancellation_token: CancellationToken,
) -> Result<(), DbInfraError> {
    let start = Instant::now();

    apply_session_settings(pool, db_kind).await?;

    let pool_clone = pool.clone();
    let mut migration_task = tokio::spawn(async move { migrate(&pool_clone, command).await });

    tokio::select! {
        biased;

        task_result = &mut migration_task => {
            match task_result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(DbInfraError::Db(e)),
                Err(join_err) if join_err.is_panic() => {
                    return Err(DbInfraError::config("migration task panicked during execution"));
                }
                Err(_) => {
                    return Err(DbInfraError::config(
                        "migration task was aborted before completion",
                    ));
                }
            }
        }
        _ = tokio::time::sleep(Duration::from_millis(MIGRATION_BODY_TIMEOUT_MS)) => {
            migration_task.abort();
            let _ = migration_task.await;
            return Err(DbInfraError::config(format!(
                "migration body execution timed out after {MIGRATION_BODY_TIMEOUT_MS}ms"
            )));
        }
        _ = cancellation_token.cancelled() => {
            migration_task.abort();
            let _ = migration_task.await;
            return Err(DbInfraError::config(format!(
                "migration cancelled during body execution after {}ms",
                start.elapsed().as_millis()
            )));
        }
    }

    info!(
        migrator = "ran",
        env = ?env,
        db_kind = ?db_kind,
        elapsed_ms = start.elapsed().as_millis() as u64
    );

    verify_applied_count(pool, command).await
}

/// Post-check: the ledger must match what the command promises.
async fn verify_applied_count(
    pool: &DatabaseConnection,
    command: MigrationCommand,
) -> Result<(), DbInfraError> {
    let expected_count = Migrator::migrations().len();
    let applied_count = migration::count_applied_migrations(pool).await?;
    info!(migrate = "counts", expected_count, applied_count);

    match command {
        MigrationCommand::Reset if applied_count != 0 => Err(DbInfraError::config(format!(
            "Migration verification failed: reset should leave 0 migrations applied, \
             but {applied_count} were found"
        ))),
        MigrationCommand::Up | MigrationCommand::Fresh | MigrationCommand::Refresh
            if applied_count != expected_count =>
        {
            Err(DbInfraError::config(format!(
                "Migration verification failed: expected {expected_count} migrations, \
                 but {applied_count} were applied"
            )))
        }
        _ => Ok(()),
    }
}

async fn apply_session_settings(
    pool: &DatabaseConnection,
    db_kind: DbKind,
) -> Result<(), DbInfraError> {
    let backend = sea_orm::DatabaseBackend::from(db_kind);
    for stmt in build_session_statements(db_kind) {
        pool.execute(sea_orm::Statement::from_string(backend, stmt))
            .await
            .map_err(|e| {
                DbInfraError::config(format!("failed to apply session setting '{stmt}': {e}"))
            })?;
    }
    Ok(())
}
