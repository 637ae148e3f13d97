use std::future::Future;
use std::pin::Pin;

use db_infra::config::db::{validate_db_config, DbKind, RuntimeEnv};
use db_infra::{build_admin_pool, close_pool};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Command, GlobalArgs};
use crate::error::CliError;

mod backfill;
mod credentials;
mod inspect;
mod migrate;
mod purge;
mod schema;
mod smoke;
mod sms;

pub type CliResult = Result<(), CliError>;

/// Dispatch one parsed invocation.
pub async fn run(cli: Cli, cancellation_token: CancellationToken) -> CliResult {
    let global = cli.global;
    match cli.command {
        Command::Migrate { command } => migrate::run(global, &command, cancellation_token).await,
        Command::Schema(cmd) => with_db(global, |db| Box::pin(schema::run(db, cmd))).await,
        Command::Backfill(args) => with_db(global, |db| Box::pin(backfill::run(db, args))).await,
        Command::Inspect(cmd) => with_db(global, |db| Box::pin(inspect::run(db, cmd))).await,
        Command::Credentials(cmd) => credentials::run(global, cmd).await,
        Command::Purge(args) => {
            // Refuse before connecting
            purge::confirm(&args)?;
            with_db(global, |db| Box::pin(purge::run(db, args))).await
        }
        Command::Smoke(cmd) => smoke::run(cmd).await,
        Command::Sms(cmd) => sms::run(cmd).await,
    }
}

/// Open the single-connection pool, run `f`, and always close the pool.
pub(crate) async fn with_db<F>(global: GlobalArgs, f: F) -> CliResult
where
    F: for<'a> FnOnce(&'a DatabaseConnection) -> Pin<Box<dyn Future<Output = CliResult> + 'a>>,
{
    let env = RuntimeEnv::from(global.env);
    let db_kind = DbKind::from(global.db);
    validate_db_config(env, db_kind)?;

    let pool = build_admin_pool(env, db_kind).await?;
    let result = f(&pool).await;
    close_pool(pool).await?;
    result
}

/// Pretty JSON for console reports.
pub(crate) fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Failed(format!("failed to render JSON: {e}")))
}
