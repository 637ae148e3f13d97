use std::str::FromStr;

use db_infra::config::db::{DbKind, RuntimeEnv};
use db_infra::orchestrate_migration;
use migration::MigrationCommand;
use tokio_util::sync::CancellationToken;

use super::CliResult;
use crate::cli::GlobalArgs;
use crate::error::CliError;

pub async fn run(
    global: GlobalArgs,
    command: &str,
    cancellation_token: CancellationToken,
) -> CliResult {
    let command = MigrationCommand::from_str(command).map_err(CliError::Usage)?;
    orchestrate_migration(
        RuntimeEnv::from(global.env),
        DbKind::from(global.db),
        command,
        cancellation_token,
    )
    .await?;
    println!("✅ migrate {command:?} finished");
    Ok(())
}
