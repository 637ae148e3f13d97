use db_infra::infra::db::purge::purge_tables;
use sea_orm::DatabaseConnection;

use super::CliResult;
use crate::cli::PurgeArgs;
use crate::error::CliError;

pub fn confirm(args: &PurgeArgs) -> CliResult {
    if args.yes {
        Ok(())
    } else {
        Err(CliError::Usage(format!(
            "purge deletes every row of: {}. Re-run with --yes to confirm",
            args.tables.join(", ")
        )))
    }
}

pub async fn run(db: &DatabaseConnection, args: PurgeArgs) -> CliResult {
    let outcomes = purge_tables(db, &args.tables).await;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(rows) => println!("✅ {}: {rows} row(s) deleted", outcome.table),
            Err(e) => {
                failed += 1;
                println!("❌ {}: {e}", outcome.table);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::Failed(format!(
            "{failed} of {} table(s) could not be purged",
            outcomes.len()
        )));
    }
    Ok(())
}
