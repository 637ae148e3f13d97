use db_infra::infra::db::backfill::{backfill, BackfillSpec};
use sea_orm::DatabaseConnection;

use super::CliResult;
use crate::cli::BackfillArgs;

pub async fn run(db: &DatabaseConnection, args: BackfillArgs) -> CliResult {
    let mut spec = BackfillSpec::new(args.table, args.column, args.value);
    if let Some(empty) = args.empty {
        spec = spec.or_equal_to(empty);
    }
    let rows = backfill(db, &spec).await?;
    println!("backfilled {}.{}: {rows} row(s) updated", spec.table, spec.column);
    Ok(())
}
