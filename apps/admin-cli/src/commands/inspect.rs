use db_infra::infra::db::inspect::{
    count_rows, describe_table, list_tables, run_select, sample_rows,
};
use sea_orm::DatabaseConnection;

use super::{to_pretty, CliResult};
use crate::cli::InspectCommand;

pub async fn run(db: &DatabaseConnection, cmd: InspectCommand) -> CliResult {
    match cmd {
        InspectCommand::Tables => {
            for table in list_tables(db).await? {
                println!("{table}");
            }
        }
        InspectCommand::Describe { table } => {
            let columns = describe_table(db, &table).await?;
            let width = columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
            for c in columns {
                println!(
                    "{:<width$}  {}  {}{}",
                    c.name,
                    c.data_type,
                    if c.nullable { "NULL" } else { "NOT NULL" },
                    c.default.map(|d| format!("  DEFAULT {d}")).unwrap_or_default(),
                );
            }
        }
        InspectCommand::Count { table } => {
            println!("{table}: {} row(s)", count_rows(db, &table).await?);
        }
        InspectCommand::Sample { table, limit } => {
            println!("{}", to_pretty(&sample_rows(db, &table, limit).await?)?);
        }
        InspectCommand::Query { sql } => {
            let rows = run_select(db, &sql).await?;
            println!("{}", to_pretty(&rows)?);
            println!("({} row(s))", rows.len());
        }
    }
    Ok(())
}
