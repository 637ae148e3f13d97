use db_infra::infra::db::schema::{
    column_exists, ensure_column, ensure_sequence, sequence_exists, sync_sequence, table_exists,
    ColumnSpec, SequenceSpec,
};
use sea_orm::DatabaseConnection;

use super::CliResult;
use crate::cli::SchemaCommand;

fn presence(found: bool) -> &'static str {
    if found {
        "present"
    } else {
        "missing"
    }
}

pub async fn run(db: &DatabaseConnection, cmd: SchemaCommand) -> CliResult {
    match cmd {
        SchemaCommand::AddColumn {
            table,
            column,
            sql_type,
            not_null,
            default,
        } => {
            let mut spec = ColumnSpec::new(table, column, sql_type);
            if not_null {
                spec = spec.not_null();
            }
            if let Some(expr) = default {
                spec = spec.default_sql(expr);
            }
            let outcome = ensure_column(db, &spec).await?;
            println!("column {}.{}: {}", spec.table, spec.column, outcome.as_str());
        }
        SchemaCommand::EnsureSequence {
            name,
            start,
            increment,
        } => {
            let spec = SequenceSpec {
                name,
                start,
                increment,
            };
            let outcome = ensure_sequence(db, &spec).await?;
            println!("sequence {}: {}", spec.name, outcome.as_str());
        }
        SchemaCommand::SyncSequence { table, column } => {
            let value = sync_sequence(db, &table, &column).await?;
            println!("sequence for {table}.{column} set to {value}");
        }
        SchemaCommand::Exists {
            table,
            column,
            sequence,
        } => match (table, column, sequence) {
            (_, _, Some(name)) => {
                println!("sequence {name}: {}", presence(sequence_exists(db, &name).await?));
            }
            (Some(table), Some(column), None) => {
                let found = column_exists(db, &table, &column).await?;
                println!("column {table}.{column}: {}", presence(found));
            }
            (Some(table), None, None) => {
                println!("table {table}: {}", presence(table_exists(db, &table).await?));
            }
            (None, _, None) => {
                return Err(crate::error::CliError::Usage(
                    "exists needs --table or --sequence".to_string(),
                ))
            }
        },
    }
    Ok(())
}
