use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, Table};

use crate::evolve::{add_column_if_missing, drop_column_if_present};
use crate::idents::Messages;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Older production databases got these columns from one-off scripts.
        let conn = manager.get_connection();

        let channel = Table::alter()
            .table(Messages::Table)
            .add_column(
                ColumnDef::new(Messages::Channel)
                    .string()
                    .not_null()
                    .default("sms"),
            )
            .to_owned();
        add_column_if_missing(conn, "messages", "channel", &channel).await?;

        let read_at = Table::alter()
            .table(Messages::Table)
            .add_column(
                ColumnDef::new(Messages::ReadAt)
                    .timestamp_with_time_zone()
                    .null(),
            )
            .to_owned();
        add_column_if_missing(conn, "messages", "read_at", &read_at).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        for (name, column) in [("read_at", Messages::ReadAt), ("channel", Messages::Channel)] {
            let alter = Table::alter()
                .table(Messages::Table)
                .drop_column(column)
                .to_owned();
            drop_column_if_present(conn, "messages", name, &alter).await?;
        }
        Ok(())
    }
}
