use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, Table};

use crate::evolve::{
    add_column_if_missing, drop_column_if_present, fill_missing, EnsureOutcome,
};
use crate::idents::{Employees, Salons};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Opening hours written to rows created before the column existed.
pub const DEFAULT_WORKING_HOURS: &str = concat!(
    r#"{"monday":{"open":"09:00","close":"18:00"},"#,
    r#""tuesday":{"open":"09:00","close":"18:00"},"#,
    r#""wednesday":{"open":"09:00","close":"18:00"},"#,
    r#""thursday":{"open":"09:00","close":"18:00"},"#,
    r#""friday":{"open":"09:00","close":"18:00"},"#,
    r#""saturday":{"open":"10:00","close":"16:00"},"#,
    r#""sunday":null}"#,
);

pub const DEFAULT_BOOKING_SETTINGS: &str =
    r#"{"slot_minutes":30,"min_notice_hours":2,"max_days_ahead":60,"allow_online":true}"#;

fn quoted(json: &str) -> String {
    format!("'{}'", json.replace('\'', "''"))
}

fn json_literal(json: &str) -> SimpleExpr {
    Expr::cust(quoted(json))
}

async fn add_json_column_if_missing<T, C>(
    manager: &SchemaManager<'_>,
    table: T,
    column: C,
) -> Result<EnsureOutcome, DbErr>
where
    T: Iden + Copy + 'static,
    C: Iden + Copy + 'static,
{
    let alter = Table::alter()
        .table(table)
        .add_column(ColumnDef::new(column).json().null())
        .to_owned();
    add_column_if_missing(
        manager.get_connection(),
        &table.to_string(),
        &column.to_string(),
        &alter,
    )
    .await
}

async fn backfill_null<T, C>(
    manager: &SchemaManager<'_>,
    table: T,
    column: C,
    json: &str,
) -> Result<u64, DbErr>
where
    T: Iden + Copy + 'static,
    C: Iden + Copy + 'static,
{
    let update = Query::update()
        .table(table)
        .value(column, json_literal(json))
        .and_where(Expr::col(column).is_null())
        .to_owned();
    fill_missing(manager.get_connection(), &update).await
}

async fn drop_column_if_exists<T, C>(
    manager: &SchemaManager<'_>,
    table: T,
    column: C,
) -> Result<bool, DbErr>
where
    T: Iden + Copy + 'static,
    C: Iden + Copy + 'static,
{
    let alter = Table::alter().table(table).drop_column(column).to_owned();
    drop_column_if_present(
        manager.get_connection(),
        &table.to_string(),
        &column.to_string(),
        &alter,
    )
    .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite accepts a single ALTER option per statement, so one column at a time.
        add_json_column_if_missing(manager, Salons::Table, Salons::WorkingHours).await?;
        add_json_column_if_missing(manager, Salons::Table, Salons::BookingSettings).await?;
        add_json_column_if_missing(manager, Employees::Table, Employees::WorkingHours).await?;

        backfill_null(manager, Salons::Table, Salons::WorkingHours, DEFAULT_WORKING_HOURS)
            .await?;
        backfill_null(
            manager,
            Salons::Table,
            Salons::BookingSettings,
            DEFAULT_BOOKING_SETTINGS,
        )
        .await?;
        backfill_null(
            manager,
            Employees::Table,
            Employees::WorkingHours,
            DEFAULT_WORKING_HOURS,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_column_if_exists(manager, Employees::Table, Employees::WorkingHours).await?;
        drop_column_if_exists(manager, Salons::Table, Salons::BookingSettings).await?;
        drop_column_if_exists(manager, Salons::Table, Salons::WorkingHours).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{quoted, DEFAULT_BOOKING_SETTINGS, DEFAULT_WORKING_HOURS};

    #[test]
    fn quoted_wraps_and_escapes() {
        assert_eq!(quoted(r#"{"a":"it's"}"#), r#"'{"a":"it''s"}'"#);
        assert!(quoted(DEFAULT_BOOKING_SETTINGS).starts_with("'{"));
    }

    #[test]
    fn working_hours_default_is_one_object() {
        assert!(DEFAULT_WORKING_HOURS.starts_with(r#"{"monday":{"open":"09:00""#));
        assert!(DEFAULT_WORKING_HOURS.contains(r#"},"tuesday":"#));
        assert!(DEFAULT_WORKING_HOURS.ends_with(r#""sunday":null}"#));
        assert_eq!(DEFAULT_WORKING_HOURS.matches('{').count(), 7);
        assert_eq!(DEFAULT_WORKING_HOURS.matches('}').count(), 7);
    }
}
