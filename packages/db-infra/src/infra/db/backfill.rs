//! Default-value backfill for freshly added columns.

use migration::evolve::fill_missing;
use sea_orm::sea_query::{Alias, Expr, Query, UpdateStatement};
use sea_orm::ConnectionTrait;
use tracing::info;

use crate::error::DbInfraError;
use crate::infra::db::ident::{validate_fragment, validate_ident};

/// `UPDATE table SET column = value WHERE column IS NULL [OR column = empty]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillSpec {
    pub table: String,
    pub column: String,
    /// SQL expression written into matching rows, e.g. `'{"enabled":false}'`.
    pub value_sql: String,
    /// SQL expression that counts as "empty" besides NULL, e.g. `''` or `'{}'`.
    pub empty_sql: Option<String>,
}

impl BackfillSpec {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        value_sql: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            value_sql: value_sql.into(),
            empty_sql: None,
        }
    }

    pub fn or_equal_to(mut self, empty_sql: impl Into<String>) -> Self {
        self.empty_sql = Some(empty_sql.into());
        self
    }

    fn to_update(&self) -> Result<UpdateStatement, DbInfraError> {
        let table = Alias::new(validate_ident(&self.table)?);
        let column = Alias::new(validate_ident(&self.column)?);
        let value = Expr::cust(validate_fragment(&self.value_sql)?.to_string());

        let mut condition = Expr::col(column.clone()).is_null();
        if let Some(empty) = &self.empty_sql {
            let empty = Expr::cust(validate_fragment(empty)?.to_string());
            condition = condition.or(Expr::col(column.clone()).eq(empty));
        }

        Ok(Query::update()
            .table(table)
            .value(column, value)
            .and_where(condition)
            .to_owned())
    }
}

/// Run the backfill once; returns the number of rows touched.
///
/// A second run over the same data touches nothing because the filled rows no
/// longer match the condition.
pub async fn backfill<C: ConnectionTrait>(
    conn: &C,
    spec: &BackfillSpec,
) -> Result<u64, DbInfraError> {
    let rows = fill_missing(conn, &spec.to_update()?).await?;
    info!(backfill = "done", table = %spec.table, column = %spec.column, rows);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use sea_orm::sea_query::PostgresQueryBuilder;

    use super::BackfillSpec;

    #[test]
    fn renders_null_only_condition() {
        let sql = BackfillSpec::new("salons", "working_hours", "'{}'")
            .to_update()
            .unwrap()
            .to_string(PostgresQueryBuilder);
        assert_eq!(
            sql,
            r#"UPDATE "salons" SET "working_hours" = '{}' WHERE "working_hours" IS NULL"#
        );
    }

    #[test]
    fn renders_empty_alternative() {
        let sql = BackfillSpec::new("salons", "phone", "'n/a'")
            .or_equal_to("''")
            .to_update()
            .unwrap()
            .to_string(PostgresQueryBuilder);
        // sea-query parenthesises the custom right-hand side.
        assert_eq!(
            sql,
            r#"UPDATE "salons" SET "phone" = 'n/a' WHERE "phone" IS NULL OR "phone" = ('')"#
        );
    }

    #[test]
    fn rejects_stacked_statements() {
        assert!(BackfillSpec::new("salons", "phone", "'x'; DROP TABLE salons")
            .to_update()
            .is_err());
    }
}
