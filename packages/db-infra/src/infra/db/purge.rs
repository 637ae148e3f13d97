//! Test-data cleanup across several tables.

use sea_orm::{ConnectionTrait, Statement};
use tracing::{info, warn};

use crate::infra::db::ident::quote_ident;

#[derive(Debug)]
pub struct PurgeOutcome {
    pub table: String,
    /// Rows deleted, or the error message for this table.
    pub result: Result<u64, String>,
}

impl PurgeOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// `DELETE FROM` each table in order.
///
/// A failing table is logged and recorded, then the loop moves on to the next
/// one; list children before parents to satisfy foreign keys.
pub async fn purge_tables<C: ConnectionTrait>(conn: &C, tables: &[String]) -> Vec<PurgeOutcome> {
    let backend = conn.get_database_backend();
    let mut outcomes = Vec::with_capacity(tables.len());

    for table in tables {
        let result = match quote_ident(table) {
            Ok(quoted) => conn
                .execute(Statement::from_string(backend, format!("DELETE FROM {quoted}")))
                .await
                .map(|r| r.rows_affected())
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match &result {
            Ok(rows) => info!(purge = "ok", table = %table, rows),
            Err(e) => warn!(purge = "failed", table = %table, error = %e),
        }
        outcomes.push(PurgeOutcome {
            table: table.clone(),
            result,
        });
    }

    outcomes
}
