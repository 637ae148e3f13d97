use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbInfraError {
    #[error("Configuration error: {message}")]
    Config { message: String },
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
    #[error("Not found: {what}")]
    NotFound { what: String },
    #[error("Invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: &'static str },
    #[error("Rejected SQL: {reason}")]
    RejectedSql { reason: String },
    #[error("{operation} is not supported on {backend}")]
    Unsupported {
        operation: &'static str,
        backend: String,
    },
    #[error("Lock error: {message}")]
    Lock { message: String },
    #[error("Credential error: {message}")]
    Credential { message: String },
}

impl DbInfraError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn lock(message: impl Into<String>) -> Self {
        Self::Lock {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::RejectedSql {
            reason: reason.into(),
        }
    }

    pub fn unsupported(operation: &'static str, backend: sea_orm::DatabaseBackend) -> Self {
        Self::Unsupported {
            operation,
            backend: format!("{backend:?}"),
        }
    }

    /// SQLite reports contention as "database is locked" / SQLITE_BUSY.
    pub fn is_sqlite_busy(&self) -> bool {
        let msg = self.to_string();
        msg.contains("database is locked") || msg.contains("SQLITE_BUSY")
    }
}

impl From<bcrypt::BcryptError> for DbInfraError {
    fn from(e: bcrypt::BcryptError) -> Self {
        Self::Credential {
            message: e.to_string(),
        }
    }
}
