use api_smoke::SmokeError;
use db_infra::DbInfraError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Db(#[from] DbInfraError),
    #[error(transparent)]
    Smoke(#[from] SmokeError),
    /// Bad arguments; exit code 2.
    #[error("{0}")]
    Usage(String),
    /// The command ran but did not succeed; exit code 1.
    #[error("{0}")]
    Failed(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            _ => 1,
        }
    }
}

impl From<sea_orm::DbErr> for CliError {
    fn from(e: sea_orm::DbErr) -> Self {
        CliError::Db(DbInfraError::Db(e))
    }
}
