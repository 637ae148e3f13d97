use clap::{Args, Parser, Subcommand, ValueEnum};
use db_infra::config::db::{DbKind, RuntimeEnv};
use db_infra::credentials::{CredentialTable, DEFAULT_COST};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Env {
    Prod,
    Dev,
    Test,
}

impl From<Env> for RuntimeEnv {
    fn from(env: Env) -> Self {
        match env {
            Env::Prod => RuntimeEnv::Prod,
            Env::Dev => RuntimeEnv::Dev,
            Env::Test => RuntimeEnv::Test,
        }
    }
}

/// In-memory SQLite is deliberately absent: every invocation would start
/// from an empty database.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Db {
    Postgres,
    SqliteFile,
}

impl From<Db> for DbKind {
    fn from(db: Db) -> Self {
        match db {
            Db::Postgres => DbKind::Postgres,
            Db::SqliteFile => DbKind::SqliteFile,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Account {
    Admin,
    Employee,
}

impl Account {
    pub fn table(self) -> CredentialTable {
        match self {
            Account::Admin => CredentialTable::admins(),
            Account::Employee => CredentialTable::employees(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "salon-admin")]
#[command(about = "Salon platform database and API operations")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct GlobalArgs {
    /// Runtime environment
    #[arg(short, long, value_enum, global = true, default_value = "dev")]
    pub env: Env,

    /// Database type
    #[arg(short, long, value_enum, global = true, default_value = "sqlite-file")]
    pub db: Db,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a migration ledger command: up | down | fresh | reset | refresh | status
    Migrate { command: String },
    #[command(subcommand)]
    Schema(SchemaCommand),
    /// Fill a column on rows where it is NULL (or equal to --empty)
    Backfill(BackfillArgs),
    #[command(subcommand)]
    Inspect(InspectCommand),
    #[command(subcommand)]
    Credentials(CredentialsCommand),
    /// Delete every row of the given tables, in order
    Purge(PurgeArgs),
    #[command(subcommand)]
    Smoke(SmokeCommand),
    #[command(subcommand)]
    Sms(SmsCommand),
}

#[derive(Subcommand, Debug)]
pub enum SchemaCommand {
    /// Add a column unless it already exists
    AddColumn {
        #[arg(long)]
        table: String,
        #[arg(long)]
        column: String,
        /// Column type, e.g. JSONB or VARCHAR(32)
        #[arg(long = "type")]
        sql_type: String,
        #[arg(long)]
        not_null: bool,
        /// SQL default expression, e.g. "'{}'"
        #[arg(long)]
        default: Option<String>,
    },
    /// Create a sequence unless it already exists (Postgres)
    EnsureSequence {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 1)]
        start: i64,
        #[arg(long, default_value_t = 1)]
        increment: i64,
    },
    /// Move a serial sequence past MAX(column) (Postgres)
    SyncSequence {
        #[arg(long)]
        table: String,
        #[arg(long, default_value = "id")]
        column: String,
    },
    /// Report whether a table, column or sequence exists
    Exists {
        #[arg(long, required_unless_present = "sequence")]
        table: Option<String>,
        #[arg(long, requires = "table")]
        column: Option<String>,
        #[arg(long, conflicts_with = "table")]
        sequence: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct BackfillArgs {
    #[arg(long)]
    pub table: String,
    #[arg(long)]
    pub column: String,
    /// SQL expression written into matching rows
    #[arg(long)]
    pub value: String,
    /// SQL expression that also counts as empty, e.g. "''"
    #[arg(long)]
    pub empty: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum InspectCommand {
    Tables,
    Describe { table: String },
    Count { table: String },
    Sample {
        table: String,
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },
    /// Run a single read-only SELECT/WITH query
    Query { sql: String },
}

#[derive(Subcommand, Debug)]
pub enum CredentialsCommand {
    /// Print a bcrypt hash of a password
    Hash {
        password: String,
        #[arg(long, default_value_t = DEFAULT_COST)]
        cost: u32,
    },
    /// Check candidate passwords against a stored hash
    Verify {
        #[arg(long, value_enum, default_value = "admin")]
        account: Account,
        #[arg(long)]
        username: String,
        /// Report a verdict for every candidate instead of stopping at the first match
        #[arg(long)]
        each: bool,
        #[arg(required = true)]
        candidates: Vec<String>,
    },
    /// Replace the stored hash of an existing account
    Rotate {
        #[arg(long, value_enum, default_value = "admin")]
        account: Account,
        #[arg(long)]
        username: String,
        #[arg(long, env = "SALON_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value_t = DEFAULT_COST)]
        cost: u32,
    },
    /// Rotate, or insert the account when it does not exist
    Upsert {
        #[arg(long, value_enum, default_value = "admin")]
        account: Account,
        #[arg(long)]
        username: String,
        #[arg(long, env = "SALON_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value_t = DEFAULT_COST)]
        cost: u32,
    },
}

#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Tables to clear, children before parents
    #[arg(required = true)]
    pub tables: Vec<String>,
    /// Confirm the deletion
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(long, env = "SALON_SMOKE_USERNAME")]
    pub username: String,
    #[arg(long, env = "SALON_SMOKE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug, Clone)]
pub struct TokenArg {
    /// Bearer token from a previous login
    #[arg(long, env = "SALON_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SmokeCommand {
    AdminLogin(LoginArgs),
    EmployeeLogin(LoginArgs),
    Salons(TokenArg),
    Appointments {
        #[arg(long)]
        salon_id: Option<i64>,
        #[command(flatten)]
        auth: TokenArg,
    },
    Conversations(TokenArg),
    /// Fetch the OpenAPI document and list its operations
    Swagger {
        #[arg(long, default_value = "/api-docs")]
        path: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SmsCommand {
    /// POST every template in a JSON file ([{"name": .., "body": ..}]) to the provider
    SubmitTemplates { file: std::path::PathBuf },
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "salon-admin", "inspect", "tables", "--env", "test", "--db", "postgres",
        ])
        .unwrap();
        assert!(matches!(cli.global.env, Env::Test));
        assert!(matches!(cli.global.db, Db::Postgres));
    }

    #[test]
    fn in_memory_sqlite_is_not_offered() {
        let parsed =
            Cli::try_parse_from(["salon-admin", "--db", "sqlite-memory", "inspect", "tables"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn verify_requires_candidates() {
        let parsed =
            Cli::try_parse_from(["salon-admin", "credentials", "verify", "--username", "x"]);
        assert!(parsed.is_err());
        let cli = Cli::try_parse_from([
            "salon-admin",
            "credentials",
            "verify",
            "--account",
            "employee",
            "--username",
            "x",
            "a",
            "b",
        ])
        .unwrap();
        match cli.command {
            Command::Credentials(CredentialsCommand::Verify { candidates, account, .. }) => {
                assert_eq!(candidates, vec!["a", "b"]);
                assert_eq!(account.table(), CredentialTable::employees());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
