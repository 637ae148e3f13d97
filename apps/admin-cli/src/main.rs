use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod error;

use cli::Cli;

const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn,sea_orm=warn";

#[tokio::main]
async fn main() {
    // A missing .env is fine; the real environment still applies.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_env_filter(filter)
        .init();

    // clap exits 2 on usage errors and 0 on --help/--version
    let cli = Cli::try_parse().unwrap_or_else(|e| e.exit());

    let cancellation_token = CancellationToken::new();
    let ctrl_c_token = cancellation_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            ctrl_c_token.cancel();
        }
    });

    if let Err(e) = commands::run(cli, cancellation_token).await {
        eprintln!("❌ {e}");
        std::process::exit(e.exit_code());
    }
}
