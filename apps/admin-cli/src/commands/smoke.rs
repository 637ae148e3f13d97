use api_smoke::{fetch_swagger, ApiClient, SmokeReport};

use super::CliResult;
use crate::cli::{SmokeCommand, TokenArg};

fn client(auth: Option<&TokenArg>) -> Result<ApiClient, api_smoke::SmokeError> {
    let client = ApiClient::from_env()?;
    Ok(match auth.and_then(|a| a.token.clone()) {
        Some(token) => client.with_token(token),
        None => client,
    })
}

fn report(report: &SmokeReport) {
    println!("{report}");
}

/// HTTP error statuses are printed like any other response; only transport
/// or configuration failures end the command with an error.
pub async fn run(cmd: SmokeCommand) -> CliResult {
    match cmd {
        SmokeCommand::AdminLogin(login) => {
            report(&client(None)?.admin_login(&login.username, &login.password).await?);
        }
        SmokeCommand::EmployeeLogin(login) => {
            report(&client(None)?.employee_login(&login.username, &login.password).await?);
        }
        SmokeCommand::Salons(auth) => report(&client(Some(&auth))?.salons().await?),
        SmokeCommand::Appointments { salon_id, auth } => {
            report(&client(Some(&auth))?.appointments(salon_id).await?);
        }
        SmokeCommand::Conversations(auth) => {
            report(&client(Some(&auth))?.conversations().await?);
        }
        SmokeCommand::Swagger { path } => {
            let summary = fetch_swagger(&client(None)?, &path).await?;
            println!("{path} -> {}", summary.status);
            for op in &summary.operations {
                println!("  {op}");
            }
            println!("({} operation(s))", summary.operations.len());
        }
    }
    Ok(())
}
