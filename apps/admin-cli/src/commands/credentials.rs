use db_infra::credentials::{
    fetch_hash, hash_password, rotate_password, upsert_account, verify_each, verify_stored,
};
use db_infra::DbInfraError;
use sea_orm::DatabaseConnection;

use super::{with_db, CliResult};
use crate::cli::{Account, CredentialsCommand, GlobalArgs};
use crate::error::CliError;

pub async fn run(global: GlobalArgs, cmd: CredentialsCommand) -> CliResult {
    match cmd {
        CredentialsCommand::Hash { password, cost } => {
            println!("{}", hash_password(&password, cost)?);
            Ok(())
        }
        CredentialsCommand::Verify {
            account,
            username,
            each,
            candidates,
        } => {
            with_db(global, |db| {
                Box::pin(verify(db, account, username, each, candidates))
            })
            .await
        }
        CredentialsCommand::Rotate {
            account,
            username,
            password,
            cost,
        } => {
            with_db(global, |db| {
                Box::pin(rotate(db, account, username, password, cost))
            })
            .await
        }
        CredentialsCommand::Upsert {
            account,
            username,
            password,
            cost,
        } => {
            with_db(global, |db| {
                Box::pin(upsert(db, account, username, password, cost))
            })
            .await
        }
    }
}

async fn verify(
    db: &DatabaseConnection,
    account: Account,
    username: String,
    each: bool,
    candidates: Vec<String>,
) -> CliResult {
    let target = account.table();

    if each {
        let hash = fetch_hash(db, &target, &username)
            .await?
            .ok_or_else(|| DbInfraError::not_found(format!("{} '{username}'", target.table)))?;
        let verdicts = verify_each(&hash, &candidates)?;
        for (candidate, ok) in candidates.iter().zip(&verdicts) {
            println!("{} {candidate}", if *ok { "✅" } else { "❌" });
        }
        if !verdicts.contains(&true) {
            return Err(CliError::Failed(format!("no candidate matches {username}")));
        }
        return Ok(());
    }

    let report = verify_stored(db, &target, &username, &candidates).await?;
    match report.matched {
        Some(matched) => {
            println!("✅ {username}: matches '{matched}' ({} checked)", report.checked);
            Ok(())
        }
        None => Err(CliError::Failed(format!(
            "no candidate matches {username} ({} checked)",
            report.checked
        ))),
    }
}

async fn rotate(
    db: &DatabaseConnection,
    account: Account,
    username: String,
    password: String,
    cost: u32,
) -> CliResult {
    rotate_password(db, &account.table(), &username, &password, cost).await?;
    println!("✅ password rotated for {username}");
    Ok(())
}

async fn upsert(
    db: &DatabaseConnection,
    account: Account,
    username: String,
    password: String,
    cost: u32,
) -> CliResult {
    let outcome = upsert_account(db, &account.table(), &username, &password, cost).await?;
    println!("✅ {username}: {outcome:?}");
    Ok(())
}
