use duet_core::models::IdentityDraft;

use crate::commands::common::{open_service, outcome_message};
use crate::error::CliError;

pub async fn run_signup(
    username: &str,
    email: &str,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let (service, profile_name) = open_service(global_profile).await?;

    let draft = IdentityDraft {
        username: username.to_string(),
        email: email.to_string(),
    };
    let message = outcome_message(service.create_account(&draft).await)?;

    let identity = service.identity().await;
    println!(
        "{} Profile '{}' now holds '{}'.",
        message,
        profile_name,
        identity.username.as_deref().unwrap_or("(unnamed)")
    );
    Ok(())
}

pub async fn run_signin(identifier: &str, global_profile: Option<&str>) -> Result<(), CliError> {
    let (service, profile_name) = open_service(global_profile).await?;

    let message = outcome_message(service.sign_in(identifier).await)?;

    let identity = service.identity().await;
    println!(
        "{} Profile '{}' now holds '{}' with {} contact(s).",
        message,
        profile_name,
        identity.username.as_deref().unwrap_or("(unnamed)"),
        identity.inbox.len()
    );
    Ok(())
}
