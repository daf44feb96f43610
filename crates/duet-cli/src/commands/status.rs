use serde::Serialize;

use crate::commands::common::open_service;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct StatusView {
    profile: String,
    authenticated: bool,
    user_id: Option<String>,
    username: Option<String>,
    email: Option<String>,
    contacts: usize,
}

pub async fn run_status(as_json: bool, global_profile: Option<&str>) -> Result<(), CliError> {
    let (service, profile_name) = open_service(global_profile).await?;

    let identity = service.identity().await;
    let view = StatusView {
        profile: profile_name,
        authenticated: service.is_authenticated().await,
        user_id: identity.id.clone(),
        username: identity.username.clone(),
        email: identity.email.clone(),
        contacts: identity.inbox.len(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Profile:       {}", view.profile);
    println!(
        "Identity:      {}",
        view.username.as_deref().unwrap_or("(none - run `duet signin`)")
    );
    if let Some(email) = &view.email {
        println!("Email:         {email}");
    }
    println!("Contacts:      {}", view.contacts);
    println!(
        "Bearer token:  {}",
        if view.authenticated {
            "present"
        } else {
            "absent (run `duet auth login`)"
        }
    );
    Ok(())
}
