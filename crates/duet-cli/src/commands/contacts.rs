use serde::Serialize;

use crate::cli::ContactsCommands;
use crate::commands::common::{
    open_service, outcome_message, require_auth, require_user_id, resolve_contact,
};
use crate::error::CliError;

pub async fn run_contacts(
    command: ContactsCommands,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let (service, _profile_name) = open_service(global_profile).await?;

    match command {
        ContactsCommands::Add { username } => {
            require_auth(&service).await?;
            let message = outcome_message(service.add_contact(&username).await)?;
            println!("{message}");
            Ok(())
        }
        ContactsCommands::Remove { contact } => {
            require_auth(&service).await?;
            let identity = service.identity().await;
            let user_id = require_user_id(&identity)?;
            let entry = resolve_contact(&identity, &contact)?;

            let message =
                outcome_message(service.delete_contact(&user_id, &entry.contact_id).await)?;
            println!("{} '{}' is gone from your inbox.", message, entry.username);
            Ok(())
        }
        ContactsCommands::List { json } => {
            require_auth(&service).await?;
            let identity = service.identity().await;
            if json {
                let items = identity
                    .inbox
                    .iter()
                    .map(|entry| ContactListItem {
                        contact_id: entry.contact_id.clone(),
                        username: entry.username.clone(),
                    })
                    .collect::<Vec<_>>();
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if identity.inbox.is_empty() {
                println!("Your inbox is empty. Run `duet contacts add <username>`.");
            } else {
                for entry in &identity.inbox {
                    println!("{}  ({})", entry.username, entry.contact_id);
                }
            }
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
struct ContactListItem {
    contact_id: String,
    username: String,
}
