use crate::auth::TokenStore;
use crate::cli::AuthCommands;
use crate::config_profiles::ProfilesConfig;
use crate::error::CliError;

pub fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let config = ProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let store = TokenStore::new(&profile_name);

    match command {
        AuthCommands::Login { token } => {
            let token = token.trim();
            if token.is_empty() {
                return Err(CliError::Config(
                    "Bearer token must not be empty".to_string(),
                ));
            }
            store.save(token)?;
            println!("Stored bearer token for profile '{profile_name}'.");
            Ok(())
        }
        AuthCommands::Status => {
            if store.load()?.is_some() {
                println!("Profile '{profile_name}' has a stored bearer token.");
            } else {
                println!(
                    "Profile '{profile_name}' has no stored token. Run `duet auth login --token <TOKEN>`."
                );
            }
            Ok(())
        }
        AuthCommands::Logout => {
            store.clear()?;
            println!("Cleared stored bearer token for profile '{profile_name}'.");
            Ok(())
        }
    }
}
