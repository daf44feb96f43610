use duet_core::util::{is_http_url, normalize_text_option};

use crate::cli::ConfigCommands;
use crate::config_profiles::ProfilesConfig;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_base_url,
            snapshot_dir,
            no_activate,
        } => {
            let mut config = ProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name =
                config.resolve_profile_name(profile.as_deref().or(global_profile));

            if let Some(url) = normalize_text_option(api_base_url) {
                if !is_http_url(&url) {
                    return Err(CliError::Config(
                        "api_base_url must include http:// or https://".to_string(),
                    ));
                }
                config.profile_mut_or_default(&profile_name).api_base_url = Some(url);
            }
            if let Some(dir) = snapshot_dir {
                config.profile_mut_or_default(&profile_name).snapshot_dir = Some(dir);
            }
            // Touch the profile so a bare `config init` still creates it.
            config.profile_mut_or_default(&profile_name);

            if !no_activate {
                config.active_profile = Some(profile_name.clone());
            }

            let path = config.save().map_err(CliError::Config)?;
            println!(
                "Saved profile '{}' to {}.",
                profile_name,
                path.display()
            );
            Ok(())
        }
        ConfigCommands::Show { profile } => {
            let config = ProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name =
                config.resolve_profile_name(profile.as_deref().or(global_profile));

            let Some(resolved) = config.profile(&profile_name) else {
                println!("Profile '{profile_name}' is not configured.");
                return Ok(());
            };

            println!("Profile:       {profile_name}");
            println!(
                "api_base_url:  {}",
                resolved.api_base_url.as_deref().unwrap_or("(unset)")
            );
            println!(
                "snapshot path: {}",
                config.snapshot_path(&profile_name).display()
            );
            Ok(())
        }
    }
}
