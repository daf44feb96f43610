//! Duet CLI - two-party messaging from the command line
//!
//! Front end over the duet-core sync layer: one profile per remote store,
//! a device-local bearer token, and a durable identity snapshot.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("duet=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Signup { username, email } => {
            commands::account::run_signup(&username, &email, profile).await
        }
        Commands::Signin { identifier } => {
            commands::account::run_signin(&identifier, profile).await
        }
        Commands::Contacts { command } => commands::contacts::run_contacts(command, profile).await,
        Commands::Messages { contact } => commands::messages::run_messages(&contact, profile).await,
        Commands::Status { json } => commands::status::run_status(json, profile).await,
        Commands::Auth { command } => commands::auth_cmd::run_auth(command, profile),
        Commands::Config { command } => commands::config::run_config(command, profile),
        Commands::Completions { shell, output } => {
            commands::completions::run_completions(shell, output.as_deref())
        }
    }
}
