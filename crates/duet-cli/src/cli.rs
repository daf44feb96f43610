use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "duet")]
#[command(about = "Two-party messaging from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name for endpoint/snapshot configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a remote account and adopt the returned identity
    Signup {
        /// Account username
        #[arg(long)]
        username: String,
        /// Account email
        #[arg(long)]
        email: String,
    },
    /// Sign in with a username or email
    Signin {
        /// Account username or email
        identifier: String,
    },
    /// Manage the contact list
    Contacts {
        #[command(subcommand)]
        command: ContactsCommands,
    },
    /// Show one conversation's message history
    Messages {
        /// Contact username from the inbox
        contact: String,
    },
    /// Show the hydrated identity and auth state
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the device-stored bearer token
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ContactsCommands {
    /// Add a contact by username
    Add {
        /// Username of the account to add
        username: String,
    },
    /// Remove a contact by username or id
    Remove {
        /// Contact username or id from the inbox
        contact: String,
    },
    /// List the hydrated inbox
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store a bearer token issued by the identity provider
    Login {
        /// Bearer token value
        #[arg(long, value_name = "TOKEN")]
        token: String,
    },
    /// Show whether a token is stored for this profile
    Status,
    /// Clear the stored token
    Logout,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Remote store base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Directory holding the durable identity snapshot
        #[arg(long, value_name = "PATH")]
        snapshot_dir: Option<PathBuf>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show resolved profile config
    Show {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
