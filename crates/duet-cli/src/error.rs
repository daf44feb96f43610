use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] duet_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Gateway error: {0}")]
    Gateway(String),
    #[error("Secure storage error: {0}")]
    TokenStore(String),
    #[error("Not signed in. Run `duet auth login --token <TOKEN>` first.")]
    NotSignedIn,
    #[error("No local identity. Run `duet signup` or `duet signin` first.")]
    NoIdentity,
    #[error("No contact '{0}' in your inbox. Run `duet contacts add {0}` to add one.")]
    UnknownContact(String),
    #[error("{0}")]
    OperationFailed(String),
}
