//! Shared command helpers: service construction, the auth route guard,
//! and outcome rendering.

use duet_core::gateway::HttpGateway;
use duet_core::models::ContactRef;
use duet_core::service::{OpOutcome, SyncService};
use duet_core::snapshot::FileSnapshotStore;
use duet_core::UserIdentity;

use crate::auth::TokenStore;
use crate::config_profiles::ProfilesConfig;
use crate::error::CliError;

pub type CliSyncService = SyncService<HttpGateway<TokenStore>, FileSnapshotStore, TokenStore>;

/// Resolve the profile, build the sync service, and run startup hydration.
pub async fn open_service(
    global_profile: Option<&str>,
) -> Result<(CliSyncService, String), CliError> {
    let config = ProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let base_url = config.api_base_url(&profile_name).ok_or_else(|| {
        CliError::Config(format!(
            "Profile '{profile_name}' has no api_base_url. Run `duet config init --profile {profile_name} --api-base-url <URL>` first."
        ))
    })?;

    let tokens = TokenStore::new(&profile_name);
    let gateway = HttpGateway::new(base_url, tokens.clone())
        .map_err(|error| CliError::Gateway(error.to_string()))?;
    let store = FileSnapshotStore::new(config.snapshot_path(&profile_name));

    let service = SyncService::new(gateway, store, tokens);
    service.initialize().await?;
    Ok((service, profile_name))
}

/// Route guard for protected commands: callers proceed only with an
/// authenticated principal, everyone else is sent back to sign in.
pub async fn require_auth(service: &CliSyncService) -> Result<(), CliError> {
    if service.is_authenticated().await {
        Ok(())
    } else {
        Err(CliError::NotSignedIn)
    }
}

/// Resolve a contact argument against the hydrated inbox, matching
/// username first, then contact id.
pub fn resolve_contact(identity: &UserIdentity, contact: &str) -> Result<ContactRef, CliError> {
    identity
        .contact_by_username(contact)
        .or_else(|| identity.contact_by_id(contact))
        .cloned()
        .ok_or_else(|| CliError::UnknownContact(contact.to_string()))
}

/// The signed-in user's id, required by the addressed operations.
pub fn require_user_id(identity: &UserIdentity) -> Result<String, CliError> {
    identity.id.clone().ok_or(CliError::NoIdentity)
}

/// Turn an operation outcome into printable success or a CLI error.
pub fn outcome_message(outcome: OpOutcome) -> Result<String, CliError> {
    if outcome.ok {
        Ok(outcome.message)
    } else {
        Err(CliError::OperationFailed(outcome.message))
    }
}
