//! Device-local bearer token storage with secure keychain persistence.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use duet_core::auth::TokenProvider;

use crate::error::CliError;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "duet-cli";

/// Keychain-backed store for the identity provider's bearer token.
///
/// Doubles as the `TokenProvider` handed to the sync core: every call
/// reads the keychain fresh, so a token stored or cleared by another
/// command is picked up immediately.
#[derive(Clone)]
pub struct TokenStore {
    username: String,
}

impl TokenStore {
    #[must_use]
    pub fn new(profile_name: &str) -> Self {
        Self {
            username: format!("bearer_token:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> Result<Entry, CliError> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| CliError::TokenStore(error.to_string()))
    }

    #[cfg(not(test))]
    pub fn load(&self) -> Result<Option<String>, CliError> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(CliError::TokenStore(error.to_string())),
        }
    }

    #[cfg(test)]
    pub fn load(&self) -> Result<Option<String>, CliError> {
        let store = Self::test_store();
        let guard = store
            .lock()
            .map_err(|error| CliError::TokenStore(error.to_string()))?;
        Ok(guard.get(&self.username).cloned())
    }

    #[cfg(not(test))]
    pub fn save(&self, token: &str) -> Result<(), CliError> {
        self.entry()?
            .set_password(token)
            .map_err(|error| CliError::TokenStore(error.to_string()))?;
        Ok(())
    }

    #[cfg(test)]
    pub fn save(&self, token: &str) -> Result<(), CliError> {
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| CliError::TokenStore(error.to_string()))?;
        guard.insert(self.username.clone(), token.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    pub fn clear(&self) -> Result<(), CliError> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(CliError::TokenStore(error.to_string())),
        }
    }

    #[cfg(test)]
    pub fn clear(&self) -> Result<(), CliError> {
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| CliError::TokenStore(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

impl TokenProvider for TokenStore {
    async fn current_token(&self) -> Option<String> {
        match self.load() {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!("Failed to read stored bearer token: {}", error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear_roundtrip() {
        let store = TokenStore::new("roundtrip-profile");
        assert_eq!(store.load().unwrap(), None);

        store.save("token-abc").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("token-abc"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn profiles_are_isolated() {
        let first = TokenStore::new("profile-one");
        let second = TokenStore::new("profile-two");

        first.save("token-one").unwrap();
        assert_eq!(second.load().unwrap(), None);
        first.clear().unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn provider_reads_stored_token_fresh() {
        let store = TokenStore::new("provider-profile");
        assert_eq!(store.current_token().await, None);

        store.save("live-token").unwrap();
        assert_eq!(store.current_token().await.as_deref(), Some("live-token"));
        store.clear().unwrap();
        assert_eq!(store.current_token().await, None);
    }
}
