//! Bearer-token provider contract consumed by the remote gateway.

use std::fmt;

/// Supplies the current short-lived bearer token for the signed-in
/// principal, or `None` when nobody is authenticated.
///
/// Implementations query the live identity-provider session on every call;
/// this crate never caches tokens. An absent token is forwarded to the
/// remote store as an absent Authorization header, not treated as an error.
#[allow(async_fn_in_trait)]
pub trait TokenProvider: Clone + Send + Sync + 'static {
    async fn current_token(&self) -> Option<String>;
}

/// Token provider backed by a fixed optional token, primarily for tests
/// and scripted environments.
#[derive(Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Provider with no principal; every call yields `None`.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self { token: None }
    }
}

impl TokenProvider for StaticTokenProvider {
    async fn current_token(&self) -> Option<String> {
        self.token.clone()
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StaticTokenProvider")
            .field(
                "token",
                &self.token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
