//! HTTP gateway to the remote messaging store.
//!
//! Each of the five operations returns a typed payload or a
//! `GatewayError`; rejection messages are parsed out of the error body so
//! callers have something printable to surface.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::TokenProvider;
use crate::models::{IdentityDraft, Message, UserIdentity};
use crate::util::{compact_text, is_http_url};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid gateway configuration: {0}")]
    InvalidConfiguration(String),
    /// The request could not be sent or its response could not be read.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("{0}")]
    Rejected(String),
    /// Success status, but the body does not match the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// A contact mutation's payload: the refreshed identity plus the server's
/// human-readable message, when it sent one.
#[derive(Debug, Clone)]
pub struct IdentityUpdate {
    pub identity: UserIdentity,
    pub message: Option<String>,
}

/// The five remote-store operations the sync layer depends on.
#[allow(async_fn_in_trait)]
pub trait RemoteStore: Clone + Send + Sync + 'static {
    /// Create an account from a draft identity; no auth required.
    async fn create_account(&self, draft: &IdentityDraft) -> GatewayResult<UserIdentity>;

    /// Sign in with a username or email; no auth required.
    async fn sign_in(&self, identifier: &str) -> GatewayResult<UserIdentity>;

    /// Add a contact to the signed-in user's inbox.
    async fn add_contact(
        &self,
        username: Option<&str>,
        contact: &str,
    ) -> GatewayResult<IdentityUpdate>;

    /// Remove a contact from the signed-in user's inbox.
    async fn delete_contact(
        &self,
        user_id: &str,
        contact_id: &str,
    ) -> GatewayResult<UserIdentity>;

    /// Fetch the full message history for one conversation.
    async fn fetch_messages(
        &self,
        user_id: &str,
        contact_id: &str,
    ) -> GatewayResult<Vec<Message>>;
}

/// reqwest-backed `RemoteStore` implementation.
///
/// The client keeps a cookie store so server-set session cookies ride
/// along on every request, matching the browser client's behavior.
#[derive(Clone)]
pub struct HttpGateway<P: TokenProvider> {
    base_url: String,
    client: reqwest::Client,
    tokens: P,
}

impl<P: TokenProvider> HttpGateway<P> {
    pub fn new(base_url: impl Into<String>, tokens: P) -> GatewayResult<Self> {
        let base_url = normalize_base_url(base_url.into().as_str())?;
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            base_url,
            client,
            tokens,
        })
    }

    /// Returns the normalized base URL this gateway was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attach the current bearer token, or nothing when no principal is
    /// signed in; the server is the one that rejects unauthenticated calls.
    async fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.current_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_payload<T>(response: reqwest::Response) -> GatewayResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Rejected(parse_api_error(status, &body)));
        }
        serde_json::from_str(&body).map_err(|error| {
            GatewayError::Malformed(format!("{error}: {}", compact_text(&body)))
        })
    }
}

impl<P: TokenProvider> RemoteStore for HttpGateway<P> {
    async fn create_account(&self, draft: &IdentityDraft) -> GatewayResult<UserIdentity> {
        let response = self
            .client
            .post(format!("{}/user/signup", self.base_url))
            .json(draft)
            .send()
            .await?;
        Self::read_payload::<IdentityEnvelope>(response)
            .await?
            .into_identity()
    }

    async fn sign_in(&self, identifier: &str) -> GatewayResult<UserIdentity> {
        let payload = serde_json::json!({ "identifier": identifier });
        let response = self
            .client
            .post(format!("{}/user/signin", self.base_url))
            .json(&payload)
            .send()
            .await?;
        Self::read_payload::<IdentityEnvelope>(response)
            .await?
            .into_identity()
    }

    async fn add_contact(
        &self,
        username: Option<&str>,
        contact: &str,
    ) -> GatewayResult<IdentityUpdate> {
        let payload = serde_json::json!({ "username": username, "contact": contact });
        let request = self
            .client
            .post(format!("{}/api/contacts", self.base_url))
            .json(&payload);
        let response = self.authorized(request).await.send().await?;

        let IdentityEnvelope { data, message } =
            Self::read_payload::<IdentityEnvelope>(response).await?;
        let identity = data.ok_or_else(missing_identity)?;
        Ok(IdentityUpdate { identity, message })
    }

    async fn delete_contact(
        &self,
        user_id: &str,
        contact_id: &str,
    ) -> GatewayResult<UserIdentity> {
        let request = self.client.delete(format!(
            "{}/api/{}/contacts/{}",
            self.base_url, user_id, contact_id
        ));
        let response = self.authorized(request).await.send().await?;
        Self::read_payload::<IdentityEnvelope>(response)
            .await?
            .into_identity()
    }

    async fn fetch_messages(
        &self,
        user_id: &str,
        contact_id: &str,
    ) -> GatewayResult<Vec<Message>> {
        let request = self
            .client
            .get(format!("{}/api/{}/messages", self.base_url, user_id))
            .query(&[("contact", contact_id)]);
        let response = self.authorized(request).await.send().await?;
        Self::read_payload::<MessagesEnvelope>(response)
            .await?
            .into_messages()
    }
}

#[derive(Debug, Deserialize)]
struct IdentityEnvelope {
    data: Option<UserIdentity>,
    message: Option<String>,
}

impl IdentityEnvelope {
    fn into_identity(self) -> GatewayResult<UserIdentity> {
        self.data.ok_or_else(missing_identity)
    }
}

#[derive(Debug, Deserialize)]
struct MessagesEnvelope {
    data: Option<MessagesPayload>,
}

#[derive(Debug, Deserialize)]
struct MessagesPayload {
    messages: Option<Vec<Message>>,
}

impl MessagesEnvelope {
    fn into_messages(self) -> GatewayResult<Vec<Message>> {
        self.data
            .and_then(|payload| payload.messages)
            .ok_or_else(|| {
                GatewayError::Malformed(
                    "response did not include a data.messages payload".to_string(),
                )
            })
    }
}

fn missing_identity() -> GatewayError {
    GatewayError::Malformed("response did not include an identity payload".to_string())
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

fn normalize_base_url(raw: &str) -> GatewayResult<String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return Err(GatewayError::InvalidConfiguration(
            "base URL must not be empty".to_string(),
        ));
    }
    if !is_http_url(&base) {
        return Err(GatewayError::InvalidConfiguration(
            "base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(base)
}
