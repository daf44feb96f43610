//! Identity and contact models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One inbox entry: the other party of a two-way conversation.
///
/// Entries are immutable once fetched; the remote store guarantees
/// uniqueness by contact id within an inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRef {
    /// Server-assigned account id of the contact
    #[serde(rename = "_id")]
    pub contact_id: String,
    pub username: String,
}

/// The signed-in user's identity and contact list.
///
/// Everything except `inbox` stays empty until the first successful
/// hydration, signup, or signin. The in-memory copy owned by the session
/// is authoritative; the durable snapshot mirrors it and is only read
/// back at process startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Server-assigned account id
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact list, ordered as the server returns it
    #[serde(default)]
    pub inbox: Vec<ContactRef>,
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserIdentity {
    /// Find an inbox entry by contact username.
    #[must_use]
    pub fn contact_by_username(&self, username: &str) -> Option<&ContactRef> {
        self.inbox.iter().find(|entry| entry.username == username)
    }

    /// Find an inbox entry by contact id.
    #[must_use]
    pub fn contact_by_id(&self, contact_id: &str) -> Option<&ContactRef> {
        self.inbox.iter().find(|entry| entry.contact_id == contact_id)
    }
}

/// Request body for account creation; the server fills in the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityDraft {
    pub username: String,
    pub email: String,
}
