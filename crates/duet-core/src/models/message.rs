//! Message and conversation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored message between the user and a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    /// Sender account id
    pub from: String,
    /// Recipient account id
    pub to: String,
    pub content: String,
    #[serde(rename = "sentAt")]
    pub sent_at: DateTime<Utc>,
    /// Server-side document revision
    #[serde(rename = "__v", default)]
    pub version: i64,
}

/// The single contact currently selected for message display.
///
/// The message list held by the session is only meaningful relative to
/// this descriptor; a fetch for another contact replaces both together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConversation {
    pub contact_id: String,
    pub username: String,
}
