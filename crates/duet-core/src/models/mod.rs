//! Data models for Duet

mod identity;
mod message;

pub use identity::{ContactRef, IdentityDraft, UserIdentity};
pub use message::{ActiveConversation, Message};
