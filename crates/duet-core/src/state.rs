//! In-memory session state.

use crate::models::{ActiveConversation, Message, UserIdentity};

/// The client session's mutable record: the authoritative identity, the
/// active conversation and its messages, and the fetch-in-progress flag.
///
/// Fields are private so every change goes through a named entry point;
/// the service layer decides when each one is called.
#[derive(Debug, Default)]
pub struct SessionState {
    identity: UserIdentity,
    conversation: Option<ActiveConversation>,
    messages: Vec<Message>,
    loading: bool,
    fetch_generation: u64,
}

impl SessionState {
    #[must_use]
    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    #[must_use]
    pub fn conversation(&self) -> Option<&ActiveConversation> {
        self.conversation.as_ref()
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether a message fetch is currently in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Wholesale identity replace; no diffing or merging.
    ///
    /// Callers pair this with the durable write, storage first
    /// (see `SyncService::apply_identity`).
    pub fn replace_identity(&mut self, identity: UserIdentity) {
        self.identity = identity;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Wholesale message-list replace, scoped to one conversation.
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn set_conversation(&mut self, conversation: Option<ActiveConversation>) {
        self.conversation = conversation;
    }

    /// Start a new message fetch, superseding any fetch still in flight.
    /// Returns the generation number identifying this fetch.
    pub fn begin_fetch(&mut self) -> u64 {
        self.fetch_generation += 1;
        self.fetch_generation
    }

    /// Whether `generation` is still the most recently issued fetch.
    #[must_use]
    pub fn is_current_fetch(&self, generation: u64) -> bool {
        self.fetch_generation == generation
    }

    /// Invalidate any in-flight fetch without issuing a new one.
    pub fn supersede_fetches(&mut self) {
        self.fetch_generation += 1;
    }
}
