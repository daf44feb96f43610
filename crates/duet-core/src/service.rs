//! Sync orchestration: startup hydration, the write-through identity rule,
//! and the five remote operations.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::auth::TokenProvider;
use crate::gateway::{IdentityUpdate, RemoteStore};
use crate::models::{ActiveConversation, IdentityDraft, Message, UserIdentity};
use crate::snapshot::SnapshotStore;
use crate::state::SessionState;
use crate::Result;

/// Uniform settle-value for the five remote operations.
///
/// Every operation resolves to one of these; transport failures, server
/// rejections, and malformed bodies all land here instead of escaping to
/// the caller as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpOutcome {
    pub ok: bool,
    pub message: String,
}

impl OpOutcome {
    fn succeeded(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Client-side sync layer: owns the session state and coordinates the
/// remote store, the durable snapshot, and the token provider.
///
/// Cloning is cheap; all clones share one session.
#[derive(Clone)]
pub struct SyncService<R, S, P>
where
    R: RemoteStore,
    S: SnapshotStore,
    P: TokenProvider,
{
    state: Arc<Mutex<SessionState>>,
    remote: R,
    store: S,
    tokens: P,
}

impl<R, S, P> SyncService<R, S, P>
where
    R: RemoteStore,
    S: SnapshotStore,
    P: TokenProvider,
{
    #[must_use]
    pub fn new(remote: R, store: S, tokens: P) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            remote,
            store,
            tokens,
        }
    }

    /// Hydrate the session from the durable snapshot, once at startup.
    ///
    /// Hydration runs through the same write-through path as server
    /// responses, so stored data re-validates on the way in. A missing,
    /// unreadable, or stale-schema snapshot starts an empty session.
    pub async fn initialize(&self) -> Result<()> {
        match self.store.load() {
            Ok(Some(identity)) => {
                self.apply_identity(identity).await?;
                tracing::info!("Hydrated session from durable snapshot");
            }
            Ok(None) => {
                tracing::info!("No durable snapshot; starting empty session");
            }
            Err(error) => {
                tracing::warn!("Ignoring unreadable durable snapshot: {}", error);
            }
        }
        Ok(())
    }

    /// The single sanctioned identity mutation: durable snapshot first,
    /// then the in-memory copy, as one step under the session lock.
    pub async fn apply_identity(&self, identity: UserIdentity) -> Result<()> {
        let mut state = self.state.lock().await;
        self.store.save(&identity)?;
        state.replace_identity(identity);
        Ok(())
    }

    /// Create a remote account from a draft and adopt the returned identity.
    pub async fn create_account(&self, draft: &IdentityDraft) -> OpOutcome {
        match self.remote.create_account(draft).await {
            Ok(identity) => self.adopt(identity, "Account created").await,
            Err(error) => OpOutcome::failed(error.to_string()),
        }
    }

    /// Sign in with a username or email and adopt the returned identity.
    pub async fn sign_in(&self, identifier: &str) -> OpOutcome {
        match self.remote.sign_in(identifier).await {
            Ok(identity) => self.adopt(identity, "Signed in").await,
            Err(error) => OpOutcome::failed(error.to_string()),
        }
    }

    /// Add a contact by username.
    pub async fn add_contact(&self, contact: &str) -> OpOutcome {
        let current = self.identity().await;
        match self
            .remote
            .add_contact(current.username.as_deref(), contact)
            .await
        {
            Ok(IdentityUpdate { identity, message }) => {
                let message =
                    message.unwrap_or_else(|| format!("Added contact '{contact}'"));
                self.adopt(identity, &message).await
            }
            Err(error) => {
                // The failure path still runs the write-through, re-saving
                // the unchanged identity.
                if let Err(save_error) = self.apply_identity(current).await {
                    tracing::warn!(
                        "Failed to re-save identity after rejected contact add: {}",
                        save_error
                    );
                }
                OpOutcome::failed(error.to_string())
            }
        }
    }

    /// Remove a contact. On success the message list empties, and the
    /// active-conversation descriptor clears when it referred to the
    /// removed contact.
    pub async fn delete_contact(&self, user_id: &str, contact_id: &str) -> OpOutcome {
        match self.remote.delete_contact(user_id, contact_id).await {
            Ok(identity) => {
                let outcome = self.adopt(identity, "Contact removed").await;
                if outcome.ok {
                    let mut state = self.state.lock().await;
                    state.set_messages(Vec::new());
                    let deleted_is_active = state
                        .conversation()
                        .is_some_and(|conversation| conversation.contact_id == contact_id);
                    if deleted_is_active {
                        state.set_conversation(None);
                    }
                }
                outcome
            }
            Err(error) => OpOutcome::failed(error.to_string()),
        }
    }

    /// Replace the conversation view with one contact's message history.
    ///
    /// Each call supersedes any fetch still in flight: a response that
    /// lands after a newer fetch was issued is discarded wholesale, so
    /// state always reflects the most recently requested conversation.
    pub async fn fetch_messages(
        &self,
        user_id: &str,
        contact_id: &str,
        username: &str,
    ) -> OpOutcome {
        let generation = {
            let mut state = self.state.lock().await;
            state.set_loading(true);
            state.begin_fetch()
        };

        let result = self.remote.fetch_messages(user_id, contact_id).await;

        let mut state = self.state.lock().await;
        if !state.is_current_fetch(generation) {
            tracing::info!("Discarding superseded message fetch for contact {}", contact_id);
            return OpOutcome::failed("Superseded by a newer message fetch");
        }
        state.set_loading(false);
        match result {
            Ok(messages) => {
                let count = messages.len();
                state.set_messages(messages);
                state.set_conversation(Some(ActiveConversation {
                    contact_id: contact_id.to_string(),
                    username: username.to_string(),
                }));
                OpOutcome::succeeded(format!("Fetched {count} messages"))
            }
            Err(error) => OpOutcome::failed(error.to_string()),
        }
    }

    /// Cooperatively cancel any in-flight message fetch. The superseded
    /// response is dropped when it lands; loading clears immediately.
    pub async fn cancel_fetch(&self) {
        let mut state = self.state.lock().await;
        state.supersede_fetches();
        state.set_loading(false);
    }

    /// Presentation-layer setter for the loading flag.
    pub async fn set_loading(&self, loading: bool) {
        self.state.lock().await.set_loading(loading);
    }

    /// Presentation-layer setter for the message list, for local-only
    /// clears that bypass the network.
    pub async fn set_messages(&self, messages: Vec<Message>) {
        self.state.lock().await.set_messages(messages);
    }

    pub async fn identity(&self) -> UserIdentity {
        self.state.lock().await.identity().clone()
    }

    pub async fn active_conversation(&self) -> Option<ActiveConversation> {
        self.state.lock().await.conversation().cloned()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.messages().to_vec()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.is_loading()
    }

    /// Whether an authenticated principal is currently present. Consumed
    /// by route guards; queried fresh from the token provider every call.
    pub async fn is_authenticated(&self) -> bool {
        self.tokens.current_token().await.is_some()
    }

    async fn adopt(&self, identity: UserIdentity, success: &str) -> OpOutcome {
        match self.apply_identity(identity).await {
            Ok(()) => OpOutcome::succeeded(success),
            Err(error) => {
                OpOutcome::failed(format!("Failed to persist identity snapshot: {error}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use tokio::sync::Notify;

    use crate::auth::StaticTokenProvider;
    use crate::gateway::{GatewayError, GatewayResult};
    use crate::models::ContactRef;
    use crate::snapshot::{FileSnapshotStore, MemorySnapshotStore};

    use super::*;

    #[derive(Clone, Default)]
    struct FakeRemote {
        identity: UserIdentity,
        addable: Vec<ContactRef>,
        messages: HashMap<String, Vec<Message>>,
        reject_fetches: HashSet<String>,
        malformed_fetches: HashSet<String>,
        entered: HashMap<String, Arc<Notify>>,
        gates: HashMap<String, Arc<Notify>>,
    }

    impl RemoteStore for FakeRemote {
        async fn create_account(&self, draft: &IdentityDraft) -> GatewayResult<UserIdentity> {
            Ok(UserIdentity {
                id: Some("new-user".to_string()),
                username: Some(draft.username.clone()),
                email: Some(draft.email.clone()),
                inbox: Vec::new(),
                created_at: None,
            })
        }

        async fn sign_in(&self, _identifier: &str) -> GatewayResult<UserIdentity> {
            Ok(self.identity.clone())
        }

        async fn add_contact(
            &self,
            _username: Option<&str>,
            contact: &str,
        ) -> GatewayResult<IdentityUpdate> {
            let Some(entry) = self.addable.iter().find(|c| c.username == contact) else {
                return Err(GatewayError::Rejected(format!(
                    "No user named '{contact}'. (404)"
                )));
            };
            let mut identity = self.identity.clone();
            identity.inbox.push(entry.clone());
            Ok(IdentityUpdate {
                identity,
                message: Some(format!("Added '{contact}' to your contacts.")),
            })
        }

        async fn delete_contact(
            &self,
            _user_id: &str,
            contact_id: &str,
        ) -> GatewayResult<UserIdentity> {
            let mut identity = self.identity.clone();
            identity.inbox.retain(|c| c.contact_id != contact_id);
            Ok(identity)
        }

        async fn fetch_messages(
            &self,
            _user_id: &str,
            contact_id: &str,
        ) -> GatewayResult<Vec<Message>> {
            if let Some(entered) = self.entered.get(contact_id) {
                entered.notify_one();
            }
            if let Some(gate) = self.gates.get(contact_id) {
                gate.notified().await;
            }
            if self.reject_fetches.contains(contact_id) {
                return Err(GatewayError::Rejected(
                    "message fetch rejected (500)".to_string(),
                ));
            }
            if self.malformed_fetches.contains(contact_id) {
                return Err(GatewayError::Malformed(
                    "response did not include a data.messages payload".to_string(),
                ));
            }
            Ok(self.messages.get(contact_id).cloned().unwrap_or_default())
        }
    }

    fn base_identity() -> UserIdentity {
        UserIdentity {
            id: Some("u1".to_string()),
            username: Some("alice".to_string()),
            email: Some("alice@example.com".to_string()),
            inbox: vec![ContactRef {
                contact_id: "c1".to_string(),
                username: "bob".to_string(),
            }],
            created_at: None,
        }
    }

    fn msg(id: &str, content: &str) -> Message {
        Message {
            id: id.to_string(),
            from: "u1".to_string(),
            to: "c1".to_string(),
            content: content.to_string(),
            sent_at: chrono::Utc::now(),
            version: 0,
        }
    }

    fn service_with(
        remote: FakeRemote,
        store: MemorySnapshotStore,
    ) -> SyncService<FakeRemote, MemorySnapshotStore, StaticTokenProvider> {
        SyncService::new(remote, store, StaticTokenProvider::new("token-123"))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn initialize_hydrates_stored_snapshot() {
        let store = MemorySnapshotStore::new();
        store.save(&base_identity()).unwrap();

        let service = service_with(FakeRemote::default(), store);
        service.initialize().await.unwrap();

        assert_eq!(service.identity().await, base_identity());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn initialize_treats_unreadable_snapshot_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, "{ definitely not an identity").unwrap();

        let service = SyncService::new(
            FakeRemote::default(),
            FileSnapshotStore::new(path),
            StaticTokenProvider::new("token-123"),
        );
        service.initialize().await.unwrap();

        assert_eq!(service.identity().await, UserIdentity::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn apply_identity_updates_memory_and_snapshot_together() {
        let store = MemorySnapshotStore::new();
        let service = service_with(FakeRemote::default(), store.clone());

        let identity = base_identity();
        service.apply_identity(identity.clone()).await.unwrap();

        assert_eq!(service.identity().await, identity);
        assert_eq!(store.load().unwrap(), Some(identity));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_account_adopts_server_identity() {
        let store = MemorySnapshotStore::new();
        let service = service_with(FakeRemote::default(), store.clone());

        let draft = IdentityDraft {
            username: "dana".to_string(),
            email: "dana@example.com".to_string(),
        };
        let outcome = service.create_account(&draft).await;

        assert!(outcome.ok);
        let identity = service.identity().await;
        assert_eq!(identity.username.as_deref(), Some("dana"));
        assert_eq!(store.load().unwrap(), Some(identity));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sign_in_adopts_server_identity() {
        let remote = FakeRemote {
            identity: base_identity(),
            ..FakeRemote::default()
        };
        let store = MemorySnapshotStore::new();
        let service = service_with(remote, store.clone());

        let outcome = service.sign_in("alice").await;

        assert!(outcome.ok);
        assert_eq!(service.identity().await, base_identity());
        assert_eq!(store.load().unwrap(), Some(base_identity()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn add_contact_success_appends_contact() {
        let remote = FakeRemote {
            identity: base_identity(),
            addable: vec![ContactRef {
                contact_id: "c9".to_string(),
                username: "carol".to_string(),
            }],
            ..FakeRemote::default()
        };
        let store = MemorySnapshotStore::new();
        let service = service_with(remote, store.clone());
        service.apply_identity(base_identity()).await.unwrap();

        let outcome = service.add_contact("carol").await;

        assert!(outcome.ok);
        let identity = service.identity().await;
        assert!(identity.contact_by_username("carol").is_some());
        assert_eq!(store.load().unwrap(), Some(identity));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn add_contact_rejection_leaves_inbox_unchanged() {
        let remote = FakeRemote {
            identity: base_identity(),
            ..FakeRemote::default()
        };
        let store = MemorySnapshotStore::new();
        let service = service_with(remote, store.clone());
        service.apply_identity(base_identity()).await.unwrap();

        let outcome = service.add_contact("ghost").await;

        assert!(!outcome.ok);
        assert!(outcome.message.contains("ghost"));
        let identity = service.identity().await;
        assert_eq!(identity.inbox, base_identity().inbox);
        // The rejected call still ran the no-op write-through.
        assert_eq!(store.load().unwrap(), Some(identity));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_contact_clears_messages_and_matching_conversation() {
        let mut remote = FakeRemote {
            identity: base_identity(),
            ..FakeRemote::default()
        };
        remote
            .messages
            .insert("c1".to_string(), vec![msg("m1", "hi"), msg("m2", "there")]);
        let service = service_with(remote, MemorySnapshotStore::new());
        service.apply_identity(base_identity()).await.unwrap();

        let fetched = service.fetch_messages("u1", "c1", "bob").await;
        assert!(fetched.ok);
        assert_eq!(service.messages().await.len(), 2);

        let outcome = service.delete_contact("u1", "c1").await;

        assert!(outcome.ok);
        assert!(service.messages().await.is_empty());
        assert_eq!(service.active_conversation().await, None);
        assert!(service.identity().await.contact_by_id("c1").is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_contact_keeps_unrelated_conversation_descriptor() {
        let mut remote = FakeRemote {
            identity: base_identity(),
            ..FakeRemote::default()
        };
        remote
            .messages
            .insert("c2".to_string(), vec![msg("m3", "unrelated")]);
        let service = service_with(remote, MemorySnapshotStore::new());
        service.apply_identity(base_identity()).await.unwrap();

        let fetched = service.fetch_messages("u1", "c2", "carol").await;
        assert!(fetched.ok);

        let outcome = service.delete_contact("u1", "c1").await;

        assert!(outcome.ok);
        // The list empties regardless, but the descriptor still names the
        // surviving conversation.
        assert!(service.messages().await.is_empty());
        let conversation = service.active_conversation().await.unwrap();
        assert_eq!(conversation.contact_id, "c2");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetch_messages_replaces_list_wholesale() {
        let mut remote = FakeRemote::default();
        remote
            .messages
            .insert("a".to_string(), vec![msg("m1", "one"), msg("m2", "two")]);
        remote
            .messages
            .insert("b".to_string(), vec![msg("m3", "three")]);
        let service = service_with(remote, MemorySnapshotStore::new());

        assert!(service.fetch_messages("u1", "a", "ann").await.ok);
        assert_eq!(service.messages().await.len(), 2);

        assert!(service.fetch_messages("u1", "b", "ben").await.ok);

        let messages = service.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "m3");
        let conversation = service.active_conversation().await.unwrap();
        assert_eq!(conversation.contact_id, "b");
        assert_eq!(conversation.username, "ben");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stale_fetch_response_is_discarded() {
        let entered_a = Arc::new(Notify::new());
        let gate_a = Arc::new(Notify::new());
        let mut remote = FakeRemote::default();
        remote
            .messages
            .insert("a".to_string(), vec![msg("m1", "late reply")]);
        remote
            .messages
            .insert("b".to_string(), vec![msg("m2", "fresh reply")]);
        remote.entered.insert("a".to_string(), entered_a.clone());
        remote.gates.insert("a".to_string(), gate_a.clone());
        let service = service_with(remote, MemorySnapshotStore::new());

        let first_service = service.clone();
        let first =
            tokio::spawn(async move { first_service.fetch_messages("u1", "a", "ann").await });
        entered_a.notified().await;

        let second = service.fetch_messages("u1", "b", "ben").await;
        assert!(second.ok);

        gate_a.notify_one();
        let first = first.await.unwrap();
        assert!(!first.ok);

        let messages = service.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "m2");
        assert_eq!(
            service.active_conversation().await.unwrap().contact_id,
            "b"
        );
        assert!(!service.is_loading().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn loading_clears_on_every_settle_path() {
        let mut remote = FakeRemote::default();
        remote.messages.insert("ok".to_string(), vec![msg("m1", "fine")]);
        remote.reject_fetches.insert("rejected".to_string());
        remote.malformed_fetches.insert("garbled".to_string());
        let service = service_with(remote, MemorySnapshotStore::new());

        assert!(service.fetch_messages("u1", "ok", "oskar").await.ok);
        assert!(!service.is_loading().await);

        assert!(!service.fetch_messages("u1", "rejected", "ray").await.ok);
        assert!(!service.is_loading().await);

        assert!(!service.fetch_messages("u1", "garbled", "gail").await.ok);
        assert!(!service.is_loading().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn loading_is_true_only_while_fetch_is_in_flight() {
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let mut remote = FakeRemote::default();
        remote.entered.insert("a".to_string(), entered.clone());
        remote.gates.insert("a".to_string(), gate.clone());
        let service = service_with(remote, MemorySnapshotStore::new());

        assert!(!service.is_loading().await);

        let in_flight_service = service.clone();
        let in_flight =
            tokio::spawn(async move { in_flight_service.fetch_messages("u1", "a", "ann").await });
        entered.notified().await;
        assert!(service.is_loading().await);

        gate.notify_one();
        assert!(in_flight.await.unwrap().ok);
        assert!(!service.is_loading().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_fetch_leaves_previous_conversation_intact() {
        let mut remote = FakeRemote::default();
        remote.messages.insert("a".to_string(), vec![msg("m1", "kept")]);
        remote.malformed_fetches.insert("broken".to_string());
        let service = service_with(remote, MemorySnapshotStore::new());

        assert!(service.fetch_messages("u1", "a", "ann").await.ok);

        let outcome = service.fetch_messages("u1", "broken", "bea").await;

        assert!(!outcome.ok);
        let messages = service.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "m1");
        assert_eq!(
            service.active_conversation().await.unwrap().contact_id,
            "a"
        );
        assert!(!service.is_loading().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancel_fetch_discards_in_flight_response() {
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Notify::new());
        let mut remote = FakeRemote::default();
        remote
            .messages
            .insert("a".to_string(), vec![msg("m1", "never shown")]);
        remote.entered.insert("a".to_string(), entered.clone());
        remote.gates.insert("a".to_string(), gate.clone());
        let service = service_with(remote, MemorySnapshotStore::new());

        let cancelled_service = service.clone();
        let cancelled =
            tokio::spawn(async move { cancelled_service.fetch_messages("u1", "a", "ann").await });
        entered.notified().await;

        service.cancel_fetch().await;
        assert!(!service.is_loading().await);

        gate.notify_one();
        assert!(!cancelled.await.unwrap().ok);
        assert!(service.messages().await.is_empty());
        assert_eq!(service.active_conversation().await, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn set_messages_supports_local_only_clears() {
        let mut remote = FakeRemote::default();
        remote.messages.insert("a".to_string(), vec![msg("m1", "hi")]);
        let service = service_with(remote, MemorySnapshotStore::new());

        assert!(service.fetch_messages("u1", "a", "ann").await.ok);
        service.set_messages(Vec::new()).await;
        assert!(service.messages().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unauthenticated_add_contact_still_settles() {
        let remote = FakeRemote {
            identity: base_identity(),
            ..FakeRemote::default()
        };
        let service = SyncService::new(
            remote,
            MemorySnapshotStore::new(),
            StaticTokenProvider::unauthenticated(),
        );
        service.apply_identity(base_identity()).await.unwrap();

        assert!(!service.is_authenticated().await);
        let outcome = service.add_contact("ghost").await;
        assert!(!outcome.ok);
        assert_eq!(service.identity().await.inbox, base_identity().inbox);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn is_authenticated_reflects_token_presence() {
        let service = service_with(FakeRemote::default(), MemorySnapshotStore::new());
        assert!(service.is_authenticated().await);
    }
}
