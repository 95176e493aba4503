//! The live collection binding.

use crate::config::BindingConfig;
use crate::notice::{Notice, Notifier, TracingNotifier};
use crate::writer::CollectionWriter;
use livedoc_core::{
    Document, DocumentId, Fields, Identity, Query, Record, StoreError, StoreResult,
};
use livedoc_store::{DocumentStore, Listener, Snapshot, StoreEvent, TryRecvError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle state of a [`LiveBinding`].
///
/// ```text
/// Unbound ──subscribe──▶ Loading ──snapshot──▶ Live
///                           │                   │
///                           └──────failure──────┴──▶ Error
/// ```
///
/// `Live → Loading` and `Error → Loading` only happen on an explicit
/// re-subscription. Release returns any state to `Unbound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingState {
    /// No subscription.
    Unbound,
    /// Subscribed, waiting for the first snapshot.
    Loading,
    /// At least one snapshot delivered.
    Live,
    /// The subscription failed.
    Error,
}

impl BindingState {
    /// Returns true while a subscription is held.
    pub fn is_bound(&self) -> bool {
        matches!(self, BindingState::Loading | BindingState::Live)
    }
}

/// What a consumer renders: documents, loading flag and error.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingView {
    /// Last delivered snapshot.
    pub documents: Arc<[Document]>,
    /// True until the first snapshot of the current subscription arrives.
    pub loading: bool,
    /// Error that ended the subscription.
    pub error: Option<StoreError>,
}

impl BindingView {
    /// Human-readable error message, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

struct Target {
    collection: String,
    query: Query,
    fingerprint: String,
}

/// Keeps a local snapshot of `(collection, query)` in sync with a store.
///
/// A binding owns at most one [`Listener`]. Every delivered snapshot
/// replaces the local sequence wholesale by swapping one `Arc`, so a view
/// taken earlier keeps seeing the sequence it was taken from.
///
/// The binding is driven by its owner: events are applied only inside
/// [`next_change`](Self::next_change) or [`pump`](Self::pump), one at a
/// time, in delivery order.
///
/// # Example
///
/// ```rust,ignore
/// let store = Arc::new(MemoryStore::new());
/// let mut grades = LiveBinding::new(Arc::clone(&store));
/// grades.subscribe("grades", Query::new().where_eq("studentId", "u1"));
///
/// grades.next_change().await;
/// let average = views::overall_average(grades.documents(), "value");
/// ```
pub struct LiveBinding<S: DocumentStore> {
    store: Arc<S>,
    config: BindingConfig,
    notifier: Arc<dyn Notifier>,
    target: Option<Target>,
    listener: Option<Listener>,
    state: BindingState,
    documents: Arc<[Document]>,
    error: Option<StoreError>,
    sequence: Option<u64>,
}

impl<S: DocumentStore> LiveBinding<S> {
    /// Creates an unbound binding with the default configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: BindingConfig::default(),
            notifier: Arc::new(TracingNotifier),
            target: None,
            listener: None,
            state: BindingState::Unbound,
            documents: Arc::from(Vec::new()),
            error: None,
            sequence: None,
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: BindingConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the notice sink.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Subscribes to `collection` scoped by `query`.
    ///
    /// If the binding already holds a subscription with the same collection
    /// and a semantically equal query this does nothing. Otherwise the held
    /// subscription is released first, the local sequence is cleared, and
    /// the binding moves to `Loading` until the first snapshot arrives.
    pub fn subscribe(&mut self, collection: impl Into<String>, query: Query) {
        let collection = collection.into();
        let fingerprint = query.fingerprint();

        let unchanged = self
            .target
            .as_ref()
            .is_some_and(|t| t.collection == collection && t.fingerprint == fingerprint);
        if unchanged && self.state.is_bound() {
            return;
        }

        self.listener = None;
        self.documents = Arc::from(Vec::new());
        self.error = None;
        self.sequence = None;
        self.state = BindingState::Loading;

        let listener = self.store.listen(&collection, &query);
        debug!(
            collection = %collection,
            query = %fingerprint,
            listener = listener.id().0,
            "subscribed"
        );
        self.listener = Some(listener);
        self.target = Some(Target {
            collection,
            query,
            fingerprint,
        });
    }

    /// Releases the subscription.
    ///
    /// Idempotent. The last delivered documents stay readable but nothing
    /// will change them until the next [`subscribe`](Self::subscribe).
    pub fn release(&mut self) {
        if let Some(listener) = self.listener.take() {
            debug!(listener = listener.id().0, "released");
        }
        self.state = BindingState::Unbound;
    }

    /// Waits for the next event and applies it.
    ///
    /// Returns the resulting state, or `None` when no subscription is held.
    /// Cancel safe: an event is either fully applied or left waiting.
    pub async fn next_change(&mut self) -> Option<BindingState> {
        let listener = self.listener.as_mut()?;
        let event = listener.recv().await;
        self.apply(event);
        Some(self.state)
    }

    /// Waits until the binding leaves `Loading`.
    pub async fn settle(&mut self) -> BindingState {
        while self.state == BindingState::Loading {
            if self.next_change().await.is_none() {
                break;
            }
        }
        self.state
    }

    /// Applies the events already waiting, without blocking.
    ///
    /// Returns the number of events applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(listener) = self.listener.as_mut() {
            let event = match listener.try_recv() {
                Ok(event) => Some(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => None,
            };
            self.apply(event);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, event: Option<StoreEvent>) {
        match event {
            Some(StoreEvent::Snapshot(snapshot)) => self.deliver(snapshot),
            Some(StoreEvent::Failed(err)) => self.fail(err),
            None => self.fail(StoreError::connection("subscription closed by the store")),
        }
    }

    fn deliver(&mut self, snapshot: Snapshot) {
        debug!(
            collection = self.collection().unwrap_or_default(),
            sequence = snapshot.sequence,
            documents = snapshot.documents.len(),
            "snapshot delivered"
        );
        self.documents = Arc::from(snapshot.documents);
        self.sequence = Some(snapshot.sequence);
        self.error = None;
        self.state = BindingState::Live;
    }

    fn fail(&mut self, err: StoreError) {
        warn!(
            collection = self.collection().unwrap_or_default(),
            error = %err,
            "subscription failed"
        );
        self.listener = None;
        self.state = BindingState::Error;
        if self.config.announce_errors {
            self.notifier.notify(Notice::error("Error fetching data", &err));
        }
        self.error = Some(err);
    }

    /// Current state.
    pub fn state(&self) -> BindingState {
        self.state
    }

    /// True until the first snapshot of the current subscription arrives.
    pub fn is_loading(&self) -> bool {
        self.state == BindingState::Loading
    }

    /// Last delivered documents.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Shared handle to the last delivered documents.
    pub fn snapshot(&self) -> Arc<[Document]> {
        Arc::clone(&self.documents)
    }

    /// Error that ended the subscription.
    pub fn error(&self) -> Option<&StoreError> {
        self.error.as_ref()
    }

    /// Consumer view of the binding.
    pub fn view(&self) -> BindingView {
        BindingView {
            documents: self.snapshot(),
            loading: self.is_loading(),
            error: self.error.clone(),
        }
    }

    /// Collection of the current or last subscription.
    pub fn collection(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.collection.as_str())
    }

    /// Query of the current or last subscription.
    pub fn query(&self) -> Option<&Query> {
        self.target.as_ref().map(|t| &t.query)
    }

    /// Store sequence of the last delivered snapshot.
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// Decodes the last delivered documents into typed records.
    pub fn records<R: Record>(&self) -> StoreResult<Vec<R>> {
        livedoc_core::record::decode_all(&self.documents)
    }

    /// A writer for the bound collection sharing this binding's
    /// configuration and notice sink.
    pub fn writer(&self) -> StoreResult<CollectionWriter<S>> {
        let collection = self
            .collection()
            .ok_or_else(|| StoreError::validation("binding has no collection to write to"))?;
        Ok(CollectionWriter::new(Arc::clone(&self.store), collection)
            .with_config(self.config.clone())
            .with_notifier(Arc::clone(&self.notifier)))
    }

    /// Creates a document in the bound collection.
    ///
    /// The local sequence is untouched; the new document shows up with the
    /// next delivered snapshot if it matches the query.
    pub async fn create(&self, fields: Fields) -> StoreResult<DocumentId> {
        self.writer()?.create(fields).await
    }

    /// Creates a document in the bound collection authored by `author`.
    pub async fn create_as(&self, author: &Identity, fields: Fields) -> StoreResult<DocumentId> {
        self.writer()?.create_as(author, fields).await
    }

    /// Merges fields into a document of the bound collection.
    pub async fn update(&self, id: &DocumentId, fields: Fields) -> StoreResult<()> {
        self.writer()?.update(id, fields).await
    }

    /// Deletes a document of the bound collection.
    pub async fn delete(&self, id: &DocumentId) -> StoreResult<()> {
        self.writer()?.delete(id).await
    }
}

impl<S: DocumentStore> fmt::Debug for LiveBinding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveBinding")
            .field("collection", &self.collection())
            .field("query", &self.target.as_ref().map(|t| &t.fingerprint))
            .field("state", &self.state)
            .field("documents", &self.documents.len())
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::CollectingNotifier;
    use livedoc_core::fields;
    use livedoc_store::{AccessRule, MemoryStore};
    use serde_json::json;

    fn binding(store: &Arc<MemoryStore>) -> (LiveBinding<MemoryStore>, Arc<CollectingNotifier>) {
        let notices = Arc::new(CollectingNotifier::new());
        let binding = LiveBinding::new(Arc::clone(store)).with_notifier(notices.clone());
        (binding, notices)
    }

    #[test]
    fn starts_unbound() {
        let store = Arc::new(MemoryStore::new());
        let (binding, _) = binding(&store);
        assert_eq!(binding.state(), BindingState::Unbound);
        assert!(binding.documents().is_empty());
        assert!(binding.writer().is_err());
    }

    #[test]
    fn loading_until_first_snapshot() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_with_id("grades", "g1", fields([("value", json!(5))]))
            .unwrap();
        let (mut binding, _) = binding(&store);

        binding.subscribe("grades", Query::new());
        assert!(binding.is_loading());
        assert!(binding.documents().is_empty());

        assert_eq!(binding.pump(), 1);
        assert_eq!(binding.state(), BindingState::Live);
        assert_eq!(binding.documents().len(), 1);
        assert_eq!(binding.sequence(), Some(1));
    }

    #[test]
    fn same_query_is_not_resubscribed() {
        let store = Arc::new(MemoryStore::new());
        let (mut binding, _) = binding(&store);

        binding.subscribe(
            "grades",
            Query::new().where_eq("studentId", "u1").where_eq("term", 2),
        );
        binding.pump();
        binding.subscribe(
            "grades",
            Query::new().where_eq("term", 2).where_eq("studentId", "u1"),
        );
        assert_eq!(binding.state(), BindingState::Live);
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn resubscribe_releases_previous_listener() {
        let store = Arc::new(MemoryStore::new());
        let (mut binding, _) = binding(&store);

        binding.subscribe("grades", Query::new().where_eq("studentId", "u1"));
        binding.pump();
        binding.subscribe("grades", Query::new().where_eq("studentId", "u2"));
        assert!(binding.is_loading());
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn failure_is_announced() {
        let store = Arc::new(MemoryStore::new());
        store.set_rule("grades", AccessRule::DENY_ALL);
        let (mut binding, notices) = binding(&store);

        binding.subscribe("grades", Query::new());
        binding.pump();

        assert_eq!(binding.state(), BindingState::Error);
        let view = binding.view();
        assert!(!view.loading);
        assert!(view.error_message().is_some_and(|m| m.contains("permission denied")));
        let notices = notices.take();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "Error fetching data");
    }

    #[test]
    fn error_state_resubscribes_same_query() {
        let store = Arc::new(MemoryStore::new());
        store.set_connected(false);
        let (mut binding, _) = binding(&store);

        binding.subscribe("grades", Query::new());
        binding.pump();
        assert_eq!(binding.state(), BindingState::Error);

        store.set_connected(true);
        binding.subscribe("grades", Query::new());
        assert!(binding.is_loading());
        assert!(binding.error().is_none());
        binding.pump();
        assert_eq!(binding.state(), BindingState::Live);
    }

    #[test]
    fn release_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let (mut binding, _) = binding(&store);
        binding.subscribe("grades", Query::new());
        binding.pump();

        binding.release();
        binding.release();
        assert_eq!(binding.state(), BindingState::Unbound);
        assert_eq!(store.listener_count(), 0);
        assert_eq!(binding.pump(), 0);
    }

    #[test]
    fn debug_summarizes() {
        let store = Arc::new(MemoryStore::new());
        let (mut binding, _) = binding(&store);
        binding.subscribe("grades", Query::new());
        let debug = format!("{binding:?}");
        assert!(debug.contains("grades"));
        assert!(debug.contains("Loading"));
    }
}
