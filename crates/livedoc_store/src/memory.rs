//! In-process reference store.

use crate::fixture::{fixture_documents, parse_fixture, FixtureDocument};
use crate::store::{DocumentStore, EventSender, Listener, ListenerId, Snapshot, StoreEvent};
use livedoc_core::codec::{decode_document, decode_fields, encode_fields};
use livedoc_core::{
    validate_fields, Document, DocumentId, Fields, Query, StoreError, StoreResult,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Store-side access rule for one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRule {
    /// Whether listeners may be opened.
    pub read: bool,
    /// Whether documents may be created, updated or deleted.
    pub write: bool,
}

impl AccessRule {
    /// Reads and writes allowed.
    pub const ALLOW_ALL: Self = Self {
        read: true,
        write: true,
    };

    /// Nothing allowed.
    pub const DENY_ALL: Self = Self {
        read: false,
        write: false,
    };

    /// Reads allowed, writes denied.
    pub const READ_ONLY: Self = Self {
        read: true,
        write: false,
    };
}

impl Default for AccessRule {
    fn default() -> Self {
        Self::ALLOW_ALL
    }
}

/// A document store living in this process.
///
/// `MemoryStore` implements [`DocumentStore`] with the same observable
/// behavior a hosted store has:
/// - Bodies are kept as CBOR and decoded at the snapshot boundary
/// - Every commit bumps a logical sequence and pushes a full snapshot to
///   each listener whose matching set changed
/// - Listeners whose receiver was dropped are pruned
///
/// It also offers fault injection (`set_connected`, `set_rule`), seeding,
/// and inspection helpers so tests can play the part of other clients and
/// of the store operator.
///
/// Share it through an `Arc`; every binding holding the `Arc` acts as an
/// independent client.
pub struct MemoryStore {
    state: RwLock<State>,
    next_listener: AtomicU64,
}

struct State {
    collections: HashMap<String, BTreeMap<DocumentId, Vec<u8>>>,
    listeners: Vec<Registration>,
    rules: HashMap<String, AccessRule>,
    connected: bool,
    sequence: u64,
}

struct Registration {
    id: ListenerId,
    collection: String,
    query: Query,
    sender: EventSender,
    /// Last matching set sent, to skip commits that do not affect it.
    last: Vec<Document>,
}

impl MemoryStore {
    /// Creates an empty, connected store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                collections: HashMap::new(),
                listeners: Vec::new(),
                rules: HashMap::new(),
                connected: true,
                sequence: 0,
            }),
            next_listener: AtomicU64::new(1),
        }
    }

    /// Creates a store seeded from fixture JSON text.
    pub fn from_fixture_str(text: &str) -> StoreResult<Self> {
        let store = Self::new();
        store.seed_documents(parse_fixture(text)?)?;
        Ok(store)
    }

    /// Creates a store seeded from a fixture file.
    pub fn load_fixture(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::fixture(format!("cannot read {}: {e}", path.display())))?;
        Self::from_fixture_str(&text)
    }

    /// Seeds an already parsed fixture. Returns the number of documents.
    pub fn seed_fixture(&self, value: Value) -> StoreResult<usize> {
        self.seed_documents(fixture_documents(value)?)
    }

    fn seed_documents(&self, docs: Vec<FixtureDocument>) -> StoreResult<usize> {
        let count = docs.len();
        for doc in docs {
            match doc.id {
                Some(id) => self.insert_with_id(&doc.collection, id, doc.fields)?,
                None => {
                    self.seed(&doc.collection, doc.fields)?;
                }
            }
        }
        Ok(count)
    }

    /// Writes a document under a chosen id, replacing any existing body.
    ///
    /// Operator-side: ignores access rules and connectivity.
    pub fn insert_with_id(
        &self,
        collection: &str,
        id: impl Into<DocumentId>,
        fields: Fields,
    ) -> StoreResult<()> {
        validate_collection(collection)?;
        validate_fields(&fields)?;
        let body = encode_fields(&fields)?;
        let mut state = self.state.write();
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.into(), body);
        state.commit(collection);
        Ok(())
    }

    /// Writes a document under a generated id.
    ///
    /// Operator-side: ignores access rules and connectivity.
    pub fn seed(&self, collection: &str, fields: Fields) -> StoreResult<DocumentId> {
        let id = DocumentId::generate();
        self.insert_with_id(collection, id.clone(), fields)?;
        Ok(id)
    }

    /// Simulates losing or regaining the connection.
    ///
    /// Going offline fails every open listener with a connection error;
    /// later listens and writes fail until the store is reconnected.
    pub fn set_connected(&self, connected: bool) {
        let mut state = self.state.write();
        state.connected = connected;
        if !connected {
            warn!("store disconnected");
            state.fail_listeners(
                |_| true,
                &StoreError::connection("connection to the store was lost"),
            );
        }
    }

    /// Returns true while the store is reachable.
    pub fn is_connected(&self) -> bool {
        self.state.read().connected
    }

    /// Installs an access rule for a collection.
    ///
    /// Revoking read access fails the collection's open listeners.
    pub fn set_rule(&self, collection: &str, rule: AccessRule) {
        let mut state = self.state.write();
        state.rules.insert(collection.to_string(), rule);
        if !rule.read {
            let err = StoreError::permission_denied(collection, "read access revoked");
            state.fail_listeners(|reg| reg.collection == collection, &err);
        }
    }

    /// Reads one document.
    pub fn document(&self, collection: &str, id: &DocumentId) -> StoreResult<Option<Document>> {
        let state = self.state.read();
        state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|body| decode_document(id, body))
            .transpose()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.state
            .read()
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Returns true if the collection has no documents.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Number of live listeners. Prunes released ones first.
    pub fn listener_count(&self) -> usize {
        let mut state = self.state.write();
        state.listeners.retain(|reg| !reg.sender.is_closed());
        state.listeners.len()
    }

    /// Latest commit sequence.
    pub fn sequence(&self) -> u64 {
        self.state.read().sequence
    }

    fn write_create(&self, collection: &str, fields: Fields) -> StoreResult<DocumentId> {
        validate_fields(&fields)?;
        let body = encode_fields(&fields)?;
        let mut state = self.state.write();
        state.check_write(collection)?;

        let id = DocumentId::generate();
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), body);
        state.commit(collection);
        debug!(collection, id = %id, sequence = state.sequence, "document created");
        Ok(id)
    }

    fn write_update(&self, collection: &str, id: &DocumentId, fields: Fields) -> StoreResult<()> {
        validate_fields(&fields)?;
        let mut state = self.state.write();
        state.check_write(collection)?;

        {
            let body = state
                .collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::not_found(collection, id.as_str()))?;
            let mut merged = decode_fields(body)?;
            merged.extend(fields);
            *body = encode_fields(&merged)?;
        }
        state.commit(collection);
        debug!(collection, id = %id, sequence = state.sequence, "document updated");
        Ok(())
    }

    fn write_delete(&self, collection: &str, id: &DocumentId) -> StoreResult<()> {
        let mut state = self.state.write();
        state.check_write(collection)?;

        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            state.commit(collection);
            debug!(collection, id = %id, sequence = state.sequence, "document deleted");
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn listen(&self, collection: &str, query: &Query) -> Listener {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        let (sender, listener) = Listener::channel(id);

        let mut state = self.state.write();
        match state.matching(collection, query) {
            Ok(documents) => {
                debug!(
                    listener = id.0,
                    collection,
                    matched = documents.len(),
                    "listener opened"
                );
                let snapshot = Snapshot {
                    sequence: state.sequence,
                    documents: documents.clone(),
                };
                if sender.send(StoreEvent::Snapshot(snapshot)).is_ok() {
                    state.listeners.push(Registration {
                        id,
                        collection: collection.to_string(),
                        query: query.clone(),
                        sender,
                        last: documents,
                    });
                }
            }
            Err(err) => {
                warn!(listener = id.0, collection, error = %err, "listener rejected");
                // The sender is dropped here, so the failure is the last event.
                let _ = sender.send(StoreEvent::Failed(err));
            }
        }
        listener
    }

    async fn create(&self, collection: &str, fields: Fields) -> StoreResult<DocumentId> {
        tokio::task::yield_now().await;
        self.write_create(collection, fields)
    }

    async fn update(&self, collection: &str, id: &DocumentId, fields: Fields) -> StoreResult<()> {
        tokio::task::yield_now().await;
        self.write_update(collection, id, fields)
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> StoreResult<()> {
        tokio::task::yield_now().await;
        self.write_delete(collection, id)
    }
}

impl State {
    fn rule(&self, collection: &str) -> AccessRule {
        self.rules.get(collection).copied().unwrap_or_default()
    }

    fn check_write(&self, collection: &str) -> StoreResult<()> {
        if !self.connected {
            return Err(StoreError::connection("store is unreachable"));
        }
        validate_collection(collection)?;
        if !self.rule(collection).write {
            return Err(StoreError::permission_denied(
                collection,
                "writes are not allowed",
            ));
        }
        Ok(())
    }

    /// Evaluates a new listener's query, enforcing connectivity and rules.
    fn matching(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        if !self.connected {
            return Err(StoreError::connection("store is unreachable"));
        }
        validate_collection(collection)?;
        query.validate()?;
        if !self.rule(collection).read {
            return Err(StoreError::permission_denied(
                collection,
                "reads are not allowed",
            ));
        }
        Ok(query.apply(&self.documents(collection)?))
    }

    fn documents(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, body)| decode_document(id, body))
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    /// Advances the sequence and pushes new snapshots for `collection`.
    fn commit(&mut self, collection: &str) {
        self.sequence += 1;
        let sequence = self.sequence;

        let docs = match self.documents(collection) {
            Ok(docs) => docs,
            Err(err) => {
                self.fail_listeners(|reg| reg.collection == collection, &err);
                return;
            }
        };

        self.listeners.retain_mut(|reg| {
            if reg.sender.is_closed() {
                debug!(listener = reg.id.0, "listener released");
                return false;
            }
            if reg.collection != collection {
                return true;
            }
            let matched = reg.query.apply(&docs);
            if matched == reg.last {
                return true;
            }
            reg.last = matched.clone();
            reg.sender
                .send(StoreEvent::Snapshot(Snapshot {
                    sequence,
                    documents: matched,
                }))
                .is_ok()
        });
    }

    /// Ends every listener selected by `which` with `err`.
    fn fail_listeners(&mut self, which: impl Fn(&Registration) -> bool, err: &StoreError) {
        self.listeners.retain(|reg| {
            if !which(reg) {
                return true;
            }
            warn!(listener = reg.id.0, collection = %reg.collection, error = %err, "listener failed");
            let _ = reg.sender.send(StoreEvent::Failed(err.clone()));
            false
        });
    }
}

fn validate_collection(collection: &str) -> StoreResult<()> {
    if collection.is_empty() {
        return Err(StoreError::validation("collection name must not be empty"));
    }
    Ok(())
}
