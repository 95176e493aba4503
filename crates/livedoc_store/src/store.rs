//! The remote document store contract.

use livedoc_core::{Document, DocumentId, Fields, Query, StoreError, StoreResult};
use std::future::Future;
use tokio::sync::watch;

/// A shared, remotely mutated document store.
///
/// This trait is the whole surface the binding layer depends on: one push
/// subscription primitive and three writes. Implementations are shared by
/// any number of independent clients and must never assume exclusive
/// access.
///
/// # Invariants
///
/// - A listener first receives the full matching set, then a new full
///   matching set after every committed change that alters it
/// - Events for one listener arrive in commit order
/// - A listener that fails receives exactly one [`StoreEvent::Failed`] and
///   nothing afterwards
/// - Writes resolve only after the store has acknowledged them
///
/// # Implementors
///
/// - [`crate::MemoryStore`] - in-process reference store
pub trait DocumentStore: Send + Sync {
    /// Opens a push subscription on `collection` scoped by `query`.
    ///
    /// Returns immediately; snapshots and failures are delivered through
    /// the returned [`Listener`]. Dropping the listener releases the
    /// subscription.
    fn listen(&self, collection: &str, query: &Query) -> Listener;

    /// Creates a document and returns the identifier the store assigned.
    fn create(
        &self,
        collection: &str,
        fields: Fields,
    ) -> impl Future<Output = StoreResult<DocumentId>> + Send;

    /// Merges `fields` into an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the document does not exist when
    /// the write is applied.
    fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Deletes a document. Deleting a missing document succeeds.
    fn delete(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Full result set of a listener at one point in logical time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Commit sequence the snapshot reflects.
    pub sequence: u64,
    /// Matching documents, in query order.
    pub documents: Vec<Document>,
}

/// Event delivered to a listener.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A new full matching set.
    Snapshot(Snapshot),
    /// The subscription ended with an error.
    Failed(StoreError),
}

/// Identifier of a listener within its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Error returned by [`Listener::try_recv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TryRecvError {
    /// No event is waiting.
    #[error("no event is waiting")]
    Empty,
    /// The store closed the subscription and every event was taken.
    #[error("subscription closed")]
    Disconnected,
}

/// Contents of a listener's slot: the latest event and how many were sent.
#[derive(Debug, Clone, Default)]
struct Pending {
    sent: u64,
    event: Option<StoreEvent>,
}

/// Store side of a [`Listener`].
///
/// The slot holds one event. Sending while the listener has not taken the
/// previous event replaces it, so a slow consumer only ever sees the newest
/// full matching set. A failure must be the last event sent.
#[derive(Debug)]
pub struct EventSender {
    slot: watch::Sender<Pending>,
}

impl EventSender {
    /// Publishes `event`, replacing any event not yet taken.
    ///
    /// Hands the event back if the listener has been dropped.
    pub fn send(&self, event: StoreEvent) -> Result<(), StoreEvent> {
        if self.slot.is_closed() {
            return Err(event);
        }
        self.slot.send_modify(|pending| {
            pending.sent += 1;
            pending.event = Some(event);
        });
        Ok(())
    }

    /// Returns true once the listener has been dropped.
    pub fn is_closed(&self) -> bool {
        self.slot.is_closed()
    }
}

/// Receiving end of a push subscription.
///
/// Cancellation is dropping: once the listener is gone the store's sender
/// reports closed and the registration is pruned on the next commit.
#[derive(Debug)]
pub struct Listener {
    id: ListenerId,
    slot: watch::Receiver<Pending>,
    taken: u64,
}

impl Listener {
    /// Creates a sender and listener pair for a new subscription.
    pub fn channel(id: ListenerId) -> (EventSender, Self) {
        let (tx, rx) = watch::channel(Pending::default());
        let listener = Self {
            id,
            slot: rx,
            taken: 0,
        };
        (EventSender { slot: tx }, listener)
    }

    /// Returns the listener id.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the store has closed the subscription and the
    /// last event has been taken. Cancel safe.
    pub async fn recv(&mut self) -> Option<StoreEvent> {
        loop {
            if let Some(event) = self.take() {
                return Some(event);
            }
            if self.slot.changed().await.is_err() {
                return self.take();
            }
        }
    }

    /// Takes the waiting event without blocking.
    pub fn try_recv(&mut self) -> Result<StoreEvent, TryRecvError> {
        if let Some(event) = self.take() {
            return Ok(event);
        }
        match self.slot.has_changed() {
            Ok(_) => self.take().ok_or(TryRecvError::Empty),
            Err(_) => self.take().ok_or(TryRecvError::Disconnected),
        }
    }

    fn take(&mut self) -> Option<StoreEvent> {
        let pending = self.slot.borrow_and_update();
        if pending.sent == self.taken {
            return None;
        }
        let event = pending.event.clone();
        let sent = pending.sent;
        drop(pending);
        self.taken = sent;
        event
    }
}
