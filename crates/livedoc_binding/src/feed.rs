//! Notification feed for the signed-in user.

use crate::binding::LiveBinding;
use crate::config::{BindingConfig, FeedConfig};
use chrono::{DateTime, Utc};
use livedoc_core::{
    timestamp, Document, Filter, Identity, IdentityProvider, Query, StoreError, StoreResult,
};
use livedoc_store::DocumentStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Source of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// An unread message addressed to the user.
    Message,
    /// A recent announcement.
    Announcement,
}

/// One feed entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Where the entry came from.
    pub kind: NotificationKind,
    /// The underlying document.
    pub document: Document,
}

/// Unread messages and recent announcements, kept live.
///
/// Two independent bindings back the feed. A delivery on one of them only
/// replaces the entries of its own kind.
pub struct NotificationFeed<S: DocumentStore> {
    config: FeedConfig,
    messages: LiveBinding<S>,
    announcements: LiveBinding<S>,
    identity: Option<Identity>,
}

impl<S: DocumentStore> NotificationFeed<S> {
    /// Creates a stopped feed.
    pub fn new(store: Arc<S>, config: FeedConfig) -> Self {
        Self {
            config,
            messages: LiveBinding::new(Arc::clone(&store)).with_config(BindingConfig::quiet()),
            announcements: LiveBinding::new(store).with_config(BindingConfig::quiet()),
            identity: None,
        }
    }

    /// Starts the feed for whoever `provider` reports as signed in.
    pub fn start_for(&mut self, provider: &dyn IdentityProvider) -> StoreResult<()> {
        self.start(provider.current(), Utc::now())
    }

    /// Starts the feed for `identity` as of `now`.
    ///
    /// Without an identity the feed is stopped and stays empty. Starting
    /// again with the same identity and instant keeps the existing
    /// subscriptions.
    pub fn start(&mut self, identity: Option<Identity>, now: DateTime<Utc>) -> StoreResult<()> {
        let Some(identity) = identity else {
            self.stop();
            return Ok(());
        };

        let window = chrono::Duration::from_std(self.config.announcement_window)
            .map_err(|e| StoreError::validation(format!("announcement window: {e}")))?;
        let since = now
            .checked_sub_signed(window)
            .ok_or_else(|| StoreError::validation("announcement window is out of range"))?;

        debug!(uid = %identity.uid, since = %timestamp(since), "notification feed started");
        self.messages.subscribe(
            self.config.messages_collection.clone(),
            Query::new()
                .filter(identity.owns("toId"))
                .where_eq("read", false),
        );
        self.announcements.subscribe(
            self.config.announcements_collection.clone(),
            Query::new().filter(Filter::gt("createdAt", timestamp(since))),
        );
        self.identity = Some(identity);
        Ok(())
    }

    /// Releases both subscriptions.
    pub fn stop(&mut self) {
        self.messages.release();
        self.announcements.release();
        self.identity = None;
    }

    /// Identity the feed was started for.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Waits for the next delivery on either binding and applies it.
    ///
    /// Returns which kind changed, or `None` once neither binding holds a
    /// subscription.
    pub async fn next_change(&mut self) -> Option<NotificationKind> {
        tokio::select! {
            Some(_) = self.messages.next_change() => Some(NotificationKind::Message),
            Some(_) = self.announcements.next_change() => Some(NotificationKind::Announcement),
            else => None,
        }
    }

    /// Applies the events waiting on both bindings.
    pub fn pump(&mut self) -> usize {
        self.messages.pump() + self.announcements.pump()
    }

    /// Current entries: messages first, then announcements.
    ///
    /// Empty while the feed is stopped.
    pub fn notifications(&self) -> Vec<Notification> {
        if self.identity.is_none() {
            return Vec::new();
        }
        let tagged = |kind: NotificationKind, docs: &[Document]| {
            docs.iter()
                .cloned()
                .map(move |document| Notification { kind, document })
                .collect::<Vec<_>>()
        };
        let mut out = tagged(NotificationKind::Message, self.messages.documents());
        out.extend(tagged(
            NotificationKind::Announcement,
            self.announcements.documents(),
        ));
        out
    }

    /// Number of entries in the feed.
    pub fn unread_count(&self) -> usize {
        if self.identity.is_none() {
            return 0;
        }
        self.messages.documents().len() + self.announcements.documents().len()
    }

    /// Binding over unread messages.
    pub fn messages(&self) -> &LiveBinding<S> {
        &self.messages
    }

    /// Binding over recent announcements.
    pub fn announcements(&self) -> &LiveBinding<S> {
        &self.announcements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingState;
    use chrono::TimeZone;
    use livedoc_core::{fields, Role, StaticIdentity};
    use livedoc_store::MemoryStore;
    use serde_json::json;

    fn student() -> Identity {
        Identity::new("u1", "Ivan", Role::Student)
    }

    #[test]
    fn signed_out_stays_unbound() {
        let store = Arc::new(MemoryStore::new());
        let mut feed = NotificationFeed::new(Arc::clone(&store), FeedConfig::default());
        feed.start_for(&StaticIdentity::signed_out()).unwrap();

        assert_eq!(feed.messages().state(), BindingState::Unbound);
        assert_eq!(feed.unread_count(), 0);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn counts_unread_messages_and_recent_announcements() {
        let store = Arc::new(MemoryStore::new());
        let seed = [
            ("messages", "m1", json!({"toId": "u1", "read": false})),
            ("messages", "m2", json!({"toId": "u1", "read": true})),
            ("messages", "m3", json!({"toId": "u2", "read": false})),
            ("announcements", "a1", json!({"createdAt": "2024-03-09T12:00:00.000Z"})),
            ("announcements", "a2", json!({"createdAt": "2024-02-01T12:00:00.000Z"})),
        ];
        for (collection, id, body) in seed {
            let body: livedoc_core::Fields = serde_json::from_value(body).unwrap();
            store.insert_with_id(collection, id, body).unwrap();
        }

        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let mut feed = NotificationFeed::new(Arc::clone(&store), FeedConfig::default());
        feed.start(Some(student()), now).unwrap();
        assert_eq!(feed.pump(), 2);

        let notifications = feed.notifications();
        let entries: Vec<(NotificationKind, &str)> = notifications
            .iter()
            .map(|n| (n.kind, n.document.id.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![
                (NotificationKind::Message, "m1"),
                (NotificationKind::Announcement, "a1"),
            ]
        );
        assert_eq!(feed.unread_count(), 2);
    }

    #[tokio::test]
    async fn delivery_replaces_only_its_kind() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_with_id(
                "announcements",
                "a1",
                fields([("createdAt", json!("2024-03-09T12:00:00.000Z"))]),
            )
            .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let mut feed = NotificationFeed::new(Arc::clone(&store), FeedConfig::default());
        feed.start(Some(student()), now).unwrap();
        feed.pump();
        assert_eq!(feed.unread_count(), 1);

        store
            .insert_with_id(
                "messages",
                "m1",
                fields([("toId", json!("u1")), ("read", json!(false))]),
            )
            .unwrap();
        assert_eq!(feed.next_change().await, Some(NotificationKind::Message));
        assert_eq!(feed.unread_count(), 2);

        store
            .update("messages", &"m1".into(), fields([("read", json!(true))]))
            .await
            .unwrap();
        assert_eq!(feed.next_change().await, Some(NotificationKind::Message));
        assert_eq!(feed.unread_count(), 1);
        assert_eq!(feed.announcements().documents().len(), 1);
    }

    #[tokio::test]
    async fn stopped_feed_has_no_changes() {
        let store = Arc::new(MemoryStore::new());
        let mut feed = NotificationFeed::new(store, FeedConfig::default());
        assert_eq!(feed.next_change().await, None);
    }

    #[test]
    fn signing_out_empties_the_feed() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_with_id(
                "messages",
                "m1",
                fields([("toId", json!("u1")), ("read", json!(false))]),
            )
            .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let mut feed = NotificationFeed::new(Arc::clone(&store), FeedConfig::default());
        feed.start(Some(student()), now).unwrap();
        feed.pump();
        assert_eq!(feed.unread_count(), 1);

        feed.start(None, now).unwrap();
        assert_eq!(feed.identity(), None);
        assert_eq!(feed.unread_count(), 0);
        assert!(feed.notifications().is_empty());
        assert_eq!(store.listener_count(), 0);
    }
}
