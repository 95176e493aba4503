//! Write-through mutations for one collection.

use crate::config::BindingConfig;
use crate::notice::{Notice, Notifier, TracingNotifier};
use chrono::{DateTime, Utc};
use livedoc_core::{timestamp, DocumentId, Fields, Identity, Record, StoreResult, Value};
use livedoc_store::DocumentStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Issues creates, updates and deletes against one collection.
///
/// Writes are non-optimistic: nothing local changes when a write resolves.
/// Bindings observing the collection see the effect on their next
/// delivered snapshot. Each outcome is returned to the caller and also
/// announced on the notice side channel.
pub struct CollectionWriter<S> {
    store: Arc<S>,
    collection: String,
    config: BindingConfig,
    notifier: Arc<dyn Notifier>,
}

impl<S> Clone for CollectionWriter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            collection: self.collection.clone(),
            config: self.config.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<S: DocumentStore> CollectionWriter<S> {
    /// Creates a writer with the default configuration, logging notices.
    pub fn new(store: Arc<S>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            config: BindingConfig::default(),
            notifier: Arc::new(TracingNotifier),
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

    /// Target collection.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Creates a document stamped with the current time.
    ///
    /// Returns the identifier the store assigned.
    pub async fn create(&self, fields: Fields) -> StoreResult<DocumentId> {
        self.create_at(fields, Utc::now()).await
    }

    /// Creates a document stamped with `at`.
    ///
    /// The creation field always carries `at`, replacing any value the
    /// payload had for it.
    pub async fn create_at(
        &self,
        mut fields: Fields,
        at: DateTime<Utc>,
    ) -> StoreResult<DocumentId> {
        fields.insert(
            self.config.created_at_field.clone(),
            Value::String(timestamp(at)),
        );
        let result = self.store.create(&self.collection, fields).await;
        match &result {
            Ok(id) => debug!(collection = %self.collection, id = %id, "create acknowledged"),
            Err(err) => warn!(collection = %self.collection, error = %err, "create failed"),
        }
        self.announce(&result, "Added successfully", "Error adding data");
        result
    }

    /// Creates a document authored by `author`.
    ///
    /// The configured author fields carry the user's id and display name,
    /// replacing whatever the payload had for them.
    pub async fn create_as(
        &self,
        author: &Identity,
        mut fields: Fields,
    ) -> StoreResult<DocumentId> {
        author.stamp(
            &mut fields,
            &self.config.author_id_field,
            &self.config.author_name_field,
        );
        self.create(fields).await
    }

    /// Creates a document from a typed record.
    pub async fn create_record<R: Record>(&self, record: &R) -> StoreResult<DocumentId> {
        let fields = match record.to_fields() {
            Ok(fields) => fields,
            Err(err) => {
                self.announce::<()>(&Err(err.clone()), "", "Error adding data");
                return Err(err);
            }
        };
        self.create(fields).await
    }

    /// Merges `fields` into an existing document.
    ///
    /// # Errors
    ///
    /// [`livedoc_core::StoreError::NotFound`] if the document is gone.
    pub async fn update(&self, id: &DocumentId, fields: Fields) -> StoreResult<()> {
        let result = self.store.update(&self.collection, id, fields).await;
        match &result {
            Ok(()) => debug!(collection = %self.collection, id = %id, "update acknowledged"),
            Err(err) => warn!(collection = %self.collection, id = %id, error = %err, "update failed"),
        }
        self.announce(&result, "Updated successfully", "Error updating data");
        result
    }

    /// Deletes a document.
    pub async fn delete(&self, id: &DocumentId) -> StoreResult<()> {
        let result = self.store.delete(&self.collection, id).await;
        match &result {
            Ok(()) => debug!(collection = %self.collection, id = %id, "delete acknowledged"),
            Err(err) => warn!(collection = %self.collection, id = %id, error = %err, "delete failed"),
        }
        self.announce(&result, "Deleted successfully", "Error deleting data");
        result
    }

    fn announce<T>(&self, result: &StoreResult<T>, success: &str, failure: &str) {
        match result {
            Ok(_) if self.config.announce_success => self.notifier.notify(Notice::success(success)),
            Err(err) if self.config.announce_errors => {
                self.notifier.notify(Notice::error(failure, err))
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::{CollectingNotifier, NoticeLevel};
    use chrono::TimeZone;
    use livedoc_core::{fields, Grade, Role, StoreError};
    use livedoc_store::{AccessRule, MemoryStore};
    use serde_json::json;

    fn writer(
        store: &Arc<MemoryStore>,
        collection: &str,
    ) -> (CollectionWriter<MemoryStore>, Arc<CollectingNotifier>) {
        let notices = Arc::new(CollectingNotifier::new());
        let writer =
            CollectionWriter::new(Arc::clone(store), collection).with_notifier(notices.clone());
        (writer, notices)
    }

    #[tokio::test]
    async fn create_stamps_and_overrides_created_at() {
        let store = Arc::new(MemoryStore::new());
        let (writer, notices) = writer(&store, "announcements");
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap();

        let id = writer
            .create_at(fields([("title", json!("Trip")), ("createdAt", json!("forged"))]), at)
            .await
            .unwrap();

        let doc = store.document("announcements", &id).unwrap().unwrap();
        assert_eq!(doc.get_str("createdAt"), Some("2024-03-01T08:15:00.000Z"));
        assert_eq!(notices.take(), vec![Notice::success("Added successfully")]);
    }

    #[tokio::test]
    async fn custom_created_at_field() {
        let store = Arc::new(MemoryStore::new());
        let (writer, _) = writer(&store, "messages");
        let writer = writer.with_config(BindingConfig::new().with_created_at_field("sentAt"));

        let id = writer.create(fields([("text", json!("hi"))])).await.unwrap();
        let doc = store.document("messages", &id).unwrap().unwrap();
        assert!(doc.get_str("sentAt").is_some());
        assert!(doc.get("createdAt").is_none());
    }

    #[tokio::test]
    async fn failures_are_returned_and_announced() {
        let store = Arc::new(MemoryStore::new());
        let (writer, notices) = writer(&store, "homework");

        let err = writer
            .update(&DocumentId::from("x"), fields([("status", json!("submitted"))]))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::not_found("homework", "x"));

        store.set_rule("homework", AccessRule::READ_ONLY);
        assert!(writer.delete(&DocumentId::from("x")).await.is_err());

        let levels: Vec<(NoticeLevel, String)> = notices
            .take()
            .into_iter()
            .map(|n| (n.level, n.message))
            .collect();
        assert_eq!(
            levels,
            vec![
                (NoticeLevel::Error, "Error updating data".to_string()),
                (NoticeLevel::Error, "Error deleting data".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn quiet_config_suppresses_notices() {
        let store = Arc::new(MemoryStore::new());
        let (writer, notices) = writer(&store, "grades");
        let writer = writer.with_config(BindingConfig::quiet());

        writer.create(fields([("value", json!(5))])).await.unwrap();
        assert!(notices.notices().is_empty());
    }

    #[tokio::test]
    async fn create_record_writes_typed_fields() {
        let store = Arc::new(MemoryStore::new());
        let (writer, _) = writer(&store, Grade::COLLECTION);
        let grade: Grade = serde_json::from_value(json!({
            "studentId": "u1",
            "subject": "Math",
            "value": 5.5,
            "date": "2024-03-01",
            "term": 2
        }))
        .unwrap();

        let id = writer.create_record(&grade).await.unwrap();
        let doc = store.document("grades", &id).unwrap().unwrap();
        assert_eq!(doc.get_f64("value"), Some(5.5));
        assert_eq!(doc.get_str("studentId"), Some("u1"));
    }

    #[tokio::test]
    async fn create_as_stamps_the_author() {
        let store = Arc::new(MemoryStore::new());
        let (writer, notices) = writer(&store, "messages");
        let writer =
            writer.with_config(BindingConfig::new().with_author_fields("fromId", "fromName"));
        let me = Identity::new("t1", "Ms. Ivanova", Role::Teacher);

        let id = writer
            .create_as(
                &me,
                fields([("text", json!("See me after class")), ("fromId", json!("forged"))]),
            )
            .await
            .unwrap();

        let doc = store.document("messages", &id).unwrap().unwrap();
        assert_eq!(doc.get_str("fromId"), Some("t1"));
        assert_eq!(doc.get_str("fromName"), Some("Ms. Ivanova"));
        assert!(doc.get_str("createdAt").is_some());
        assert_eq!(notices.take(), vec![Notice::success("Added successfully")]);
    }
}
