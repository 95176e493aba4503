//! Configuration for bindings and feeds.

use std::time::Duration;

/// Configuration for a [`crate::LiveBinding`] and its writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConfig {
    /// Field stamped with the creation time on every create.
    pub created_at_field: String,
    /// Field receiving the author's user id on authored creates.
    pub author_id_field: String,
    /// Field receiving the author's display name on authored creates.
    pub author_name_field: String,
    /// Whether successful mutations emit a notice.
    pub announce_success: bool,
    /// Whether failures emit a notice.
    pub announce_errors: bool,
}

impl BindingConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            created_at_field: "createdAt".to_string(),
            author_id_field: "authorId".to_string(),
            author_name_field: "authorName".to_string(),
            announce_success: true,
            announce_errors: true,
        }
    }

    /// Sets the creation timestamp field.
    #[must_use]
    pub fn with_created_at_field(mut self, field: impl Into<String>) -> Self {
        self.created_at_field = field.into();
        self
    }

    /// Sets the authorship fields, e.g. `fromId` and `fromName` for messages.
    #[must_use]
    pub fn with_author_fields(
        mut self,
        id_field: impl Into<String>,
        name_field: impl Into<String>,
    ) -> Self {
        self.author_id_field = id_field.into();
        self.author_name_field = name_field.into();
        self
    }

    /// Enables or disables success notices.
    #[must_use]
    pub fn with_announce_success(mut self, announce: bool) -> Self {
        self.announce_success = announce;
        self
    }

    /// Enables or disables failure notices.
    #[must_use]
    pub fn with_announce_errors(mut self, announce: bool) -> Self {
        self.announce_errors = announce;
        self
    }

    /// A configuration that emits no notices at all.
    pub fn quiet() -> Self {
        Self::new()
            .with_announce_success(false)
            .with_announce_errors(false)
    }
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for a [`crate::NotificationFeed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Collection holding direct messages.
    pub messages_collection: String,
    /// Collection holding announcements.
    pub announcements_collection: String,
    /// How far back announcements count as new.
    pub announcement_window: Duration,
}

impl FeedConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            messages_collection: "messages".to_string(),
            announcements_collection: "announcements".to_string(),
            announcement_window: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }

    /// Sets the messages collection.
    #[must_use]
    pub fn with_messages_collection(mut self, collection: impl Into<String>) -> Self {
        self.messages_collection = collection.into();
        self
    }

    /// Sets the announcements collection.
    #[must_use]
    pub fn with_announcements_collection(mut self, collection: impl Into<String>) -> Self {
        self.announcements_collection = collection.into();
        self
    }

    /// Sets the announcement window.
    #[must_use]
    pub fn with_announcement_window(mut self, window: Duration) -> Self {
        self.announcement_window = window;
        self
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new()
    }
}
