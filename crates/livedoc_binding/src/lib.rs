//! # livedoc binding
//!
//! Live collection bindings over a shared, remotely mutated document store.
//!
//! This crate provides:
//! - [`LiveBinding`]: a local snapshot of `(collection, query)` kept in sync
//!   through a push subscription, with write-through mutations
//! - [`CollectionWriter`]: non-optimistic create, update and delete for one
//!   collection
//! - A notice side channel ([`Notifier`]) for user-facing outcomes
//! - [`NotificationFeed`]: unread messages and recent announcements
//!
//! ## Key Invariants
//!
//! - The local sequence is the last delivered snapshot, replaced atomically
//! - Bindings with different queries never share state
//! - A released binding never applies a late notification
//! - Mutations never touch the local sequence; only deliveries do
//! - Failures are not retried; re-subscribing is the recovery path

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod binding;
mod config;
mod feed;
mod notice;
mod writer;

pub use binding::{BindingState, BindingView, LiveBinding};
pub use config::{BindingConfig, FeedConfig};
pub use feed::{Notification, NotificationFeed, NotificationKind};
pub use notice::{CollectingNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use writer::CollectionWriter;
