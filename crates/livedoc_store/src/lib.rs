//! # livedoc store
//!
//! The remote document store boundary.
//!
//! This crate provides:
//! - The four-operation [`DocumentStore`] contract (listen, create, update,
//!   delete)
//! - Cancellable push subscriptions ([`Listener`]) yielding ordered
//!   [`StoreEvent`]s
//! - [`MemoryStore`], an in-process store with fault injection and JSON
//!   fixtures
//!
//! ## Key Invariants
//!
//! - Snapshots are full matching sets, never diffs
//! - Events for one listener are delivered in commit order
//! - A failed listener receives one failure and is then closed
//! - Dropping a listener releases it

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fixture;
mod memory;
mod store;

pub use fixture::{fixture_documents, parse_fixture, FixtureDocument};
pub use memory::{AccessRule, MemoryStore};
pub use store::{
    DocumentStore, EventSender, Listener, ListenerId, Snapshot, StoreEvent, TryRecvError,
};
