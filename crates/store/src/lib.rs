//! `tillbook-store` — the offline record store.
//!
//! Records are plain JSON documents filed under named collections, the shape
//! the till keeps its working data in while offline. The [`RecordStore`]
//! trait makes no storage assumptions; an in-memory backend serves tests and
//! a SQLite backend serves the installed app.

pub mod collection;
pub mod error;
pub mod record_store;

pub use collection::Collection;
pub use error::{StoreError, StoreResult};
pub use record_store::{InMemoryStore, RecordStore, RecordStoreExt, SqliteStore};
