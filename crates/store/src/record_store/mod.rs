//! Record store boundary.
//!
//! The trait is the abstraction the rest of the system programs against;
//! backends decide where the JSON documents actually live.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use r#trait::{RecordStore, RecordStoreExt};
