//! `tillbook-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no storage or sync concerns).

pub mod error;
pub mod id;
pub mod record;

pub use error::{DomainError, DomainResult};
pub use id::{BranchId, RecordId};
pub use record::Record;
