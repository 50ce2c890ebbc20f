//! Shared tracing setup for tillbook binaries and tests.

/// Tracing configuration (filters, formatting).
pub mod tracing;

pub use crate::tracing::{init, init_with_default};
