//! Record trait: identity + sync flag for everything the store persists.

use crate::id::RecordId;

/// Minimal interface shared by all persisted business records.
///
/// A record is a plain current-state document: it has a string-keyable
/// identity and an offline-sync flag. The flag is `false` on creation and
/// after every local mutation; only the sync routine sets it `true`.
///
/// Implementors must expose the flag under a top-level `synced` field and
/// their id under a top-level `id` field in their serialized form; the sync
/// drain works on the serialized representation.
pub trait Record {
    /// Stable collection/record type name (e.g. "sale", "expense").
    fn record_type(&self) -> &'static str;

    /// Identifier used as the store key (via its string form).
    fn record_id(&self) -> RecordId;

    /// Whether this record has been propagated to the remote side.
    fn synced(&self) -> bool;
}
