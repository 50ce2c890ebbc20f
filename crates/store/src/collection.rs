use serde::{Deserialize, Serialize};

/// Named record collection.
///
/// The set is fixed: one collection per business entity, one for the local
/// session user, and one for the sync queue itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Sales,
    Expenses,
    Inventory,
    Customers,
    Debts,
    User,
    SyncQueue,
}

impl Collection {
    /// Every collection the store manages.
    pub const ALL: [Collection; 7] = [
        Collection::Sales,
        Collection::Expenses,
        Collection::Inventory,
        Collection::Customers,
        Collection::Debts,
        Collection::User,
        Collection::SyncQueue,
    ];

    /// Collections whose records carry a `synced` flag and get pushed by the
    /// sync drain. Everything except the queue itself.
    pub const BUSINESS: [Collection; 6] = [
        Collection::Sales,
        Collection::Expenses,
        Collection::Inventory,
        Collection::Customers,
        Collection::Debts,
        Collection::User,
    ];

    /// Stable name used as the storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Sales => "sales",
            Collection::Expenses => "expenses",
            Collection::Inventory => "inventory",
            Collection::Customers => "customers",
            Collection::Debts => "debts",
            Collection::User => "user",
            Collection::SyncQueue => "sync_queue",
        }
    }

    /// Inverse of [`Collection::as_str`]. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Collection::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
