use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillbook_core::{DomainError, DomainResult, Record, RecordId};

/// Optional ways to reach a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A person the shop knows by name, usually because they buy on credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: RecordId,
    pub name: String,
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
}

impl Customer {
    pub fn new(
        name: impl Into<String>,
        contact: ContactInfo,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }

        Ok(Self {
            id: RecordId::new(),
            name,
            contact,
            created_at,
            synced: false,
        })
    }

    pub fn update_contact(&mut self, contact: ContactInfo) {
        self.contact = contact;
        self.synced = false;
    }
}

impl Record for Customer {
    fn record_type(&self) -> &'static str {
        "customer"
    }

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn synced(&self) -> bool {
        self.synced
    }
}
