use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillbook_core::{BranchId, DomainError, DomainResult, Record, RecordId};

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Mobile,
    /// Sold on credit; the amount becomes a debt against a customer.
    Credit,
}

/// Sale line: what was sold, how many, at what price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    /// Inventory item this line refers to, if it was picked from stock.
    pub item_id: Option<RecordId>,
    pub description: String,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

impl SaleLine {
    pub fn total(&self) -> u64 {
        self.unit_price * self.quantity as u64
    }
}

/// A sale recorded at the till.
///
/// Immutable once recorded: corrections are modelled as new records, not
/// edits, so `synced` never needs to flip back to `false` after a drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: RecordId,
    pub branch_id: Option<BranchId>,
    pub lines: Vec<SaleLine>,
    pub payment: PaymentMethod,
    /// Required for credit sales; optional otherwise.
    pub customer_id: Option<RecordId>,
    pub recorded_at: DateTime<Utc>,
    pub synced: bool,
}

impl Sale {
    /// Record a new sale. Fails if the lines are empty or malformed, or if a
    /// credit sale has no customer attached.
    pub fn record(
        lines: Vec<SaleLine>,
        payment: PaymentMethod,
        branch_id: Option<BranchId>,
        customer_id: Option<RecordId>,
        recorded_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("sale must have at least one line"));
        }
        for line in &lines {
            if line.description.trim().is_empty() {
                return Err(DomainError::validation("line description cannot be empty"));
            }
            if line.quantity <= 0 {
                return Err(DomainError::validation("line quantity must be positive"));
            }
            if line.unit_price == 0 {
                return Err(DomainError::validation("line unit_price must be positive"));
            }
        }
        if payment == PaymentMethod::Credit && customer_id.is_none() {
            return Err(DomainError::invariant(
                "credit sale requires a customer to owe the amount",
            ));
        }

        Ok(Self {
            id: RecordId::new(),
            branch_id,
            lines,
            payment,
            customer_id,
            recorded_at,
            synced: false,
        })
    }

    /// Total sale amount in minor currency units.
    pub fn total(&self) -> u64 {
        self.lines.iter().map(SaleLine::total).sum()
    }
}

impl Record for Sale {
    fn record_type(&self) -> &'static str {
        "sale"
    }

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn synced(&self) -> bool {
        self.synced
    }
}
