use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillbook_core::{BranchId, DomainError, DomainResult, Record, RecordId};

/// A stocked product with current quantity and pricing.
///
/// Quantity is a plain counter, not a ledger: adjustments overwrite the
/// running total and there is no movement history to replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: RecordId,
    pub branch_id: Option<BranchId>,
    pub name: String,
    pub quantity: i64,
    /// What the shop paid per unit, in minor currency units.
    pub unit_cost: u64,
    /// What the shop charges per unit, in minor currency units.
    pub unit_price: u64,
    /// At or below this quantity the item counts as low stock.
    pub low_stock_threshold: i64,
    pub updated_at: DateTime<Utc>,
    pub synced: bool,
}

impl InventoryItem {
    pub fn stock(
        name: impl Into<String>,
        quantity: i64,
        unit_cost: u64,
        unit_price: u64,
        low_stock_threshold: i64,
        branch_id: Option<BranchId>,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if quantity < 0 {
            return Err(DomainError::validation("item quantity cannot be negative"));
        }
        if low_stock_threshold < 0 {
            return Err(DomainError::validation(
                "low stock threshold cannot be negative",
            ));
        }

        Ok(Self {
            id: RecordId::new(),
            branch_id,
            name,
            quantity,
            unit_cost,
            unit_price,
            low_stock_threshold,
            updated_at: at,
            synced: false,
        })
    }

    /// Apply a stock movement. Positive delta restocks, negative delta sells
    /// or writes off. The resulting quantity may not go below zero.
    pub fn adjust(&mut self, delta: i64, at: DateTime<Utc>) -> DomainResult<()> {
        if delta == 0 {
            return Err(DomainError::validation("stock adjustment cannot be zero"));
        }
        let next = self.quantity + delta;
        if next < 0 {
            return Err(DomainError::invariant(format!(
                "cannot remove {} units, only {} in stock",
                -delta, self.quantity
            )));
        }
        self.quantity = next;
        self.updated_at = at;
        self.synced = false;
        Ok(())
    }

    pub fn set_prices(&mut self, unit_cost: u64, unit_price: u64, at: DateTime<Utc>) {
        self.unit_cost = unit_cost;
        self.unit_price = unit_price;
        self.updated_at = at;
        self.synced = false;
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }
}

impl Record for InventoryItem {
    fn record_type(&self) -> &'static str {
        "inventory_item"
    }

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn synced(&self) -> bool {
        self.synced
    }
}
