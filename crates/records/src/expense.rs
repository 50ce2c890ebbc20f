use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillbook_core::{BranchId, DomainError, DomainResult, Record, RecordId};

/// Coarse expense buckets used by the dashboard breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Stock,
    Rent,
    Utilities,
    Transport,
    Wages,
    Other,
}

/// Money spent running the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: RecordId,
    pub branch_id: Option<BranchId>,
    pub category: ExpenseCategory,
    pub description: String,
    /// Amount in smallest currency unit.
    pub amount: u64,
    pub spent_at: DateTime<Utc>,
    pub synced: bool,
}

impl Expense {
    pub fn log(
        category: ExpenseCategory,
        description: impl Into<String>,
        amount: u64,
        branch_id: Option<BranchId>,
        spent_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(DomainError::validation("expense description cannot be empty"));
        }
        if amount == 0 {
            return Err(DomainError::validation("expense amount must be positive"));
        }

        Ok(Self {
            id: RecordId::new(),
            branch_id,
            category,
            description,
            amount,
            spent_at,
            synced: false,
        })
    }
}

impl Record for Expense {
    fn record_type(&self) -> &'static str {
        "expense"
    }

    fn record_id(&self) -> RecordId {
        self.id
    }

    fn synced(&self) -> bool {
        self.synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logged_expense_starts_unsynced() {
        let expense =
            Expense::log(ExpenseCategory::Rent, "August rent", 50_000, None, Utc::now()).unwrap();
        assert!(!expense.synced);
        assert_eq!(expense.category, ExpenseCategory::Rent);
    }

    #[test]
    fn blank_description_is_rejected() {
        let err =
            Expense::log(ExpenseCategory::Other, "   ", 100, None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err =
            Expense::log(ExpenseCategory::Transport, "fuel", 0, None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn category_serializes_lowercase() {
        let expense =
            Expense::log(ExpenseCategory::Utilities, "power", 1_200, None, Utc::now()).unwrap();
        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(value["category"].as_str(), Some("utilities"));
    }
}
