use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use tillbook_core::BranchId;
use tillbook_records::{DebtRecord, Expense, InventoryItem, PaymentMethod, Sale};

/// One day's sales, split by payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SalesSummary {
    pub count: usize,
    /// Total revenue in minor currency units.
    pub revenue: u64,
    pub cash: u64,
    pub mobile: u64,
    pub credit: u64,
}

/// Revenue and spend attributed to one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchActivity {
    /// `None` collects records that were never assigned to a branch.
    pub branch_id: Option<BranchId>,
    pub sale_count: usize,
    pub revenue: u64,
    pub expense_count: usize,
    pub spent: u64,
}

/// Everything the dashboard shows for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    pub day: NaiveDate,
    pub sales: SalesSummary,
    pub expense_total: u64,
    /// Revenue minus expenses for the day; negative when the shop spent more
    /// than it took in.
    pub net: i64,
    pub outstanding_debt: u64,
    pub low_stock: Vec<InventoryItem>,
    /// Per-branch view, only filled in for admins.
    pub branches: Option<Vec<BranchActivity>>,
}

impl DashboardSnapshot {
    pub fn for_day(
        day: NaiveDate,
        sales: &[Sale],
        expenses: &[Expense],
        debts: &[DebtRecord],
        items: &[InventoryItem],
    ) -> Self {
        let sales = sales_summary(sales, day);
        let expense_total = expense_total(expenses, day);
        Self {
            day,
            sales,
            expense_total,
            net: sales.revenue as i64 - expense_total as i64,
            outstanding_debt: outstanding_debt(debts),
            low_stock: low_stock(items),
            branches: None,
        }
    }

    pub fn with_branch_breakdown(mut self, sales: &[Sale], expenses: &[Expense]) -> Self {
        self.branches = Some(branch_breakdown(sales, expenses));
        self
    }
}

/// Count and sum the sales recorded on `on_day`.
pub fn sales_summary(sales: &[Sale], on_day: NaiveDate) -> SalesSummary {
    let mut summary = SalesSummary::default();
    for sale in sales.iter().filter(|s| s.recorded_at.date_naive() == on_day) {
        let total = sale.total();
        summary.count += 1;
        summary.revenue += total;
        match sale.payment {
            PaymentMethod::Cash => summary.cash += total,
            PaymentMethod::Mobile => summary.mobile += total,
            PaymentMethod::Credit => summary.credit += total,
        }
    }
    summary
}

/// Sum the expenses spent on `on_day`, in minor currency units.
pub fn expense_total(expenses: &[Expense], on_day: NaiveDate) -> u64 {
    expenses
        .iter()
        .filter(|e| e.spent_at.date_naive() == on_day)
        .map(|e| e.amount)
        .sum()
}

/// Sum what is still owed across all unsettled debts.
pub fn outstanding_debt(debts: &[DebtRecord]) -> u64 {
    debts
        .iter()
        .filter(|d| !d.is_settled())
        .map(DebtRecord::outstanding)
        .sum()
}

/// Items at or below their low-stock threshold.
pub fn low_stock(items: &[InventoryItem]) -> Vec<InventoryItem> {
    items
        .iter()
        .filter(|i| i.is_low_stock())
        .cloned()
        .collect()
}

/// Group all sales and expenses by branch.
///
/// Sorted with the unbranched bucket first, then by branch id, so the
/// output is stable across runs.
pub fn branch_breakdown(sales: &[Sale], expenses: &[Expense]) -> Vec<BranchActivity> {
    let mut by_branch: HashMap<Option<BranchId>, BranchActivity> = HashMap::new();

    for sale in sales {
        let activity = by_branch
            .entry(sale.branch_id)
            .or_insert_with(|| empty_activity(sale.branch_id));
        activity.sale_count += 1;
        activity.revenue += sale.total();
    }
    for expense in expenses {
        let activity = by_branch
            .entry(expense.branch_id)
            .or_insert_with(|| empty_activity(expense.branch_id));
        activity.expense_count += 1;
        activity.spent += expense.amount;
    }

    let mut breakdown: Vec<_> = by_branch.into_values().collect();
    breakdown.sort_by_key(|activity| activity.branch_id.map(|id| *id.as_uuid().as_bytes()));
    breakdown
}

fn empty_activity(branch_id: Option<BranchId>) -> BranchActivity {
    BranchActivity {
        branch_id,
        sale_count: 0,
        revenue: 0,
        expense_count: 0,
        spent: 0,
    }
}
