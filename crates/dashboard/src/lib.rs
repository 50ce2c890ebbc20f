//! `tillbook-dashboard` — the totals behind the dashboard tiles.
//!
//! Nothing here touches storage. Callers load the records they care about
//! and these functions filter and sum them, so the arithmetic stays pure
//! and trivially testable.

pub mod report;

pub use report::{
    BranchActivity, DashboardSnapshot, SalesSummary, branch_breakdown, expense_total, low_stock,
    outstanding_debt, sales_summary,
};
