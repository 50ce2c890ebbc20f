//! `tillbook-records` — business records persisted by the shop data core.
//!
//! Records are plain current-state documents: no versioning, no event
//! history, no cross-collection integrity. Each carries an `id`, a `synced`
//! flag (`false` on creation and after every local mutation) and a business
//! timestamp. Validation lives in the constructors and mutation helpers.

pub mod customer;
pub mod debt;
pub mod expense;
pub mod item;
pub mod sale;

pub use customer::{ContactInfo, Customer};
pub use debt::DebtRecord;
pub use expense::{Expense, ExpenseCategory};
pub use item::InventoryItem;
pub use sale::{PaymentMethod, Sale, SaleLine};
