//! `tillbook-app` — the facade the shop client talks to.
//!
//! One [`ShopApp`] owns the record store, the sync queue and the
//! connectivity watcher, and exposes the operations the till screens need:
//! sign-in, recording sales and expenses, stock and debt management, the
//! dashboard totals, and explicit or background sync. Every mutation lands
//! locally first and leaves a queue entry, so nothing here ever waits on
//! the network.

pub mod config;
pub mod error;
pub mod shop;

pub use config::{AppConfig, DatabaseLocation};
pub use error::{AppError, AppResult};
pub use shop::ShopApp;
