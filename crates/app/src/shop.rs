//! The [`ShopApp`] facade: everything a till screen can do, one method each.
//!
//! Every mutation follows the same offline-first shape: validate through the
//! record constructor, write the whole document to the local store, then
//! leave a queue entry so the next drain can push it. Reads come straight
//! from the store. Nothing in here waits on the network.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use tillbook_auth::{Role, User, ensure_admin};
use tillbook_core::{BranchId, DomainError, Record, RecordId};
use tillbook_dashboard::DashboardSnapshot;
use tillbook_records::{
    Customer, DebtRecord, Expense, ExpenseCategory, InventoryItem, PaymentMethod, Sale, SaleLine,
};
use tillbook_store::{
    Collection, InMemoryStore, RecordStore, RecordStoreExt, SqliteStore, StoreError,
};
use tillbook_sync::{
    ConnectivityState, ConnectivityWatcher, DrainReport, SimulatedTransport, SyncEngine,
    SyncWorker, SyncWorkerHandle,
};

use crate::{AppConfig, AppResult, DatabaseLocation};

type SharedStore = Arc<dyn RecordStore>;

/// The application facade. Owns the record store, the sync engine and the
/// session; clones share all of them, so one per UI layer is fine.
#[derive(Clone)]
pub struct ShopApp {
    store: SharedStore,
    engine: SyncEngine<SharedStore>,
    config: AppConfig,
}

impl ShopApp {
    /// Open the configured database and prepare every collection.
    ///
    /// The connectivity watcher starts online; hosts that know better call
    /// [`ShopApp::set_offline`] right after.
    pub async fn open(config: AppConfig) -> AppResult<Self> {
        let store: SharedStore = match &config.database {
            DatabaseLocation::InMemory => InMemoryStore::arc(),
            DatabaseLocation::File(path) => Arc::new(SqliteStore::open(path).await?),
            DatabaseLocation::DataDir => {
                let path = SqliteStore::default_db_path()?;
                Arc::new(SqliteStore::open(&path).await?)
            }
        };
        store.init().await?;

        let watcher = ConnectivityWatcher::online();
        let transport = Arc::new(SimulatedTransport::new(config.transport_latency));
        let engine = SyncEngine::new(store.clone(), watcher, transport)
            .with_prune_age(config.queue_prune_age);
        tracing::info!(database = ?config.database, "store ready");

        Ok(Self {
            store,
            engine,
            config,
        })
    }

    /// In-memory app with an instant transport. Tests and demos.
    pub async fn in_memory() -> AppResult<Self> {
        Self::open(
            AppConfig::default()
                .with_database(DatabaseLocation::InMemory)
                .with_transport_latency(Duration::ZERO),
        )
        .await
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // -------------------------
    // Session
    // -------------------------

    /// Sign a user in, replacing any previous session record.
    ///
    /// The role is derived from the email suffix alone; see
    /// [`Role::for_email`].
    pub async fn sign_in(
        &self,
        email: impl Into<String>,
        display_name: impl Into<String>,
        branch_id: Option<BranchId>,
    ) -> AppResult<User> {
        let email = email.into();
        let role = Role::for_email(&email, &self.config.admin_email_suffix);
        let user = User::sign_in(email, display_name, role, branch_id, Utc::now())?;

        self.store.clear(Collection::User).await?;
        self.store.put_record(Collection::User, &user).await?;
        self.enqueue_snapshot(Collection::User, &user, "auth.sign_in")
            .await?;
        tracing::info!(email = %user.email, role = %user.role, "user signed in");
        Ok(user)
    }

    /// The signed-in user, if any. The user collection holds at most one
    /// record.
    pub async fn current_user(&self) -> AppResult<Option<User>> {
        let users: Vec<User> = self.store.get_all_records(Collection::User).await?;
        Ok(users.into_iter().next())
    }

    /// Drop the local session. Queued work and records stay put.
    pub async fn sign_out(&self) -> AppResult<()> {
        self.store.clear(Collection::User).await?;
        tracing::info!("user signed out");
        Ok(())
    }

    // -------------------------
    // Sales
    // -------------------------

    /// Record a sale at the till, stamped with the signed-in user's branch.
    ///
    /// A credit sale also raises a [`DebtRecord`] against the customer for
    /// the full amount, queued as its own mutation.
    pub async fn record_sale(
        &self,
        lines: Vec<SaleLine>,
        payment: PaymentMethod,
        customer_id: Option<RecordId>,
    ) -> AppResult<Sale> {
        let branch_id = self.current_branch().await?;
        let sale = Sale::record(lines, payment, branch_id, customer_id, Utc::now())?;
        self.create_and_enqueue(Collection::Sales, &sale, "sales.record")
            .await?;

        if sale.payment == PaymentMethod::Credit {
            if let Some(customer_id) = sale.customer_id {
                let debt = DebtRecord::incur(customer_id, sale.total(), sale.recorded_at, None)?;
                self.create_and_enqueue(Collection::Debts, &debt, "debts.incur")
                    .await?;
            }
        }

        tracing::info!(sale_id = %sale.id, total = sale.total(), payment = ?sale.payment, "sale recorded");
        Ok(sale)
    }

    pub async fn sales(&self) -> AppResult<Vec<Sale>> {
        Ok(self.store.get_all_records(Collection::Sales).await?)
    }

    // -------------------------
    // Expenses
    // -------------------------

    pub async fn log_expense(
        &self,
        category: ExpenseCategory,
        description: impl Into<String>,
        amount: u64,
    ) -> AppResult<Expense> {
        let branch_id = self.current_branch().await?;
        let expense = Expense::log(category, description, amount, branch_id, Utc::now())?;
        self.create_and_enqueue(Collection::Expenses, &expense, "expenses.log")
            .await?;
        Ok(expense)
    }

    /// Delete an expense. Deleting one that is already gone is a no-op and
    /// queues nothing.
    pub async fn delete_expense(&self, id: RecordId) -> AppResult<()> {
        self.delete_and_enqueue(Collection::Expenses, id, "expenses.delete")
            .await
    }

    pub async fn expenses(&self) -> AppResult<Vec<Expense>> {
        Ok(self.store.get_all_records(Collection::Expenses).await?)
    }

    // -------------------------
    // Inventory
    // -------------------------

    /// Create or replace an inventory item as edited on the stock screen.
    pub async fn upsert_item(&self, mut item: InventoryItem) -> AppResult<InventoryItem> {
        item.synced = false;
        self.save_and_enqueue(Collection::Inventory, &item, "inventory.upsert")
            .await?;
        Ok(item)
    }

    /// Apply a stock movement: positive delta restocks, negative sells or
    /// writes off. Fails if the item is unknown or the delta overdraws it.
    pub async fn adjust_stock(&self, item_id: RecordId, delta: i64) -> AppResult<InventoryItem> {
        let key = item_id.to_string();
        let mut item: InventoryItem = self
            .store
            .get_record(Collection::Inventory, &key)
            .await?
            .ok_or_else(DomainError::not_found)?;
        item.adjust(delta, Utc::now())?;
        self.save_and_enqueue(Collection::Inventory, &item, "inventory.adjust")
            .await?;
        Ok(item)
    }

    pub async fn remove_item(&self, item_id: RecordId) -> AppResult<()> {
        self.delete_and_enqueue(Collection::Inventory, item_id, "inventory.remove")
            .await
    }

    pub async fn inventory(&self) -> AppResult<Vec<InventoryItem>> {
        Ok(self.store.get_all_records(Collection::Inventory).await?)
    }

    // -------------------------
    // Customers and debts
    // -------------------------

    pub async fn save_customer(&self, mut customer: Customer) -> AppResult<Customer> {
        customer.synced = false;
        self.save_and_enqueue(Collection::Customers, &customer, "customers.save")
            .await?;
        Ok(customer)
    }

    pub async fn customers(&self) -> AppResult<Vec<Customer>> {
        Ok(self.store.get_all_records(Collection::Customers).await?)
    }

    /// Record a debt a customer ran up outside a sale (e.g. a carried-over
    /// balance from the paper book).
    pub async fn record_debt(
        &self,
        customer_id: RecordId,
        amount: u64,
        due_at: Option<DateTime<Utc>>,
    ) -> AppResult<DebtRecord> {
        let debt = DebtRecord::incur(customer_id, amount, Utc::now(), due_at)?;
        self.create_and_enqueue(Collection::Debts, &debt, "debts.incur")
            .await?;
        Ok(debt)
    }

    /// Record a repayment against a debt. Overpaying fails and leaves the
    /// record untouched.
    pub async fn record_debt_payment(
        &self,
        debt_id: RecordId,
        amount: u64,
    ) -> AppResult<DebtRecord> {
        let key = debt_id.to_string();
        let mut debt: DebtRecord = self
            .store
            .get_record(Collection::Debts, &key)
            .await?
            .ok_or_else(DomainError::not_found)?;
        debt.record_payment(amount, Utc::now())?;
        self.save_and_enqueue(Collection::Debts, &debt, "debts.payment")
            .await?;
        Ok(debt)
    }

    pub async fn debts(&self) -> AppResult<Vec<DebtRecord>> {
        Ok(self.store.get_all_records(Collection::Debts).await?)
    }

    // -------------------------
    // Sync and connectivity
    // -------------------------

    /// Queue entries still waiting for a successful push.
    pub async fn pending_sync_count(&self) -> AppResult<usize> {
        Ok(self.engine.queue().pending_count().await?)
    }

    /// Run one drain pass right now. Fails fast when offline.
    pub async fn sync_now(&self) -> AppResult<DrainReport> {
        Ok(self.engine.drain().await?)
    }

    /// Spawn the background worker that drains on an interval and on every
    /// reconnect. Keep the handle; dropping it leaves the worker running.
    pub fn spawn_sync_worker(&self) -> SyncWorkerHandle {
        SyncWorker::new(self.engine.clone(), self.config.sync_interval).start()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.engine.watcher().state()
    }

    pub fn is_online(&self) -> bool {
        self.engine.watcher().is_online()
    }

    /// Report the network back. The background worker reacts with an
    /// immediate drain.
    pub fn set_online(&self) {
        self.engine.watcher().set_online();
    }

    pub fn set_offline(&self) {
        self.engine.watcher().set_offline();
    }

    // -------------------------
    // Dashboard
    // -------------------------

    /// Figures for one day, computed over the local store. Admins also get
    /// the per-branch breakdown; staff get the totals alone.
    pub async fn dashboard(&self, on_day: NaiveDate) -> AppResult<DashboardSnapshot> {
        let sales: Vec<Sale> = self.store.get_all_records(Collection::Sales).await?;
        let expenses: Vec<Expense> = self.store.get_all_records(Collection::Expenses).await?;
        let debts: Vec<DebtRecord> = self.store.get_all_records(Collection::Debts).await?;
        let items: Vec<InventoryItem> = self.store.get_all_records(Collection::Inventory).await?;

        let mut snapshot = DashboardSnapshot::for_day(on_day, &sales, &expenses, &debts, &items);
        if let Some(user) = self.current_user().await? {
            if ensure_admin(user.role).is_ok() {
                snapshot = snapshot.with_branch_breakdown(&sales, &expenses);
            }
        }
        Ok(snapshot)
    }

    // -------------------------
    // Write plumbing
    // -------------------------

    async fn current_branch(&self) -> AppResult<Option<BranchId>> {
        Ok(self.current_user().await?.and_then(|user| user.branch_id))
    }

    /// Create-only write plus its queue entry.
    async fn create_and_enqueue<R>(
        &self,
        collection: Collection,
        record: &R,
        action: &str,
    ) -> AppResult<()>
    where
        R: Record + Serialize + Sync,
    {
        if let Err(err) = self.store.add_record(collection, record).await {
            tracing::warn!(collection = %collection, error = %err, "local write failed");
            return Err(err.into());
        }
        self.enqueue_snapshot(collection, record, action).await
    }

    /// Insert-or-replace write plus its queue entry.
    async fn save_and_enqueue<R>(
        &self,
        collection: Collection,
        record: &R,
        action: &str,
    ) -> AppResult<()>
    where
        R: Record + Serialize + Sync,
    {
        if let Err(err) = self.store.put_record(collection, record).await {
            tracing::warn!(collection = %collection, error = %err, "local write failed");
            return Err(err.into());
        }
        self.enqueue_snapshot(collection, record, action).await
    }

    async fn enqueue_snapshot<R>(
        &self,
        collection: Collection,
        record: &R,
        action: &str,
    ) -> AppResult<()>
    where
        R: Record + Serialize + Sync,
    {
        let data = serde_json::to_value(record).map_err(StoreError::from)?;
        self.engine
            .queue()
            .enqueue(action, collection, record.record_id().to_string(), data)
            .await?;
        Ok(())
    }

    /// Delete plus a queue entry carrying the last known snapshot. Nothing
    /// is queued when the record was already gone.
    async fn delete_and_enqueue(
        &self,
        collection: Collection,
        id: RecordId,
        action: &str,
    ) -> AppResult<()> {
        let key = id.to_string();
        let snapshot = self.store.get(collection, &key).await?;
        self.store.delete(collection, &key).await?;
        if let Some(snapshot) = snapshot {
            self.engine
                .queue()
                .enqueue(action, collection, key, snapshot)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppError;
    use tillbook_records::ContactInfo;

    fn line(description: &str, quantity: i64, unit_price: u64) -> SaleLine {
        SaleLine {
            item_id: None,
            description: description.to_string(),
            quantity,
            unit_price,
        }
    }

    #[tokio::test]
    async fn admin_suffix_controls_the_role() {
        let app = ShopApp::in_memory().await.unwrap();

        let owner = app
            .sign_in("ayesha@admin.tillbook", "Ayesha", None)
            .await
            .unwrap();
        assert_eq!(owner.role, Role::Admin);

        let clerk = app
            .sign_in("tariq@shop.example", "Tariq", None)
            .await
            .unwrap();
        assert_eq!(clerk.role, Role::Staff);

        // One session record at a time: the second sign-in replaced the first.
        let current = app.current_user().await.unwrap().unwrap();
        assert_eq!(current.email, "tariq@shop.example");

        app.sign_out().await.unwrap();
        assert!(app.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn credit_sale_raises_a_debt() {
        let app = ShopApp::in_memory().await.unwrap();
        let customer = app
            .save_customer(
                Customer::new("Bibi Gul", ContactInfo::default(), Utc::now()).unwrap(),
            )
            .await
            .unwrap();

        let sale = app
            .record_sale(
                vec![line("flour 10kg", 2, 1_500)],
                PaymentMethod::Credit,
                Some(customer.id),
            )
            .await
            .unwrap();

        let debts = app.debts().await.unwrap();
        assert_eq!(debts.len(), 1);
        assert_eq!(debts[0].customer_id, customer.id);
        assert_eq!(debts[0].outstanding(), sale.total());

        // customer + sale + debt, one queue entry each
        assert_eq!(app.pending_sync_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn overdraw_leaves_the_stock_alone() {
        let app = ShopApp::in_memory().await.unwrap();
        let item = app
            .upsert_item(
                InventoryItem::stock("sugar 1kg", 3, 700, 900, 5, None, Utc::now()).unwrap(),
            )
            .await
            .unwrap();

        let err = app.adjust_stock(item.id, -5).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::InvariantViolation(_))
        ));

        let inventory = app.inventory().await.unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].quantity, 3);
    }

    #[tokio::test]
    async fn deleting_a_missing_record_queues_nothing() {
        let app = ShopApp::in_memory().await.unwrap();
        app.delete_expense(RecordId::new()).await.unwrap();
        assert_eq!(app.pending_sync_count().await.unwrap(), 0);
    }
}
