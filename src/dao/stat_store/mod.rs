//! Storage trait for stats, shop, inventory, and the purchase unit of work.

/// In-memory backend, used by unit tests and as a reference implementation.
pub mod memory;
#[cfg(feature = "mongo-store")]
/// MongoDB backend.
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{InventoryEntity, ItemEntity, LeaderboardSort, RankMetric, UserStatsEntity},
    storage::StorageResult,
};

/// Abstraction over the persistence layer for stats, shop items, inventories,
/// and the global landing counter.
pub trait StatStore: Send + Sync {
    /// Look up a stats record by its public profile handle.
    fn find_user_by_uuid(
        &self,
        uuid: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<UserStatsEntity>>>;
    /// Look up a stats record by its (guild, user) key.
    fn find_user(
        &self,
        guild_id: String,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserStatsEntity>>>;
    /// Insert a brand-new stats record.
    fn create_user(&self, user: UserStatsEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Refresh the display identity captured at login.
    fn update_identity(
        &self,
        guild_id: String,
        user_id: String,
        username: String,
        avatar: Option<String>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Record the first-seen acquisition timestamp for a role. A timestamp
    /// already present is never overwritten.
    fn record_role_acquired(
        &self,
        guild_id: String,
        user_id: String,
        role_id: String,
        at_ms: i64,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// One page of stats records ordered by the given metric, descending.
    fn leaderboard_page(
        &self,
        sort: LeaderboardSort,
        skip: u64,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<UserStatsEntity>>>;
    /// Number of users whose metric value is strictly greater than `value`.
    fn count_with_metric_above(
        &self,
        metric: RankMetric,
        value: i64,
    ) -> BoxFuture<'static, StorageResult<u64>>;
    /// Look up a shop item by its unique name.
    fn find_item(&self, name: String) -> BoxFuture<'static, StorageResult<Option<ItemEntity>>>;
    /// The full shop catalog.
    fn list_items(&self) -> BoxFuture<'static, StorageResult<Vec<ItemEntity>>>;
    /// A user's inventory, if any purchase ever created one.
    fn find_inventory(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<InventoryEntity>>>;
    /// Increment and return the global landing-page counter.
    fn increment_counter(&self) -> BoxFuture<'static, StorageResult<i64>>;
    /// Open the atomic scope covering the three purchase mutations.
    fn begin_purchase(&self) -> BoxFuture<'static, StorageResult<Box<dyn PurchaseScope>>>;
    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Unit of work for the purchase transaction.
///
/// Mutations staged between [`StatStore::begin_purchase`] and [`commit`] become
/// visible all at once; [`abort`] (or dropping the scope) leaves every document
/// untouched. Guarded mutations fail with
/// [`StorageError::Precondition`](crate::dao::storage::StorageError::Precondition)
/// when the document state no longer satisfies them.
///
/// [`commit`]: PurchaseScope::commit
/// [`abort`]: PurchaseScope::abort
pub trait PurchaseScope: Send {
    /// Debit stars from the user identified by `uuid`, guarded by the balance.
    fn debit_stars(&mut self, uuid: Uuid, amount: i64) -> BoxFuture<'_, StorageResult<()>>;
    /// Decrement finite stock, guarded by availability. Callers skip this for
    /// unlimited items.
    fn decrement_stock(&mut self, item_name: String, quantity: i64)
    -> BoxFuture<'_, StorageResult<()>>;
    /// Increment the user's line for the item, appending it (and the inventory
    /// document itself) when missing.
    fn add_inventory_line(
        &mut self,
        user_id: String,
        item_name: String,
        quantity: i64,
    ) -> BoxFuture<'_, StorageResult<()>>;
    /// Make every staged mutation visible.
    fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>>;
    /// Discard every staged mutation.
    fn abort(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>>;
}
