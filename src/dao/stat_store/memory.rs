//! In-memory [`StatStore`] backend.
//!
//! Backs the unit tests and doubles as the reference semantics for the
//! purchase unit of work: mutations are staged and applied all-or-nothing
//! under a single lock at commit time.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::future::BoxFuture;
use uuid::Uuid;

use super::{PurchaseScope, StatStore};
use crate::dao::{
    models::{
        InventoryEntity, InventoryLineEntity, ItemEntity, LeaderboardSort, RankMetric,
        UserStatsEntity,
    },
    storage::{PurchaseGuard, StorageError, StorageResult},
};

/// Process-local [`StatStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryStatStore {
    data: Arc<Mutex<MemoryData>>,
}

#[derive(Clone, Default)]
struct MemoryData {
    users: Vec<UserStatsEntity>,
    items: Vec<ItemEntity>,
    inventories: HashMap<String, InventoryEntity>,
    counter: i64,
}

fn lock(data: &Mutex<MemoryData>) -> MutexGuard<'_, MemoryData> {
    data.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStatStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a stats record directly, bypassing the login path.
    pub fn seed_user(&self, user: UserStatsEntity) {
        lock(&self.data).users.push(user);
    }

    /// Insert a shop item directly, bypassing the admin path.
    pub fn seed_item(&self, item: ItemEntity) {
        lock(&self.data).items.push(item);
    }

    /// Snapshot a stats record by handle.
    pub fn user_snapshot(&self, uuid: Uuid) -> Option<UserStatsEntity> {
        lock(&self.data).users.iter().find(|u| u.uuid == uuid).cloned()
    }

    /// Snapshot a shop item by name.
    pub fn item_snapshot(&self, name: &str) -> Option<ItemEntity> {
        lock(&self.data).items.iter().find(|i| i.name == name).cloned()
    }

    /// Snapshot a user's inventory.
    pub fn inventory_snapshot(&self, user_id: &str) -> Option<InventoryEntity> {
        lock(&self.data).inventories.get(user_id).cloned()
    }
}

impl StatStore for MemoryStatStore {
    fn find_user_by_uuid(
        &self,
        uuid: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<UserStatsEntity>>> {
        let data = self.data.clone();
        Box::pin(async move { Ok(lock(&data).users.iter().find(|u| u.uuid == uuid).cloned()) })
    }

    fn find_user(
        &self,
        guild_id: String,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserStatsEntity>>> {
        let data = self.data.clone();
        Box::pin(async move {
            Ok(lock(&data)
                .users
                .iter()
                .find(|u| u.guild_id == guild_id && u.user_id == user_id)
                .cloned())
        })
    }

    fn create_user(&self, user: UserStatsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let data = self.data.clone();
        Box::pin(async move {
            lock(&data).users.push(user);
            Ok(())
        })
    }

    fn update_identity(
        &self,
        guild_id: String,
        user_id: String,
        username: String,
        avatar: Option<String>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let data = self.data.clone();
        Box::pin(async move {
            let mut guard = lock(&data);
            if let Some(user) = guard
                .users
                .iter_mut()
                .find(|u| u.guild_id == guild_id && u.user_id == user_id)
            {
                user.username = username;
                user.avatar = avatar;
            }
            Ok(())
        })
    }

    fn record_role_acquired(
        &self,
        guild_id: String,
        user_id: String,
        role_id: String,
        at_ms: i64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let data = self.data.clone();
        Box::pin(async move {
            let mut guard = lock(&data);
            if let Some(user) = guard
                .users
                .iter_mut()
                .find(|u| u.guild_id == guild_id && u.user_id == user_id)
            {
                // First-seen only; an existing timestamp stays as is.
                user.role_acquired_at.entry(role_id).or_insert(at_ms);
            }
            Ok(())
        })
    }

    fn leaderboard_page(
        &self,
        sort: LeaderboardSort,
        skip: u64,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<UserStatsEntity>>> {
        let data = self.data.clone();
        Box::pin(async move {
            let mut users = lock(&data).users.clone();
            users.sort_by_key(|u| {
                std::cmp::Reverse(match sort {
                    LeaderboardSort::TotalMessages => u.total_messages,
                    LeaderboardSort::VoiceTime => u.voice_time_ms,
                    LeaderboardSort::Stars => u.stars,
                })
            });
            Ok(users
                .into_iter()
                .skip(skip as usize)
                .take(limit.max(0) as usize)
                .collect())
        })
    }

    fn count_with_metric_above(
        &self,
        metric: RankMetric,
        value: i64,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let data = self.data.clone();
        Box::pin(async move {
            Ok(lock(&data)
                .users
                .iter()
                .filter(|u| metric.value_of(u) > value)
                .count() as u64)
        })
    }

    fn find_item(&self, name: String) -> BoxFuture<'static, StorageResult<Option<ItemEntity>>> {
        let data = self.data.clone();
        Box::pin(async move { Ok(lock(&data).items.iter().find(|i| i.name == name).cloned()) })
    }

    fn list_items(&self) -> BoxFuture<'static, StorageResult<Vec<ItemEntity>>> {
        let data = self.data.clone();
        Box::pin(async move { Ok(lock(&data).items.clone()) })
    }

    fn find_inventory(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<InventoryEntity>>> {
        let data = self.data.clone();
        Box::pin(async move { Ok(lock(&data).inventories.get(&user_id).cloned()) })
    }

    fn increment_counter(&self) -> BoxFuture<'static, StorageResult<i64>> {
        let data = self.data.clone();
        Box::pin(async move {
            let mut guard = lock(&data);
            guard.counter += 1;
            Ok(guard.counter)
        })
    }

    fn begin_purchase(&self) -> BoxFuture<'static, StorageResult<Box<dyn PurchaseScope>>> {
        let data = self.data.clone();
        Box::pin(async move {
            Ok(Box::new(MemoryPurchaseScope {
                data,
                ops: Vec::new(),
            }) as Box<dyn PurchaseScope>)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

enum PurchaseOp {
    DebitStars { uuid: Uuid, amount: i64 },
    DecrementStock { item_name: String, quantity: i64 },
    AddInventoryLine {
        user_id: String,
        item_name: String,
        quantity: i64,
    },
}

/// Staged purchase scope: operations are recorded as they arrive and applied
/// all-or-nothing at commit, after re-checking every guard under the lock.
struct MemoryPurchaseScope {
    data: Arc<Mutex<MemoryData>>,
    ops: Vec<PurchaseOp>,
}

fn apply(data: &mut MemoryData, op: &PurchaseOp) -> StorageResult<()> {
    match op {
        PurchaseOp::DebitStars { uuid, amount } => {
            let user = data
                .users
                .iter_mut()
                .find(|u| u.uuid == *uuid && u.stars >= *amount)
                .ok_or(StorageError::Precondition(PurchaseGuard::Funds))?;
            user.stars -= amount;
        }
        PurchaseOp::DecrementStock { item_name, quantity } => {
            let item = data
                .items
                .iter_mut()
                .find(|i| i.name == *item_name && i.stock >= *quantity)
                .ok_or(StorageError::Precondition(PurchaseGuard::Stock))?;
            item.stock -= quantity;
        }
        PurchaseOp::AddInventoryLine {
            user_id,
            item_name,
            quantity,
        } => {
            let inventory = data
                .inventories
                .entry(user_id.clone())
                .or_insert_with(|| InventoryEntity {
                    user_id: user_id.clone(),
                    items: Vec::new(),
                });
            match inventory.items.iter_mut().find(|l| l.item_name == *item_name) {
                Some(line) => line.quantity += quantity,
                None => inventory.items.push(InventoryLineEntity {
                    item_name: item_name.clone(),
                    quantity: *quantity,
                }),
            }
        }
    }
    Ok(())
}

impl PurchaseScope for MemoryPurchaseScope {
    fn debit_stars(&mut self, uuid: Uuid, amount: i64) -> BoxFuture<'_, StorageResult<()>> {
        self.ops.push(PurchaseOp::DebitStars { uuid, amount });
        Box::pin(async { Ok(()) })
    }

    fn decrement_stock(
        &mut self,
        item_name: String,
        quantity: i64,
    ) -> BoxFuture<'_, StorageResult<()>> {
        self.ops.push(PurchaseOp::DecrementStock { item_name, quantity });
        Box::pin(async { Ok(()) })
    }

    fn add_inventory_line(
        &mut self,
        user_id: String,
        item_name: String,
        quantity: i64,
    ) -> BoxFuture<'_, StorageResult<()>> {
        self.ops.push(PurchaseOp::AddInventoryLine {
            user_id,
            item_name,
            quantity,
        });
        Box::pin(async { Ok(()) })
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move {
            let mut guard = lock(&self.data);
            // Stage on a copy; the live data is replaced only when every
            // operation, guards included, went through.
            let mut staged = guard.clone();
            for op in &self.ops {
                apply(&mut staged, op)?;
            }
            *guard = staged;
            Ok(())
        })
    }

    fn abort(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::UNLIMITED_STOCK;

    fn user_with_stars(stars: i64) -> UserStatsEntity {
        let mut user = UserStatsEntity::new(
            "guild".into(),
            "user-1".into(),
            "tester".into(),
            None,
            0,
        );
        user.stars = stars;
        user
    }

    #[tokio::test]
    async fn commit_applies_all_mutations() {
        let store = MemoryStatStore::new();
        let user = user_with_stars(100);
        let uuid = user.uuid;
        store.seed_user(user);
        store.seed_item(ItemEntity {
            name: "badge".into(),
            price: 10,
            stock: 3,
        });

        let mut scope = store.begin_purchase().await.unwrap();
        scope.debit_stars(uuid, 20).await.unwrap();
        scope.decrement_stock("badge".into(), 2).await.unwrap();
        scope
            .add_inventory_line("user-1".into(), "badge".into(), 2)
            .await
            .unwrap();
        scope.commit().await.unwrap();

        assert_eq!(store.user_snapshot(uuid).unwrap().stars, 80);
        assert_eq!(store.item_snapshot("badge").unwrap().stock, 1);
        let inventory = store.inventory_snapshot("user-1").unwrap();
        assert_eq!(inventory.items.len(), 1);
        assert_eq!(inventory.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn failed_guard_rolls_everything_back() {
        let store = MemoryStatStore::new();
        let user = user_with_stars(100);
        let uuid = user.uuid;
        store.seed_user(user);
        store.seed_item(ItemEntity {
            name: "badge".into(),
            price: 10,
            stock: 1,
        });

        let mut scope = store.begin_purchase().await.unwrap();
        scope.debit_stars(uuid, 20).await.unwrap();
        // Requests more than the remaining stock, so commit must fail.
        scope.decrement_stock("badge".into(), 5).await.unwrap();
        let err = scope.commit().await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Precondition(PurchaseGuard::Stock)
        ));

        // The debit staged before the failing guard must not be visible.
        assert_eq!(store.user_snapshot(uuid).unwrap().stars, 100);
        assert_eq!(store.item_snapshot("badge").unwrap().stock, 1);
        assert!(store.inventory_snapshot("user-1").is_none());
    }

    #[tokio::test]
    async fn abort_discards_staged_ops() {
        let store = MemoryStatStore::new();
        let user = user_with_stars(50);
        let uuid = user.uuid;
        store.seed_user(user);

        let mut scope = store.begin_purchase().await.unwrap();
        scope.debit_stars(uuid, 10).await.unwrap();
        scope.abort().await.unwrap();

        assert_eq!(store.user_snapshot(uuid).unwrap().stars, 50);
    }

    #[tokio::test]
    async fn inventory_line_increments_existing_entry() {
        let store = MemoryStatStore::new();
        let user = user_with_stars(1000);
        let uuid = user.uuid;
        store.seed_user(user);
        store.seed_item(ItemEntity {
            name: "badge".into(),
            price: 1,
            stock: UNLIMITED_STOCK,
        });

        for _ in 0..2 {
            let mut scope = store.begin_purchase().await.unwrap();
            scope.debit_stars(uuid, 1).await.unwrap();
            scope
                .add_inventory_line("user-1".into(), "badge".into(), 3)
                .await
                .unwrap();
            scope.commit().await.unwrap();
        }

        let inventory = store.inventory_snapshot("user-1").unwrap();
        assert_eq!(inventory.items.len(), 1);
        assert_eq!(inventory.items[0].quantity, 6);
    }

    #[tokio::test]
    async fn role_acquisition_is_first_seen_only() {
        let store = MemoryStatStore::new();
        let user = user_with_stars(0);
        store.seed_user(user);

        store
            .record_role_acquired("guild".into(), "user-1".into(), "role-a".into(), 111)
            .await
            .unwrap();
        store
            .record_role_acquired("guild".into(), "user-1".into(), "role-a".into(), 999)
            .await
            .unwrap();

        let user = store
            .find_user("guild".into(), "user-1".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role_acquired_at.get("role-a"), Some(&111));
    }
}
