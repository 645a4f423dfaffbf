//! Purchase unit of work backed by a MongoDB multi-document transaction.

use futures::future::BoxFuture;
use mongodb::{ClientSession, Database, bson::doc};
use uuid::Uuid;

use super::store::{INVENTORY_COLLECTION, ITEM_COLLECTION, USER_COLLECTION};
use crate::dao::{
    models::{InventoryEntity, ItemEntity, UserStatsEntity},
    stat_store::PurchaseScope,
    storage::{PurchaseGuard, StorageError, StorageResult},
};

/// Scope holding the session for the duration of one purchase.
///
/// Every mutation runs inside the session's transaction; nothing becomes
/// visible to other readers until [`PurchaseScope::commit`]. Guarded updates
/// use conditional filters so a concurrent balance or stock change surfaces as
/// a [`StorageError::Precondition`] instead of driving a document negative.
pub(super) struct MongoPurchaseScope {
    session: ClientSession,
    database: Database,
}

impl MongoPurchaseScope {
    pub(super) fn new(session: ClientSession, database: Database) -> Self {
        Self { session, database }
    }
}

impl PurchaseScope for MongoPurchaseScope {
    fn debit_stars(&mut self, uuid: Uuid, amount: i64) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let users = self.database.collection::<UserStatsEntity>(USER_COLLECTION);
            let result = users
                .update_one(
                    doc! {"uuid": uuid.to_string(), "stars": {"$gte": amount}},
                    doc! {"$inc": {"stars": -amount}},
                )
                .session(&mut self.session)
                .await
                .map_err(|source| StorageError::unavailable("debit stars".into(), source))?;

            if result.matched_count == 0 {
                return Err(StorageError::Precondition(PurchaseGuard::Funds));
            }
            Ok(())
        })
    }

    fn decrement_stock(
        &mut self,
        item_name: String,
        quantity: i64,
    ) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let items = self.database.collection::<ItemEntity>(ITEM_COLLECTION);
            let result = items
                .update_one(
                    doc! {"name": &item_name, "stock": {"$gte": quantity}},
                    doc! {"$inc": {"stock": -quantity}},
                )
                .session(&mut self.session)
                .await
                .map_err(|source| StorageError::unavailable("decrement stock".into(), source))?;

            if result.matched_count == 0 {
                return Err(StorageError::Precondition(PurchaseGuard::Stock));
            }
            Ok(())
        })
    }

    fn add_inventory_line(
        &mut self,
        user_id: String,
        item_name: String,
        quantity: i64,
    ) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            let inventories = self
                .database
                .collection::<InventoryEntity>(INVENTORY_COLLECTION);

            // Increment an existing line first; only when the user has no line
            // for this item do we push a new one (creating the inventory
            // document itself on first purchase).
            let incremented = inventories
                .update_one(
                    doc! {"user_id": &user_id, "items.item_name": &item_name},
                    doc! {"$inc": {"items.$.quantity": quantity}},
                )
                .session(&mut self.session)
                .await
                .map_err(|source| {
                    StorageError::unavailable("increment inventory line".into(), source)
                })?;

            if incremented.matched_count == 0 {
                inventories
                    .update_one(
                        doc! {"user_id": &user_id},
                        doc! {"$push": {"items": {"item_name": &item_name, "quantity": quantity}}},
                    )
                    .upsert(true)
                    .session(&mut self.session)
                    .await
                    .map_err(|source| {
                        StorageError::unavailable("append inventory line".into(), source)
                    })?;
            }
            Ok(())
        })
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move {
            let mut this = *self;
            this.session
                .commit_transaction()
                .await
                .map_err(|source| StorageError::unavailable("commit purchase".into(), source))
        })
    }

    fn abort(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move {
            let mut this = *self;
            this.session
                .abort_transaction()
                .await
                .map_err(|source| StorageError::unavailable("abort purchase".into(), source))
        })
    }
}
