//! MongoDB collections and queries backing the [`StatStore`] trait.

use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{Bson, Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    scope::MongoPurchaseScope,
};
use crate::dao::{
    models::{InventoryEntity, ItemEntity, LeaderboardSort, RankMetric, UserStatsEntity},
    stat_store::{PurchaseScope, StatStore},
    storage::StorageResult,
};

pub(super) const USER_COLLECTION: &str = "user_stats";
pub(super) const ITEM_COLLECTION: &str = "shop_items";
pub(super) const INVENTORY_COLLECTION: &str = "inventories";
const COUNTER_COLLECTION: &str = "counters";
const LANDING_COUNTER_ID: &str = "landing_page";

/// MongoDB-backed stat store.
#[derive(Clone)]
pub struct MongoStatStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

/// Single-document global counter.
#[derive(Debug, Serialize, Deserialize)]
struct CounterDocument {
    #[serde(rename = "_id")]
    id: String,
    value: i64,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoStatStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    ///
    /// The purchase transaction requires the deployment to be a replica set
    /// (standalone servers reject multi-document transactions).
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let unique = |name: &str| {
            IndexOptions::builder()
                .name(Some(name.to_owned()))
                .unique(Some(true))
                .build()
        };

        let users = database.collection::<Document>(USER_COLLECTION);
        for (keys, index_name, index_desc) in [
            (doc! {"uuid": 1}, "user_uuid_idx", "uuid"),
            (
                doc! {"guild_id": 1, "user_id": 1},
                "user_guild_member_idx",
                "guild_id,user_id",
            ),
        ] {
            users
                .create_index(
                    mongodb::IndexModel::builder()
                        .keys(keys)
                        .options(unique(index_name))
                        .build(),
                )
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: USER_COLLECTION,
                    index: index_desc,
                    source,
                })?;
        }

        let items = database.collection::<Document>(ITEM_COLLECTION);
        items
            .create_index(
                mongodb::IndexModel::builder()
                    .keys(doc! {"name": 1})
                    .options(unique("item_name_idx"))
                    .build(),
            )
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ITEM_COLLECTION,
                index: "name",
                source,
            })?;

        let inventories = database.collection::<Document>(INVENTORY_COLLECTION);
        inventories
            .create_index(
                mongodb::IndexModel::builder()
                    .keys(doc! {"user_id": 1})
                    .options(unique("inventory_owner_idx"))
                    .build(),
            )
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: INVENTORY_COLLECTION,
                index: "user_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn client(&self) -> Client {
        let guard = self.inner.state.read().await;
        guard.client.clone()
    }

    async fn users(&self) -> Collection<UserStatsEntity> {
        self.database().await.collection(USER_COLLECTION)
    }

    async fn items(&self) -> Collection<ItemEntity> {
        self.database().await.collection(ITEM_COLLECTION)
    }

    async fn inventories(&self) -> Collection<InventoryEntity> {
        self.database().await.collection(INVENTORY_COLLECTION)
    }

    async fn counters(&self) -> Collection<CounterDocument> {
        self.database().await.collection(COUNTER_COLLECTION)
    }

    async fn find_user_by_uuid(&self, uuid: Uuid) -> MongoResult<Option<UserStatsEntity>> {
        self.users()
            .await
            .find_one(doc! {"uuid": uuid.to_string()})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: USER_COLLECTION,
                source,
            })
    }

    async fn find_user(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> MongoResult<Option<UserStatsEntity>> {
        self.users()
            .await
            .find_one(doc! {"guild_id": guild_id, "user_id": user_id})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: USER_COLLECTION,
                source,
            })
    }

    async fn create_user(&self, user: UserStatsEntity) -> MongoResult<()> {
        self.users()
            .await
            .insert_one(&user)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: USER_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn update_identity(
        &self,
        guild_id: &str,
        user_id: &str,
        username: String,
        avatar: Option<String>,
    ) -> MongoResult<()> {
        let avatar = avatar.map(Bson::String).unwrap_or(Bson::Null);
        self.users()
            .await
            .update_one(
                doc! {"guild_id": guild_id, "user_id": user_id},
                doc! {"$set": {"username": username, "avatar": avatar}},
            )
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: USER_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn record_role_acquired(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
        at_ms: i64,
    ) -> MongoResult<()> {
        let field = format!("role_acquired_at.{role_id}");

        // The filter requires the timestamp field to be absent, so a role seen
        // before keeps its original acquisition time.
        let mut filter = doc! {"guild_id": guild_id, "user_id": user_id};
        filter.insert(field.clone(), doc! {"$exists": false});
        let mut set = Document::new();
        set.insert(field, at_ms);

        self.users()
            .await
            .update_one(filter, doc! {"$set": set})
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: USER_COLLECTION,
                source,
            })?;
        Ok(())
    }

    async fn leaderboard_page(
        &self,
        sort: LeaderboardSort,
        skip: u64,
        limit: i64,
    ) -> MongoResult<Vec<UserStatsEntity>> {
        self.users()
            .await
            .find(doc! {})
            .sort(doc! {sort.field_name(): -1, "_id": 1})
            .skip(skip)
            .limit(limit)
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: USER_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: USER_COLLECTION,
                source,
            })
    }

    async fn count_with_metric_above(&self, metric: RankMetric, value: i64) -> MongoResult<u64> {
        self.users()
            .await
            .count_documents(doc! {metric.field_name(): {"$gt": value}})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: USER_COLLECTION,
                source,
            })
    }

    async fn find_item(&self, name: &str) -> MongoResult<Option<ItemEntity>> {
        self.items()
            .await
            .find_one(doc! {"name": name})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: ITEM_COLLECTION,
                source,
            })
    }

    async fn list_items(&self) -> MongoResult<Vec<ItemEntity>> {
        self.items()
            .await
            .find(doc! {})
            .sort(doc! {"name": 1})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: ITEM_COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: ITEM_COLLECTION,
                source,
            })
    }

    async fn find_inventory(&self, user_id: &str) -> MongoResult<Option<InventoryEntity>> {
        self.inventories()
            .await
            .find_one(doc! {"user_id": user_id})
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: INVENTORY_COLLECTION,
                source,
            })
    }

    async fn increment_counter(&self) -> MongoResult<i64> {
        let updated = self
            .counters()
            .await
            .find_one_and_update(
                doc! {"_id": LANDING_COUNTER_ID},
                doc! {"$inc": {"value": 1}},
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: COUNTER_COLLECTION,
                source,
            })?;

        Ok(updated.map(|counter| counter.value).unwrap_or(0))
    }

    async fn begin_purchase(&self) -> MongoResult<MongoPurchaseScope> {
        let client = self.client().await;
        let database = self.database().await;

        let mut session = client
            .start_session()
            .await
            .map_err(|source| MongoDaoError::Transaction { source })?;
        session
            .start_transaction()
            .await
            .map_err(|source| MongoDaoError::Transaction { source })?;

        Ok(MongoPurchaseScope::new(session, database))
    }
}

impl StatStore for MongoStatStore {
    fn find_user_by_uuid(
        &self,
        uuid: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<UserStatsEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_user_by_uuid(uuid).await.map_err(Into::into) })
    }

    fn find_user(
        &self,
        guild_id: String,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserStatsEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_user(&guild_id, &user_id)
                .await
                .map_err(Into::into)
        })
    }

    fn create_user(&self, user: UserStatsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.create_user(user).await.map_err(Into::into) })
    }

    fn update_identity(
        &self,
        guild_id: String,
        user_id: String,
        username: String,
        avatar: Option<String>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_identity(&guild_id, &user_id, username, avatar)
                .await
                .map_err(Into::into)
        })
    }

    fn record_role_acquired(
        &self,
        guild_id: String,
        user_id: String,
        role_id: String,
        at_ms: i64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .record_role_acquired(&guild_id, &user_id, &role_id, at_ms)
                .await
                .map_err(Into::into)
        })
    }

    fn leaderboard_page(
        &self,
        sort: LeaderboardSort,
        skip: u64,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<UserStatsEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .leaderboard_page(sort, skip, limit)
                .await
                .map_err(Into::into)
        })
    }

    fn count_with_metric_above(
        &self,
        metric: RankMetric,
        value: i64,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .count_with_metric_above(metric, value)
                .await
                .map_err(Into::into)
        })
    }

    fn find_item(&self, name: String) -> BoxFuture<'static, StorageResult<Option<ItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_item(&name).await.map_err(Into::into) })
    }

    fn list_items(&self) -> BoxFuture<'static, StorageResult<Vec<ItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_items().await.map_err(Into::into) })
    }

    fn find_inventory(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<InventoryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_inventory(&user_id).await.map_err(Into::into) })
    }

    fn increment_counter(&self) -> BoxFuture<'static, StorageResult<i64>> {
        let store = self.clone();
        Box::pin(async move { store.increment_counter().await.map_err(Into::into) })
    }

    fn begin_purchase(&self) -> BoxFuture<'static, StorageResult<Box<dyn PurchaseScope>>> {
        let store = self.clone();
        Box::pin(async move {
            let scope = store.begin_purchase().await?;
            Ok(Box::new(scope) as Box<dyn PurchaseScope>)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
