//! Shop purchase transactor.
//!
//! A purchase debits stars, decrements stock, and grants inventory inside one
//! storage transaction. Either every step lands or none of them do.

use time::{OffsetDateTime, Weekday};
use tracing::{info, warn};

use crate::{
    dao::storage::{PurchaseGuard, StorageError},
    dto::shop::{BuyRequest, PurchaseResponse},
    error::ServiceError,
    state::SharedState,
};

/// Flat discount applied on Saturdays and Sundays.
const WEEKEND_DISCOUNT_PERCENT: u32 = 5;
/// Flat discount applied to holders of the configured discount role.
const ROLE_DISCOUNT_PERCENT: u32 = 20;

/// Total discount percentage for a purchase. Discounts stack additively.
pub fn discount_percent(weekday: Weekday, has_discount_role: bool) -> u32 {
    let mut percent = 0;
    if matches!(weekday, Weekday::Saturday | Weekday::Sunday) {
        percent += WEEKEND_DISCOUNT_PERCENT;
    }
    if has_discount_role {
        percent += ROLE_DISCOUNT_PERCENT;
    }
    percent
}

/// Apply a percentage discount to a unit price, rounding half up.
///
/// 12.5 rounds to 13 and 31.35 rounds to 31.
pub fn discounted_unit_price(price: i64, percent: u32) -> i64 {
    let discounted = price as f64 * (1.0 - f64::from(percent) / 100.0);
    (discounted + 0.5).floor() as i64
}

/// Execute a purchase end to end.
///
/// Role membership is fetched live from Discord so a freshly granted discount
/// role applies immediately. On success the buyer's cached profile and
/// achievement entries and the whole leaderboard cache are invalidated.
pub async fn buy(state: &SharedState, request: BuyRequest) -> Result<PurchaseResponse, ServiceError> {
    let store = state.require_stat_store().await?;

    let user = store
        .find_user_by_uuid(request.uuid)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("no profile for {}", request.uuid)))?;
    if user.user_id != request.user_id {
        return Err(ServiceError::InvalidInput(
            "user id does not match the profile".into(),
        ));
    }

    let item = store
        .find_item(request.item_name.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("no shop item `{}`", request.item_name)))?;

    let quantity = request.quantity;
    if !item.unlimited() && item.stock < quantity {
        return Err(ServiceError::InsufficientStock {
            item: item.name.clone(),
        });
    }

    let roles = state
        .discord()
        .member_roles(user.user_id.clone())
        .await?;
    let has_discount_role = roles.contains(&state.config().discount_role_id);

    let percent = discount_percent(OffsetDateTime::now_utc().weekday(), has_discount_role);
    let unit_price = discounted_unit_price(item.price, percent);
    // An overflowing total would wrap negative and turn the debit into a
    // credit, so reject it outright.
    let total_price = unit_price
        .checked_mul(quantity)
        .ok_or_else(|| ServiceError::InvalidInput("quantity too large".into()))?;

    if user.stars < total_price {
        return Err(ServiceError::InsufficientFunds {
            needed: total_price,
            balance: user.stars,
        });
    }

    let mut scope = store.begin_purchase().await?;
    let staged = async {
        scope.debit_stars(user.uuid, total_price).await?;
        if !item.unlimited() {
            scope.decrement_stock(item.name.clone(), quantity).await?;
        }
        scope
            .add_inventory_line(user.user_id.clone(), item.name.clone(), quantity)
            .await?;
        Ok::<(), StorageError>(())
    }
    .await;

    match staged {
        Ok(()) => scope.commit().await?,
        Err(err) => {
            if let Err(abort_err) = scope.abort().await {
                warn!(error = %abort_err, "failed to abort purchase transaction");
            }
            // Attach the numbers the generic conversion cannot know.
            return Err(match err {
                StorageError::Precondition(PurchaseGuard::Funds) => {
                    ServiceError::InsufficientFunds {
                        needed: total_price,
                        balance: user.stars,
                    }
                }
                StorageError::Precondition(PurchaseGuard::Stock) => {
                    ServiceError::InsufficientStock { item: item.name }
                }
                other => other.into(),
            });
        }
    }

    state.profile_cache().invalidate(&user.uuid).await;
    state.achievement_cache().invalidate(&user.uuid).await;
    state.leaderboard_cache().clear().await;

    info!(
        user = %user.user_id,
        item = %item.name,
        quantity,
        total_price,
        percent,
        "purchase completed"
    );

    Ok(PurchaseResponse {
        message: format!("bought {quantity} x {}", item.name),
        unit_price,
        total_price,
        discount_percent: percent,
        stars_remaining: user.stars - total_price,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::{FutureExt, future::BoxFuture};
    use uuid::Uuid;

    use super::*;
    use crate::{
        clients::discord::{AccessToken, DiscordApi, DiscordError, DiscordUser},
        config::AppConfig,
        dao::{
            models::{ItemEntity, UNLIMITED_STOCK, UserStatsEntity},
            stat_store::{StatStore, memory::MemoryStatStore},
        },
        state::{AppState, SharedState},
    };

    struct StubDiscord {
        roles: Vec<String>,
    }

    impl DiscordApi for StubDiscord {
        fn authorize_url(&self, _state: &str) -> String {
            String::new()
        }

        fn exchange_code(&self, _code: String) -> BoxFuture<'static, Result<AccessToken, DiscordError>> {
            async { Err(DiscordError::Api { status: 500, message: "stub".into() }) }.boxed()
        }

        fn current_user(
            &self,
            _access_token: String,
        ) -> BoxFuture<'static, Result<DiscordUser, DiscordError>> {
            async { Err(DiscordError::Api { status: 500, message: "stub".into() }) }.boxed()
        }

        fn member_roles(&self, _user_id: String) -> BoxFuture<'static, Result<Vec<String>, DiscordError>> {
            let roles = self.roles.clone();
            async move { Ok(roles) }.boxed()
        }
    }

    async fn state_with(
        memory: MemoryStatStore,
        roles: Vec<String>,
    ) -> SharedState {
        let mut config = AppConfig::default();
        config.discount_role_id = "discount-role".into();
        let state = AppState::new(config, Arc::new(StubDiscord { roles }));
        state.set_stat_store(Arc::new(memory.clone()) as Arc<dyn StatStore>).await;
        state
    }

    fn buyer(stars: i64) -> UserStatsEntity {
        let mut user =
            UserStatsEntity::new("guild".into(), "buyer".into(), "buyer".into(), None, 0);
        user.stars = stars;
        user
    }

    fn request(uuid: Uuid, item: &str, quantity: i64) -> BuyRequest {
        BuyRequest {
            uuid,
            user_id: "buyer".into(),
            item_name: item.into(),
            quantity,
        }
    }

    #[test]
    fn discounts_stack_additively() {
        assert_eq!(discount_percent(Weekday::Wednesday, false), 0);
        assert_eq!(discount_percent(Weekday::Saturday, false), 5);
        assert_eq!(discount_percent(Weekday::Tuesday, true), 20);
        assert_eq!(discount_percent(Weekday::Sunday, true), 25);
    }

    #[test]
    fn rounding_is_half_up() {
        // 100 * 0.75 = 75
        assert_eq!(discounted_unit_price(100, 25), 75);
        // 25 * 0.5 = 12.5 -> 13
        assert_eq!(discounted_unit_price(25, 50), 13);
        // 33 * 0.95 = 31.35 -> 31
        assert_eq!(discounted_unit_price(33, 5), 31);
        assert_eq!(discounted_unit_price(100, 0), 100);
    }

    #[tokio::test]
    async fn successful_purchase_moves_stars_stock_and_inventory() {
        let memory = MemoryStatStore::new();
        let user = buyer(500);
        let uuid = user.uuid;
        memory.seed_user(user);
        memory.seed_item(ItemEntity {
            name: "banner".into(),
            price: 100,
            stock: 3,
        });

        let state = state_with(memory.clone(), Vec::new()).await;
        let response = buy(&state, request(uuid, "banner", 2)).await.unwrap();

        let expected_unit =
            discounted_unit_price(100, discount_percent(OffsetDateTime::now_utc().weekday(), false));
        assert_eq!(response.unit_price, expected_unit);
        assert_eq!(response.total_price, expected_unit * 2);

        let user_after = memory.user_snapshot(uuid).unwrap();
        assert_eq!(user_after.stars, 500 - expected_unit * 2);
        assert_eq!(memory.item_snapshot("banner").unwrap().stock, 1);

        let inventory = memory.inventory_snapshot("buyer").unwrap();
        assert_eq!(inventory.items.len(), 1);
        assert_eq!(inventory.items[0].item_name, "banner");
        assert_eq!(inventory.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn unlimited_stock_is_never_decremented() {
        let memory = MemoryStatStore::new();
        let user = buyer(500);
        let uuid = user.uuid;
        memory.seed_user(user);
        memory.seed_item(ItemEntity {
            name: "color".into(),
            price: 10,
            stock: UNLIMITED_STOCK,
        });

        let state = state_with(memory.clone(), Vec::new()).await;
        buy(&state, request(uuid, "color", 4)).await.unwrap();

        assert_eq!(memory.item_snapshot("color").unwrap().stock, UNLIMITED_STOCK);
        assert_eq!(
            memory.inventory_snapshot("buyer").unwrap().items[0].quantity,
            4
        );
    }

    #[tokio::test]
    async fn out_of_stock_rejects_without_side_effects() {
        let memory = MemoryStatStore::new();
        let user = buyer(500);
        let uuid = user.uuid;
        memory.seed_user(user);
        memory.seed_item(ItemEntity {
            name: "badge".into(),
            price: 10,
            stock: 1,
        });

        let state = state_with(memory.clone(), Vec::new()).await;
        let err = buy(&state, request(uuid, "badge", 2)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientStock { .. }));

        assert_eq!(memory.user_snapshot(uuid).unwrap().stars, 500);
        assert_eq!(memory.item_snapshot("badge").unwrap().stock, 1);
        assert!(memory.inventory_snapshot("buyer").is_none());
    }

    #[tokio::test]
    async fn insufficient_funds_reports_both_numbers() {
        let memory = MemoryStatStore::new();
        let user = buyer(50);
        let uuid = user.uuid;
        memory.seed_user(user);
        memory.seed_item(ItemEntity {
            name: "crown".into(),
            price: 100,
            stock: UNLIMITED_STOCK,
        });

        let state = state_with(memory.clone(), Vec::new()).await;
        let err = buy(&state, request(uuid, "crown", 1)).await.unwrap_err();

        let expected_total =
            discounted_unit_price(100, discount_percent(OffsetDateTime::now_utc().weekday(), false));
        match err {
            ServiceError::InsufficientFunds { needed, balance } => {
                assert_eq!(needed, expected_total);
                assert_eq!(balance, 50);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(memory.user_snapshot(uuid).unwrap().stars, 50);
    }

    #[tokio::test]
    async fn oversized_quantity_is_rejected_without_side_effects() {
        let memory = MemoryStatStore::new();
        let user = buyer(500);
        let uuid = user.uuid;
        memory.seed_user(user);
        // Unlimited stock skips the stock pre-check, so only the total-price
        // computation stands between the request and the debit.
        memory.seed_item(ItemEntity {
            name: "color".into(),
            price: 10,
            stock: UNLIMITED_STOCK,
        });

        let state = state_with(memory.clone(), Vec::new()).await;
        let err = buy(&state, request(uuid, "color", i64::MAX / 2))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        assert_eq!(memory.user_snapshot(uuid).unwrap().stars, 500);
        assert!(memory.inventory_snapshot("buyer").is_none());
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let memory = MemoryStatStore::new();
        let user = buyer(500);
        let uuid = user.uuid;
        memory.seed_user(user);

        let state = state_with(memory, Vec::new()).await;
        let err = buy(&state, request(uuid, "ghost", 1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn mismatched_user_id_is_rejected() {
        let memory = MemoryStatStore::new();
        let user = buyer(500);
        let uuid = user.uuid;
        memory.seed_user(user);
        memory.seed_item(ItemEntity {
            name: "color".into(),
            price: 10,
            stock: UNLIMITED_STOCK,
        });

        let state = state_with(memory, Vec::new()).await;
        let mut req = request(uuid, "color", 1);
        req.user_id = "someone-else".into();
        let err = buy(&state, req).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn discount_role_lowers_the_price() {
        let memory = MemoryStatStore::new();
        let user = buyer(1000);
        let uuid = user.uuid;
        memory.seed_user(user);
        memory.seed_item(ItemEntity {
            name: "plaque".into(),
            price: 100,
            stock: UNLIMITED_STOCK,
        });

        let state = state_with(memory.clone(), vec!["discount-role".into()]).await;
        let response = buy(&state, request(uuid, "plaque", 1)).await.unwrap();

        let expected_percent =
            discount_percent(OffsetDateTime::now_utc().weekday(), true);
        assert_eq!(response.discount_percent, expected_percent);
        assert_eq!(
            response.unit_price,
            discounted_unit_price(100, expected_percent)
        );
    }
}
