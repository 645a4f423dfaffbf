//! Shop catalog reads.

use crate::{dto::shop::ShopItemDto, error::ServiceError, state::SharedState};

/// The full shop catalog, straight from storage.
pub async fn catalog(state: &SharedState) -> Result<Vec<ShopItemDto>, ServiceError> {
    let store = state.require_stat_store().await?;
    let items = store.list_items().await?;
    Ok(items.into_iter().map(ShopItemDto::from).collect())
}
