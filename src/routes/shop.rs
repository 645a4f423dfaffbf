use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::shop::ShopItemDto, error::AppError, services::shop_service, state::SharedState,
};

/// Configure the shop routes subtree.
pub fn router() -> Router<SharedState> {
    Router::new().route("/shop", get(shop_catalog))
}

/// The full shop catalog, including sold-out items.
#[utoipa::path(
    get,
    path = "/shop",
    tag = "shop",
    responses((status = 200, description = "Shop catalog", body = [ShopItemDto]))
)]
pub async fn shop_catalog(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ShopItemDto>>, AppError> {
    let items = shop_service::catalog(&state).await?;
    Ok(Json(items))
}
