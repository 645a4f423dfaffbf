use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::shop::{BuyRequest, PurchaseResponse},
    error::AppError,
    services::purchase_service,
    state::SharedState,
};

/// Configure the purchase route subtree.
pub fn router() -> Router<SharedState> {
    Router::new().route("/buy", post(buy))
}

/// Buy an item: debits stars, decrements stock, and grants inventory
/// atomically.
#[utoipa::path(
    post,
    path = "/buy",
    tag = "shop",
    request_body = BuyRequest,
    responses(
        (status = 200, description = "Purchase completed", body = PurchaseResponse),
        (status = 400, description = "Insufficient stars or stock"),
        (status = 404, description = "Unknown buyer or item"),
        (status = 429, description = "Discord rate limit hit"),
        (status = 502, description = "Discord unavailable")
    )
)]
pub async fn buy(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<BuyRequest>>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let response = purchase_service::buy(&state, request).await?;
    Ok(Json(response))
}
