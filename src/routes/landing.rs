use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::common::VisitResponse, error::AppError, services::counter_service, state::SharedState,
};

/// Configure the landing route subtree.
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(visit))
}

/// Record a landing-page visit and return the updated global counter.
#[utoipa::path(
    get,
    path = "/",
    tag = "landing",
    responses((status = 200, description = "Visit recorded", body = VisitResponse))
)]
pub async fn visit(State(state): State<SharedState>) -> Result<Json<VisitResponse>, AppError> {
    let response = counter_service::visit(&state).await?;
    Ok(Json(response))
}
