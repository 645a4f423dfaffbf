//! HTTP route trees, one module per resource.

use axum::Router;

use crate::state::SharedState;

/// Achievement catalog and progress routes.
pub mod achievements;
/// Discord OAuth routes.
pub mod auth;
/// Swagger UI routes.
pub mod docs;
/// Health routes.
pub mod health;
/// Landing-page counter route.
pub mod landing;
/// Leaderboard routes.
pub mod leaderboard;
/// Profile routes.
pub mod profile;
/// Purchase route.
pub mod purchase;
/// Shop catalog route.
pub mod shop;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(landing::router())
        .merge(leaderboard::router())
        .merge(profile::router())
        .merge(achievements::router())
        .merge(shop::router())
        .merge(purchase::router())
        .merge(auth::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
