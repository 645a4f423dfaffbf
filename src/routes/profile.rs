use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dto::profile::ProfileResponse, error::AppError, services::profile_service, state::SharedState,
};

/// Configure the profile routes subtree.
///
/// Both routes share the `{id}` segment name: the first takes the public
/// profile handle, the second the raw Discord user id.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/profile/{id}", get(profile))
        .route("/profile/{id}/messagesByDate", get(messages_by_date))
}

/// Full public profile for a handle.
#[utoipa::path(
    get,
    path = "/profile/{id}",
    tag = "profile",
    params(("id" = Uuid, Path, description = "Public profile handle")),
    responses(
        (status = 200, description = "Assembled profile", body = ProfileResponse),
        (status = 404, description = "Unknown handle")
    )
)]
pub async fn profile(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, AppError> {
    let response = profile_service::profile(&state, id).await?;
    Ok(Json(response))
}

/// Message counts per date for a guild member.
#[utoipa::path(
    get,
    path = "/profile/{id}/messagesByDate",
    tag = "profile",
    params(("id" = String, Path, description = "Discord user identifier")),
    responses(
        (status = 200, description = "Per-date message counts"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn messages_by_date(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<IndexMap<String, i64>>, AppError> {
    let counts = profile_service::messages_by_date(&state, &id).await?;
    Ok(Json(counts))
}
