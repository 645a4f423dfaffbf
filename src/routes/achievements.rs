use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::achievements::{AchievementDefinitionDto, AchievementProgress},
    error::AppError,
    services::achievement_service,
    state::SharedState,
};

/// Configure the achievements routes subtree.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/achievements", get(catalog))
        .route("/achievements/{id}", get(progress))
}

/// The static achievement catalog.
#[utoipa::path(
    get,
    path = "/achievements",
    tag = "achievements",
    responses(
        (status = 200, description = "Achievement catalog", body = [AchievementDefinitionDto])
    )
)]
pub async fn catalog(State(_state): State<SharedState>) -> Json<Vec<AchievementDefinitionDto>> {
    Json(achievement_service::catalog())
}

/// Per-user progress against the catalog.
#[utoipa::path(
    get,
    path = "/achievements/{id}",
    tag = "achievements",
    params(("id" = Uuid, Path, description = "Public profile handle")),
    responses(
        (status = 200, description = "Achievement progress", body = [AchievementProgress]),
        (status = 404, description = "Unknown handle")
    )
)]
pub async fn progress(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AchievementProgress>>, AppError> {
    let progress = achievement_service::progress_for(&state, id).await?;
    Ok(Json(progress))
}
