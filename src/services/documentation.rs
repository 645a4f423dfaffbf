use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Starboard Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::landing::visit,
        crate::routes::leaderboard::leaderboard,
        crate::routes::profile::profile,
        crate::routes::profile::messages_by_date,
        crate::routes::achievements::catalog,
        crate::routes::achievements::progress,
        crate::routes::shop::shop_catalog,
        crate::routes::purchase::buy,
        crate::routes::auth::discord_login,
        crate::routes::auth::discord_callback,
        crate::routes::auth::logout,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::common::VisitResponse,
            crate::dto::leaderboard::LeaderboardSortParam,
            crate::dto::leaderboard::LeaderboardEntry,
            crate::dto::leaderboard::LeaderboardResponse,
            crate::dto::profile::ProfileResponse,
            crate::dto::profile::ProfileStats,
            crate::dto::profile::RankSet,
            crate::dto::achievements::AchievementDefinitionDto,
            crate::dto::achievements::AchievementProgress,
            crate::dto::shop::ShopItemDto,
            crate::dto::shop::BuyRequest,
            crate::dto::shop::PurchaseResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "landing", description = "Landing-page counter"),
        (name = "leaderboard", description = "Guild leaderboards"),
        (name = "profile", description = "Public member profiles"),
        (name = "achievements", description = "Achievement catalog and progress"),
        (name = "shop", description = "Shop catalog and purchases"),
        (name = "auth", description = "Discord OAuth login"),
    )
)]
pub struct ApiDoc;
