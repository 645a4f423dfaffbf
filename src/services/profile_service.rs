//! Profile assembly and message history.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dto::profile::{ProfileResponse, ProfileStats},
    error::ServiceError,
    services::{achievement_service, identity_service, rank},
    state::SharedState,
};

/// Assemble the full public profile for a handle, served from the TTL cache.
///
/// Ranks, roles, and achievement progress are derived fresh on a cache miss;
/// a purchase invalidates the entry so balances never appear stale.
pub async fn profile(state: &SharedState, uuid: Uuid) -> Result<ProfileResponse, ServiceError> {
    let store = state.require_stat_store().await?;
    let state_for_loader = state.clone();

    let (response, _) = state
        .profile_cache()
        .get_or_load(uuid, || async move {
            let user = store
                .find_user_by_uuid(uuid)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("no profile for {uuid}")))?;

            let ranks = rank::ranks_for(&store, &user).await?;
            let roles =
                identity_service::member_roles_cached(&state_for_loader, &user.user_id).await?;
            let achievements = achievement_service::evaluate(&user);

            Ok::<_, ServiceError>(ProfileResponse {
                uuid: user.uuid,
                user_id: user.user_id.clone(),
                username: user.username.clone(),
                avatar: user.avatar.clone(),
                stats: ProfileStats::from(&user),
                ranks,
                roles,
                role_acquired_at: user.role_acquired_at.clone(),
                achievements,
            })
        })
        .await?;

    Ok(response)
}

/// Per-date message counts for a user of the configured guild.
pub async fn messages_by_date(
    state: &SharedState,
    user_id: &str,
) -> Result<IndexMap<String, i64>, ServiceError> {
    let store = state.require_stat_store().await?;
    let user = store
        .find_user(state.config().guild_id.clone(), user_id.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("no stats for user {user_id}")))?;
    Ok(user.messages_by_date)
}
