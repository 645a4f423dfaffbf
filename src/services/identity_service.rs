//! Discord OAuth login flow and role bookkeeping.
//!
//! A completed login maps the Discord identity onto its stats record, creating
//! the record on first login, and records first-seen acquisition timestamps
//! for the configured tracked roles.

use time::OffsetDateTime;
use tracing::info;

use crate::{dao::models::UserStatsEntity, error::ServiceError, state::SharedState};

/// Start the OAuth handshake: issue a state token and build the authorize URL.
pub fn begin_login(state: &SharedState) -> String {
    let oauth_state = state.issue_oauth_state();
    state.discord().authorize_url(&oauth_state)
}

/// Complete the OAuth handshake and return the session token to set.
pub async fn complete_login(
    state: &SharedState,
    code: String,
    oauth_state: &str,
) -> Result<String, ServiceError> {
    if !state.take_oauth_state(oauth_state) {
        return Err(ServiceError::Unauthorized(
            "unknown or expired OAuth state".into(),
        ));
    }

    let discord = state.discord();
    let token = discord.exchange_code(code).await?;
    let identity = discord.current_user(token.access_token).await?;

    let store = state.require_stat_store().await?;
    let guild_id = state.config().guild_id.clone();
    let now_ms = epoch_millis();

    let user = match store
        .find_user(guild_id.clone(), identity.id.clone())
        .await?
    {
        Some(existing) => {
            store
                .update_identity(
                    guild_id.clone(),
                    identity.id.clone(),
                    identity.username.clone(),
                    identity.avatar.clone(),
                )
                .await?;
            existing
        }
        None => {
            let fresh = UserStatsEntity::new(
                guild_id.clone(),
                identity.id.clone(),
                identity.username.clone(),
                identity.avatar.clone(),
                now_ms,
            );
            store.create_user(fresh.clone()).await?;
            info!(user = %identity.id, "created stats record on first login");
            fresh
        }
    };

    let roles = member_roles_cached(state, &identity.id).await?;
    for role_id in &state.config().tracked_role_ids {
        if roles.contains(role_id) {
            store
                .record_role_acquired(
                    guild_id.clone(),
                    identity.id.clone(),
                    role_id.clone(),
                    now_ms,
                )
                .await?;
        }
    }

    Ok(state.sessions().create(identity.id, user.uuid))
}

/// Drop the session behind `token`, if any.
pub fn logout(state: &SharedState, token: &str) {
    state.sessions().remove(token);
}

/// Role ids the user holds in the configured guild, cached for the role TTL.
///
/// The purchase path deliberately skips this cache and asks Discord directly.
pub async fn member_roles_cached(
    state: &SharedState,
    user_id: &str,
) -> Result<Vec<String>, ServiceError> {
    let discord = state.discord();
    let owned_id = user_id.to_owned();
    let (roles, _) = state
        .member_roles_cache()
        .get_or_load(owned_id.clone(), || async move {
            let roles = discord.member_roles(owned_id).await?;
            Ok::<_, ServiceError>(roles)
        })
        .await?;
    Ok(roles)
}

fn epoch_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use futures::{FutureExt, future::BoxFuture};

    use super::*;
    use crate::{
        clients::discord::{AccessToken, DiscordApi, DiscordError, DiscordUser},
        config::AppConfig,
        dao::stat_store::{StatStore, memory::MemoryStatStore},
    };
    use crate::state::AppState;

    struct FakeDiscord {
        roles: Vec<String>,
        role_calls: AtomicUsize,
    }

    impl FakeDiscord {
        fn new(roles: Vec<String>) -> Self {
            Self {
                roles,
                role_calls: AtomicUsize::new(0),
            }
        }
    }

    impl DiscordApi for FakeDiscord {
        fn authorize_url(&self, state: &str) -> String {
            format!("https://example.test/authorize?state={state}")
        }

        fn exchange_code(
            &self,
            _code: String,
        ) -> BoxFuture<'static, Result<AccessToken, DiscordError>> {
            async {
                Ok(AccessToken {
                    access_token: "token".into(),
                })
            }
            .boxed()
        }

        fn current_user(
            &self,
            _access_token: String,
        ) -> BoxFuture<'static, Result<DiscordUser, DiscordError>> {
            async {
                Ok(DiscordUser {
                    id: "user-1".into(),
                    username: "tester".into(),
                    avatar: Some("abc".into()),
                })
            }
            .boxed()
        }

        fn member_roles(
            &self,
            _user_id: String,
        ) -> BoxFuture<'static, Result<Vec<String>, DiscordError>> {
            self.role_calls.fetch_add(1, Ordering::SeqCst);
            let roles = self.roles.clone();
            async move { Ok(roles) }.boxed()
        }
    }

    async fn login_state(roles: Vec<String>, tracked: Vec<String>) -> (SharedState, MemoryStatStore, Arc<FakeDiscord>) {
        let mut config = AppConfig::default();
        config.guild_id = "guild".into();
        config.tracked_role_ids = tracked;
        let discord = Arc::new(FakeDiscord::new(roles));
        let memory = MemoryStatStore::new();
        let state = AppState::new(config, discord.clone());
        state
            .set_stat_store(Arc::new(memory.clone()) as Arc<dyn StatStore>)
            .await;
        (state, memory, discord)
    }

    #[tokio::test]
    async fn first_login_creates_the_stats_record() {
        let (state, memory, _) = login_state(Vec::new(), Vec::new()).await;
        let oauth_state = state.issue_oauth_state();

        let token = complete_login(&state, "code".into(), &oauth_state)
            .await
            .unwrap();

        let user = memory
            .find_user("guild".into(), "user-1".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "tester");

        let session = state.sessions().get(&token).unwrap();
        assert_eq!(session.user_id, "user-1");
        assert_eq!(session.uuid, user.uuid);
    }

    #[tokio::test]
    async fn repeat_login_refreshes_identity_and_keeps_the_handle() {
        let (state, memory, _) = login_state(Vec::new(), Vec::new()).await;
        let mut existing =
            UserStatsEntity::new("guild".into(), "user-1".into(), "old-name".into(), None, 0);
        existing.stars = 42;
        let uuid = existing.uuid;
        memory.seed_user(existing);

        let oauth_state = state.issue_oauth_state();
        complete_login(&state, "code".into(), &oauth_state)
            .await
            .unwrap();

        let user = memory.user_snapshot(uuid).unwrap();
        assert_eq!(user.username, "tester");
        assert_eq!(user.avatar.as_deref(), Some("abc"));
        assert_eq!(user.stars, 42);
    }

    #[tokio::test]
    async fn tracked_roles_get_a_first_seen_timestamp() {
        let (state, memory, _) =
            login_state(vec!["role-a".into(), "role-b".into()], vec!["role-a".into()]).await;
        let oauth_state = state.issue_oauth_state();

        complete_login(&state, "code".into(), &oauth_state)
            .await
            .unwrap();

        let user = memory
            .find_user("guild".into(), "user-1".into())
            .await
            .unwrap()
            .unwrap();
        assert!(user.role_acquired_at.contains_key("role-a"));
        // role-b is not tracked.
        assert!(!user.role_acquired_at.contains_key("role-b"));
    }

    #[tokio::test]
    async fn replayed_oauth_state_is_rejected() {
        let (state, _, _) = login_state(Vec::new(), Vec::new()).await;
        let oauth_state = state.issue_oauth_state();

        complete_login(&state, "code".into(), &oauth_state)
            .await
            .unwrap();
        let err = complete_login(&state, "code".into(), &oauth_state)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn member_roles_are_served_from_cache() {
        let (state, _, discord) = login_state(vec!["role-a".into()], Vec::new()).await;

        member_roles_cached(&state, "user-1").await.unwrap();
        member_roles_cached(&state, "user-1").await.unwrap();

        assert_eq!(discord.role_calls.load(Ordering::SeqCst), 1);
    }
}
