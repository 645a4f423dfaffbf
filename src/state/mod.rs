//! Central application state shared by every request handler.

/// Session registry for logged-in browsers.
pub mod session;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{
    cache::TtlCache,
    clients::discord::DiscordApi,
    config::AppConfig,
    dao::stat_store::StatStore,
    dto::{achievements::AchievementProgress, leaderboard::LeaderboardEntry, profile::ProfileResponse},
    error::ServiceError,
};

use self::session::{SessionRegistry, random_token};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// How long an issued OAuth state token stays valid.
const OAUTH_STATE_TTL: Duration = Duration::from_secs(600);

/// Central application state storing caches, sessions, and database handles.
pub struct AppState {
    config: AppConfig,
    discord: Arc<dyn DiscordApi>,
    stat_store: RwLock<Option<Arc<dyn StatStore>>>,
    degraded: watch::Sender<bool>,
    leaderboard_cache: TtlCache<String, Vec<LeaderboardEntry>>,
    profile_cache: TtlCache<Uuid, ProfileResponse>,
    achievement_cache: TtlCache<Uuid, Vec<AchievementProgress>>,
    member_roles_cache: TtlCache<String, Vec<String>>,
    sessions: SessionRegistry,
    oauth_states: DashMap<String, Instant>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, discord: Arc<dyn DiscordApi>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let cache_ttl = config.cache_ttl();
        let member_roles_ttl = config.member_roles_ttl();

        Arc::new(Self {
            config,
            discord,
            stat_store: RwLock::new(None),
            degraded: degraded_tx,
            leaderboard_cache: TtlCache::new(cache_ttl),
            profile_cache: TtlCache::new(cache_ttl),
            achievement_cache: TtlCache::new(cache_ttl),
            member_roles_cache: TtlCache::new(member_roles_ttl),
            sessions: SessionRegistry::new(),
            oauth_states: DashMap::new(),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the Discord API client.
    pub fn discord(&self) -> Arc<dyn DiscordApi> {
        self.discord.clone()
    }

    /// Obtain a handle to the current stat store, if one is installed.
    pub async fn stat_store(&self) -> Option<Arc<dyn StatStore>> {
        let guard = self.stat_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the stat store or fail with the degraded-mode error.
    pub async fn require_stat_store(&self) -> Result<Arc<dyn StatStore>, ServiceError> {
        self.stat_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn set_stat_store(&self, store: Arc<dyn StatStore>) {
        {
            let mut guard = self.stat_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        if *self.degraded.borrow() == value {
            return;
        }
        let _ = self.degraded.send(value);
    }

    /// Cache of leaderboard pages keyed by (sort, page, limit).
    pub fn leaderboard_cache(&self) -> &TtlCache<String, Vec<LeaderboardEntry>> {
        &self.leaderboard_cache
    }

    /// Cache of assembled profile responses keyed by handle.
    pub fn profile_cache(&self) -> &TtlCache<Uuid, ProfileResponse> {
        &self.profile_cache
    }

    /// Cache of per-user achievement progress keyed by handle.
    pub fn achievement_cache(&self) -> &TtlCache<Uuid, Vec<AchievementProgress>> {
        &self.achievement_cache
    }

    /// Cache of guild member role sets keyed by user id.
    ///
    /// Entries expire only by TTL or restart; a role change inside the window
    /// goes unnoticed on cached paths. The purchase path bypasses this cache.
    pub fn member_roles_cache(&self) -> &TtlCache<String, Vec<String>> {
        &self.member_roles_cache
    }

    /// Registry of active login sessions.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Issue an anti-forgery state token for the OAuth handshake.
    pub fn issue_oauth_state(&self) -> String {
        let token = random_token();
        self.oauth_states.insert(token.clone(), Instant::now());
        token
    }

    /// Consume an OAuth state token, returning whether it was valid and fresh.
    pub fn take_oauth_state(&self, token: &str) -> bool {
        match self.oauth_states.remove(token) {
            Some((_, issued_at)) => issued_at.elapsed() < OAUTH_STATE_TTL,
            None => false,
        }
    }
}
