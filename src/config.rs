//! Application-level configuration loading, including guild and shop settings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "STARBOARD_BACK_CONFIG_PATH";
/// Default TTL applied to the leaderboard/profile/achievement caches.
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
/// Default TTL applied to the guild member role cache.
const DEFAULT_MEMBER_ROLES_TTL_SECS: u64 = 600;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Discord guild whose members this backend tracks.
    pub guild_id: String,
    /// Role granting the flat 20% shop discount.
    pub discount_role_id: String,
    /// Roles whose first acquisition timestamp is recorded on login.
    pub tracked_role_ids: Vec<String>,
    /// OAuth redirect URI registered with the Discord application.
    pub redirect_uri: String,
    /// Frontend location the browser is sent back to after login/logout.
    pub frontend_url: String,
    /// Discord application credentials, read from the environment.
    pub credentials: DiscordCredentials,
    cache_ttl: Duration,
    member_roles_ttl: Duration,
}

#[derive(Debug, Clone)]
/// Secrets for the Discord application, never read from the config file.
pub struct DiscordCredentials {
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Bot token used for guild member lookups.
    pub bot_token: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    ///
    /// Credentials always come from `DISCORD_CLIENT_ID`, `DISCORD_CLIENT_SECRET`
    /// and `DISCORD_BOT_TOKEN`; a missing variable logs a warning and leaves the
    /// corresponding login/role feature inoperative.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let raw = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration");
                    raw
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    RawConfig::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                RawConfig::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                RawConfig::default()
            }
        };

        Self {
            guild_id: raw.guild_id,
            discount_role_id: raw.discount_role_id,
            tracked_role_ids: raw.tracked_role_ids,
            redirect_uri: raw.redirect_uri,
            frontend_url: raw.frontend_url,
            credentials: DiscordCredentials::from_env(),
            cache_ttl: Duration::from_secs(raw.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS)),
            member_roles_ttl: Duration::from_secs(
                raw.member_roles_ttl_secs
                    .unwrap_or(DEFAULT_MEMBER_ROLES_TTL_SECS),
            ),
        }
    }

    /// TTL applied to the leaderboard, profile, and achievement caches.
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// TTL applied to the guild member role cache.
    pub fn member_roles_ttl(&self) -> Duration {
        self.member_roles_ttl
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let raw = RawConfig::default();
        Self {
            guild_id: raw.guild_id,
            discount_role_id: raw.discount_role_id,
            tracked_role_ids: raw.tracked_role_ids,
            redirect_uri: raw.redirect_uri,
            frontend_url: raw.frontend_url,
            credentials: DiscordCredentials {
                client_id: String::new(),
                client_secret: String::new(),
                bot_token: String::new(),
            },
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            member_roles_ttl: Duration::from_secs(DEFAULT_MEMBER_ROLES_TTL_SECS),
        }
    }
}

impl DiscordCredentials {
    fn from_env() -> Self {
        Self {
            client_id: read_secret("DISCORD_CLIENT_ID"),
            client_secret: read_secret("DISCORD_CLIENT_SECRET"),
            bot_token: read_secret("DISCORD_BOT_TOKEN"),
        }
    }
}

fn read_secret(name: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            warn!(variable = name, "missing Discord credential");
            String::new()
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    guild_id: String,
    #[serde(default)]
    discount_role_id: String,
    #[serde(default)]
    tracked_role_ids: Vec<String>,
    #[serde(default = "default_redirect_uri")]
    redirect_uri: String,
    #[serde(default = "default_frontend_url")]
    frontend_url: String,
    cache_ttl_secs: Option<u64>,
    member_roles_ttl_secs: Option<u64>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            guild_id: String::new(),
            discount_role_id: String::new(),
            tracked_role_ids: Vec::new(),
            redirect_uri: default_redirect_uri(),
            frontend_url: default_frontend_url(),
            cache_ttl_secs: None,
            member_roles_ttl_secs: None,
        }
    }
}

fn default_redirect_uri() -> String {
    "http://localhost:8080/auth/callback".to_owned()
}

fn default_frontend_url() -> String {
    "http://localhost:8080/".to_owned()
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
