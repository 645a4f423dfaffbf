//! Discord REST client: OAuth token exchange, profile fetch, member roles.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::config::AppConfig;

/// Discord REST API base.
const API_BASE: &str = "https://discord.com/api/v10";
/// Browser-facing OAuth consent page; unlike the REST API it is unversioned.
const AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";
/// Timeout for every outgoing Discord call; there are no retries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures talking to the Discord API.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// The HTTP client could not be constructed.
    #[error("failed to build Discord HTTP client")]
    ClientBuilder {
        /// Builder failure.
        #[source]
        source: reqwest::Error,
    },
    /// Transport-level failure.
    #[error("Discord request failed")]
    Http(#[from] reqwest::Error),
    /// Discord answered with a non-success status.
    #[error("Discord API error ({status}): {message}")]
    Api {
        /// HTTP status returned by Discord.
        status: u16,
        /// Error text extracted from the response body.
        message: String,
    },
    /// Discord answered 429.
    #[error("Discord rate limit hit, retry in {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait, rounded up from Discord's hint.
        retry_after_secs: u64,
    },
}

/// OAuth token response subset.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    /// Bearer token for user-scoped requests.
    pub access_token: String,
}

/// Discord user profile subset.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    /// Snowflake user identifier.
    pub id: String,
    /// Display name.
    pub username: String,
    /// Avatar hash, if the user has one.
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GuildMember {
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// Seam over the Discord REST API so services can be tested with a stub.
pub trait DiscordApi: Send + Sync {
    /// URL the browser is redirected to for the OAuth handshake.
    fn authorize_url(&self, state: &str) -> String;
    /// Exchange an authorization code for a user access token.
    fn exchange_code(&self, code: String) -> BoxFuture<'static, Result<AccessToken, DiscordError>>;
    /// Fetch the profile of the user owning `access_token`.
    fn current_user(
        &self,
        access_token: String,
    ) -> BoxFuture<'static, Result<DiscordUser, DiscordError>>;
    /// Fetch the role ids the user currently holds in the configured guild.
    fn member_roles(&self, user_id: String) -> BoxFuture<'static, Result<Vec<String>, DiscordError>>;
}

/// reqwest-backed [`DiscordApi`] implementation.
#[derive(Clone)]
pub struct DiscordHttpClient {
    client: Client,
    client_id: String,
    client_secret: String,
    bot_token: String,
    redirect_uri: String,
    guild_id: String,
}

impl DiscordHttpClient {
    /// Build the client from the application configuration.
    pub fn new(config: &AppConfig) -> Result<Self, DiscordError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| DiscordError::ClientBuilder { source })?;

        Ok(Self {
            client,
            client_id: config.credentials.client_id.clone(),
            client_secret: config.credentials.client_secret.clone(),
            bot_token: config.credentials.bot_token.clone(),
            redirect_uri: config.redirect_uri.clone(),
            guild_id: config.guild_id.clone(),
        })
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DiscordError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .json::<RateLimitBody>()
                .await
                .map(|body| body.retry_after.ceil() as u64)
                .unwrap_or(1);
            return Err(DiscordError::RateLimited { retry_after_secs });
        }

        let message = response.text().await.unwrap_or_default();
        Err(DiscordError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl DiscordApi for DiscordHttpClient {
    fn authorize_url(&self, state: &str) -> String {
        // The base is a compile-time constant, so parsing cannot fail.
        Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "identify"),
                ("state", state),
            ],
        )
        .expect("static authorize URL")
        .to_string()
    }

    fn exchange_code(&self, code: String) -> BoxFuture<'static, Result<AccessToken, DiscordError>> {
        let client = self.client.clone();
        let params = [
            ("client_id", self.client_id.clone()),
            ("client_secret", self.client_secret.clone()),
            ("grant_type", "authorization_code".to_owned()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.clone()),
        ];

        Box::pin(async move {
            let response = client
                .post(format!("{API_BASE}/oauth2/token"))
                .form(&params)
                .send()
                .await?;
            Self::handle_response(response).await
        })
    }

    fn current_user(
        &self,
        access_token: String,
    ) -> BoxFuture<'static, Result<DiscordUser, DiscordError>> {
        let client = self.client.clone();

        Box::pin(async move {
            let response = client
                .get(format!("{API_BASE}/users/@me"))
                .bearer_auth(access_token)
                .send()
                .await?;
            Self::handle_response(response).await
        })
    }

    fn member_roles(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, Result<Vec<String>, DiscordError>> {
        let client = self.client.clone();
        let url = format!("{API_BASE}/guilds/{}/members/{user_id}", self.guild_id);
        let bot_token = self.bot_token.clone();

        Box::pin(async move {
            let response = client
                .get(url)
                .header("Authorization", format!("Bot {bot_token}"))
                .send()
                .await?;
            let member: GuildMember = Self::handle_response(response).await?;
            Ok(member.roles)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_uses_the_consent_page() {
        let client = DiscordHttpClient::new(&AppConfig::default()).unwrap();
        let url = client.authorize_url("state-token");

        // The consent page lives outside the versioned REST base.
        assert!(url.starts_with("https://discord.com/oauth2/authorize?"));
        assert!(url.contains("state=state-token"));
        assert!(url.contains("response_type=code"));
    }
}
