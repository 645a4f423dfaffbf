use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::Redirect,
    routing::get,
};

use crate::{
    dto::auth::CallbackQuery,
    error::AppError,
    services::identity_service,
    state::{SharedState, session::SESSION_COOKIE},
};

/// Configure the OAuth routes subtree.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/auth/discord", get(discord_login))
        .route("/auth/callback", get(discord_callback))
        .route("/logout", get(logout))
}

/// Start the OAuth handshake by redirecting the browser to Discord.
#[utoipa::path(
    get,
    path = "/auth/discord",
    tag = "auth",
    responses((status = 303, description = "Redirect to the Discord authorize page"))
)]
pub async fn discord_login(State(state): State<SharedState>) -> Redirect {
    Redirect::to(&identity_service::begin_login(&state))
}

/// Finish the OAuth handshake: exchange the code, map the identity onto its
/// stats record, and hand the browser a session cookie.
#[utoipa::path(
    get,
    path = "/auth/callback",
    tag = "auth",
    params(CallbackQuery),
    responses(
        (status = 303, description = "Login completed; redirect to the frontend"),
        (status = 401, description = "Unknown or expired OAuth state")
    )
)]
pub async fn discord_callback(
    State(state): State<SharedState>,
    Query(query): Query<CallbackQuery>,
) -> Result<(HeaderMap, Redirect), AppError> {
    let token = identity_service::complete_login(&state, query.code, &query.state).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie_value(&format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax"
        ))?,
    );

    Ok((headers, Redirect::to(&state.config().frontend_url)))
}

/// Drop the session and clear the cookie.
#[utoipa::path(
    get,
    path = "/logout",
    tag = "auth",
    responses((status = 303, description = "Session dropped; redirect to the frontend"))
)]
pub async fn logout(
    State(state): State<SharedState>,
    request_headers: HeaderMap,
) -> Result<(HeaderMap, Redirect), AppError> {
    if let Some(token) = cookie_value(&request_headers, SESSION_COOKIE) {
        identity_service::logout(&state, &token);
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie_value(&format!(
            "{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"
        ))?,
    );

    Ok((headers, Redirect::to(&state.config().frontend_url)))
}

fn session_cookie_value(cookie: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(cookie)
        .map_err(|_| AppError::Internal("session cookie contains invalid characters".into()))
}

/// Extract a cookie value from the request's `Cookie` header.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_finds_the_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("other=1; starboard_session=abc123; last=x"),
        );

        assert_eq!(
            cookie_value(&headers, SESSION_COOKIE).as_deref(),
            Some("abc123")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
