//! OAuth handshake payloads.

use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters Discord appends to the OAuth callback redirect.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    /// Authorization code to exchange for an access token.
    pub code: String,
    /// Anti-forgery state issued by `GET /auth/discord`.
    pub state: String,
}
