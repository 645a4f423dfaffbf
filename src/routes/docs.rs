use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Where the interactive API explorer is mounted.
const SWAGGER_PATH: &str = "/docs";
/// Where the raw OpenAPI document is served.
const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// Serve the Swagger UI for the Starboard API, backed by the generated
/// OpenAPI document.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::<SharedState>::from(SwaggerUi::new(SWAGGER_PATH).url(OPENAPI_PATH, ApiDoc::openapi()))
        .with_state(state)
}
