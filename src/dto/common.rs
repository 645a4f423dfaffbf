//! Payloads shared across route trees.

use serde::Serialize;
use utoipa::ToSchema;

/// Landing-page counter value after the visit was recorded.
#[derive(Debug, Serialize, ToSchema)]
pub struct VisitResponse {
    /// Total number of recorded landing-page hits.
    pub visits: i64,
}
