//! Global landing-page visit counter.

use crate::{dto::common::VisitResponse, error::ServiceError, state::SharedState};

/// Record one landing-page visit and return the updated total.
pub async fn visit(state: &SharedState) -> Result<VisitResponse, ServiceError> {
    let store = state.require_stat_store().await?;
    let visits = store.increment_counter().await?;
    Ok(VisitResponse { visits })
}
