//! Cached leaderboard pages.

use crate::{
    dto::leaderboard::{LeaderboardEntry, LeaderboardQuery, LeaderboardResponse},
    error::ServiceError,
    state::SharedState,
};

/// Page size used when the client does not send one.
const DEFAULT_LIMIT: i64 = 10;
/// Largest page size the server will produce.
const MAX_LIMIT: i64 = 100;

/// Normalize pagination: pages are 1-based and the limit is clamped to
/// `1..=MAX_LIMIT` instead of being rejected.
fn normalize(query: &LeaderboardQuery) -> (u64, i64) {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    (page, limit)
}

/// Rows to skip for a page; saturates so an absurd page number yields an
/// empty page instead of overflowing.
fn skip_for(page: u64, limit: i64) -> u64 {
    page.saturating_sub(1).saturating_mul(limit as u64)
}

/// One page of the leaderboard, served from the TTL cache when possible.
pub async fn page(
    state: &SharedState,
    query: LeaderboardQuery,
) -> Result<LeaderboardResponse, ServiceError> {
    let store = state.require_stat_store().await?;
    let (page, limit) = normalize(&query);
    let sort = query.sort_by;
    let cache_key = format!("{}:{page}:{limit}", sort.cache_key());

    let (data, remaining) = state
        .leaderboard_cache()
        .get_or_load(cache_key, || async move {
            let users = store
                .leaderboard_page(sort.into(), skip_for(page, limit), limit)
                .await?;
            Ok::<_, ServiceError>(users.into_iter().map(LeaderboardEntry::from).collect())
        })
        .await?;

    Ok(LeaderboardResponse {
        data,
        next_update_in: remaining.as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::leaderboard::LeaderboardSortParam;

    fn query(page: Option<u64>, limit: Option<i64>) -> LeaderboardQuery {
        LeaderboardQuery {
            sort_by: LeaderboardSortParam::TotalMessages,
            page,
            limit,
        }
    }

    #[test]
    fn pagination_defaults_apply() {
        assert_eq!(normalize(&query(None, None)), (1, DEFAULT_LIMIT));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(normalize(&query(Some(0), Some(0))), (1, 1));
        assert_eq!(normalize(&query(Some(3), Some(500))), (3, MAX_LIMIT));
        assert_eq!(normalize(&query(Some(2), Some(-5))), (2, 1));
    }

    #[test]
    fn skip_saturates_on_huge_page_numbers() {
        assert_eq!(skip_for(1, 10), 0);
        assert_eq!(skip_for(3, 10), 20);
        assert_eq!(skip_for(u64::MAX, MAX_LIMIT), u64::MAX);
    }
}
