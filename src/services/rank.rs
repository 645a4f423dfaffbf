//! Leaderboard rank computation.

use std::sync::Arc;

use crate::{
    dao::{
        models::{RankMetric, UserStatsEntity},
        stat_store::StatStore,
    },
    dto::profile::RankSet,
    error::ServiceError,
};

/// Rank derived from the number of strictly greater values.
///
/// Ties collapse onto the same rank and the ranks they would have occupied are
/// skipped: values {10, 10, 5} rank as {1, 1, 3}.
fn rank_from(greater_count: u64) -> u64 {
    greater_count + 1
}

/// Compute the user's position in all four message leaderboards.
pub async fn ranks_for(
    store: &Arc<dyn StatStore>,
    user: &UserStatsEntity,
) -> Result<RankSet, ServiceError> {
    Ok(RankSet {
        total: rank_of(store, user, RankMetric::Total).await?,
        today: rank_of(store, user, RankMetric::Today).await?,
        week: rank_of(store, user, RankMetric::Week).await?,
        month: rank_of(store, user, RankMetric::Month).await?,
    })
}

async fn rank_of(
    store: &Arc<dyn StatStore>,
    user: &UserStatsEntity,
    metric: RankMetric,
) -> Result<u64, ServiceError> {
    let greater = store
        .count_with_metric_above(metric, metric.value_of(user))
        .await?;
    Ok(rank_from(greater))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::stat_store::memory::MemoryStatStore;

    fn user_with_totals(user_id: &str, total: i64) -> UserStatsEntity {
        let mut user = UserStatsEntity::new(
            "guild".into(),
            user_id.into(),
            user_id.into(),
            None,
            0,
        );
        user.total_messages = total;
        user
    }

    #[tokio::test]
    async fn ties_share_a_rank_and_skip_the_next() {
        let memory = MemoryStatStore::new();
        let users = [
            user_with_totals("a", 10),
            user_with_totals("b", 10),
            user_with_totals("c", 5),
        ];
        for user in &users {
            memory.seed_user(user.clone());
        }
        let store: Arc<dyn StatStore> = Arc::new(memory);

        let ranks_a = ranks_for(&store, &users[0]).await.unwrap();
        let ranks_b = ranks_for(&store, &users[1]).await.unwrap();
        let ranks_c = ranks_for(&store, &users[2]).await.unwrap();

        assert_eq!(ranks_a.total, 1);
        assert_eq!(ranks_b.total, 1);
        // No rank 2 is assigned; the next distinct value lands on 3.
        assert_eq!(ranks_c.total, 3);
    }

    #[tokio::test]
    async fn sole_user_ranks_first_everywhere() {
        let memory = MemoryStatStore::new();
        let user = user_with_totals("a", 0);
        memory.seed_user(user.clone());
        let store: Arc<dyn StatStore> = Arc::new(memory);

        let ranks = ranks_for(&store, &user).await.unwrap();
        assert_eq!(ranks.total, 1);
        assert_eq!(ranks.today, 1);
        assert_eq!(ranks.week, 1);
        assert_eq!(ranks.month, 1);
    }
}
