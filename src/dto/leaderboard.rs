//! Leaderboard payloads.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::dao::models::{LeaderboardSort, UserStatsEntity};

/// Query parameters accepted by `GET /leaderboard`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Metric the page is sorted by; defaults to total messages.
    #[serde(rename = "sortBy", default)]
    pub sort_by: LeaderboardSortParam,
    /// 1-based page number.
    pub page: Option<u64>,
    /// Page size, clamped server-side.
    pub limit: Option<i64>,
}

/// Wire form of the leaderboard sort metric.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum LeaderboardSortParam {
    /// All-time message count.
    #[default]
    TotalMessages,
    /// Total voice time.
    VoiceTime,
    /// Stars balance.
    Stars,
}

impl From<LeaderboardSortParam> for LeaderboardSort {
    fn from(value: LeaderboardSortParam) -> Self {
        match value {
            LeaderboardSortParam::TotalMessages => LeaderboardSort::TotalMessages,
            LeaderboardSortParam::VoiceTime => LeaderboardSort::VoiceTime,
            LeaderboardSortParam::Stars => LeaderboardSort::Stars,
        }
    }
}

impl LeaderboardSortParam {
    /// Stable key used to cache pages per sort metric.
    pub fn cache_key(self) -> &'static str {
        LeaderboardSort::from(self).field_name()
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Public profile handle, linking to `/profile/{uuid}`.
    pub uuid: Uuid,
    /// Display name captured at last login.
    pub username: String,
    /// Avatar hash, if any.
    pub avatar: Option<String>,
    /// All-time message count.
    pub total_messages: i64,
    /// Total voice time in milliseconds.
    pub voice_time: i64,
    /// Stars balance.
    pub stars: i64,
}

impl From<UserStatsEntity> for LeaderboardEntry {
    fn from(user: UserStatsEntity) -> Self {
        Self {
            uuid: user.uuid,
            username: user.username,
            avatar: user.avatar,
            total_messages: user.total_messages,
            voice_time: user.voice_time_ms,
            stars: user.stars,
        }
    }
}

/// Page of leaderboard rows plus the cache refresh hint.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Rows for the requested page.
    pub data: Vec<LeaderboardEntry>,
    /// Milliseconds until the server-side cache entry refreshes.
    #[serde(rename = "nextUpdateIn")]
    pub next_update_in: u64,
}
