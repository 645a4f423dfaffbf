//! Profile payloads.

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dao::models::UserStatsEntity, dto::achievements::AchievementProgress};

/// Full public profile, combining stored counters with derived data.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// Public profile handle.
    pub uuid: Uuid,
    /// Discord user identifier.
    pub user_id: String,
    /// Display name captured at last login.
    pub username: String,
    /// Avatar hash, if any.
    pub avatar: Option<String>,
    /// Raw stored counters.
    pub stats: ProfileStats,
    /// Leaderboard positions over the four message windows.
    pub ranks: RankSet,
    /// Role ids currently held in the guild.
    pub roles: Vec<String>,
    /// First-seen acquisition timestamp (epoch millis) per tracked role.
    pub role_acquired_at: IndexMap<String, i64>,
    /// Progress against the full achievement catalog.
    pub achievements: Vec<AchievementProgress>,
}

/// Stored counters exposed on the profile.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    /// All-time message count.
    pub total_messages: i64,
    /// Messages sent today.
    pub today_messages: i64,
    /// Messages over the last 7 days.
    pub week_messages: i64,
    /// Messages over the last 30 days.
    pub month_messages: i64,
    /// Total voice time in milliseconds.
    pub voice_time: i64,
    /// Moderation warnings received.
    pub warns: i64,
    /// Stars balance.
    pub stars: i64,
}

impl From<&UserStatsEntity> for ProfileStats {
    fn from(user: &UserStatsEntity) -> Self {
        Self {
            total_messages: user.total_messages,
            today_messages: user.today_messages,
            week_messages: user.week_messages,
            month_messages: user.month_messages,
            voice_time: user.voice_time_ms,
            warns: user.warns,
            stars: user.stars,
        }
    }
}

/// Leaderboard position per message window.
///
/// Each rank is `1 + count(users with a strictly greater value)`, so tied
/// users share a rank and the next distinct value skips ahead.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankSet {
    /// All-time rank.
    pub total: u64,
    /// Today rank.
    pub today: u64,
    /// 7-day rank.
    pub week: u64,
    /// 30-day rank.
    pub month: u64,
}
