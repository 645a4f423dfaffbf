//! Entities shared between the storage backends and the service layer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel stock value meaning an item never runs out.
pub const UNLIMITED_STOCK: i64 = -1;

/// Per-user statistics record, keyed publicly by its opaque `uuid` handle.
///
/// Counters other than `stars` are maintained by an external collection
/// process; this backend only reads them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStatsEntity {
    /// Opaque public profile handle, distinct from the Discord user id.
    pub uuid: Uuid,
    /// Discord user identifier.
    pub user_id: String,
    /// Discord guild identifier the record belongs to.
    pub guild_id: String,
    /// Last known display name, refreshed on login.
    pub username: String,
    /// Last known avatar hash, refreshed on login.
    pub avatar: Option<String>,
    /// All-time message count.
    pub total_messages: i64,
    /// Messages sent today.
    pub today_messages: i64,
    /// Messages sent over the last 7 days.
    pub week_messages: i64,
    /// Messages sent over the last 30 days.
    pub month_messages: i64,
    /// Total voice channel time, in milliseconds.
    pub voice_time_ms: i64,
    /// Moderation warnings received.
    pub warns: i64,
    /// Virtual currency balance.
    pub stars: i64,
    /// Message count per date string, as maintained by the collector.
    pub messages_by_date: IndexMap<String, i64>,
    /// Persisted achievement completion records.
    pub achievements: Vec<AchievementRecordEntity>,
    /// First-seen acquisition timestamp (epoch millis) per tracked role.
    pub role_acquired_at: IndexMap<String, i64>,
    /// Record creation timestamp, epoch millis.
    pub created_at_ms: i64,
}

impl UserStatsEntity {
    /// Create a blank stats record for a first-time login, with a fresh handle.
    pub fn new(
        guild_id: String,
        user_id: String,
        username: String,
        avatar: Option<String>,
        created_at_ms: i64,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            user_id,
            guild_id,
            username,
            avatar,
            total_messages: 0,
            today_messages: 0,
            week_messages: 0,
            month_messages: 0,
            voice_time_ms: 0,
            warns: 0,
            stars: 0,
            messages_by_date: IndexMap::new(),
            achievements: Vec::new(),
            role_acquired_at: IndexMap::new(),
            created_at_ms,
        }
    }
}

/// Persisted completion flag for a single achievement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AchievementRecordEntity {
    /// Achievement name, matching the static catalog.
    pub name: String,
    /// Whether the achievement has been awarded.
    pub completed: bool,
}

/// Shop item document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemEntity {
    /// Unique item name, used as the lookup key.
    pub name: String,
    /// Price in stars before discounts; never negative.
    pub price: i64,
    /// Remaining stock, or [`UNLIMITED_STOCK`].
    pub stock: i64,
}

impl ItemEntity {
    /// Whether this item uses the unlimited stock sentinel.
    pub fn unlimited(&self) -> bool {
        self.stock == UNLIMITED_STOCK
    }
}

/// Per-user inventory document, created lazily on first purchase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryEntity {
    /// Owning Discord user identifier.
    pub user_id: String,
    /// One line per distinct item owned.
    pub items: Vec<InventoryLineEntity>,
}

/// A single owned-item line inside an inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryLineEntity {
    /// Name snapshot of the purchased item.
    pub item_name: String,
    /// Owned quantity, always at least 1.
    pub quantity: i64,
}

/// Metric a leaderboard page can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaderboardSort {
    /// All-time message count.
    TotalMessages,
    /// Total voice time.
    VoiceTime,
    /// Stars balance.
    Stars,
}

impl LeaderboardSort {
    /// Document field the backend sorts on.
    pub fn field_name(self) -> &'static str {
        match self {
            LeaderboardSort::TotalMessages => "total_messages",
            LeaderboardSort::VoiceTime => "voice_time_ms",
            LeaderboardSort::Stars => "stars",
        }
    }
}

/// Windowed message counter a rank is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    /// All-time messages.
    Total,
    /// Messages sent today.
    Today,
    /// Messages over the last 7 days.
    Week,
    /// Messages over the last 30 days.
    Month,
}

impl RankMetric {
    /// Document field holding this metric.
    pub fn field_name(self) -> &'static str {
        match self {
            RankMetric::Total => "total_messages",
            RankMetric::Today => "today_messages",
            RankMetric::Week => "week_messages",
            RankMetric::Month => "month_messages",
        }
    }

    /// Read this metric off a stats record.
    pub fn value_of(self, user: &UserStatsEntity) -> i64 {
        match self {
            RankMetric::Total => user.total_messages,
            RankMetric::Today => user.today_messages,
            RankMetric::Week => user.week_messages,
            RankMetric::Month => user.month_messages,
        }
    }
}
