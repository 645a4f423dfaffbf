//! Achievement catalog and progress payloads.

use serde::Serialize;
use utoipa::ToSchema;

/// One entry of the static achievement catalog.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AchievementDefinitionDto {
    /// Achievement name, unique within the catalog.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Numeric goal, absent for flag-only achievements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<i64>,
}

/// Per-user progress against one catalog entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AchievementProgress {
    /// Achievement name, matching the catalog.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Numeric goal, absent for flag-only achievements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<i64>,
    /// Current progress value; 0 for flag-only achievements.
    pub progress: i64,
    /// Whether a persisted completion record marks this achievement done.
    /// Progress reaching the target never flips this on its own.
    pub completed: bool,
}
