//! Achievement catalog and per-user progress evaluation.
//!
//! The catalog is a single static table shared by the public catalog endpoint
//! and the evaluator, so the two can never drift apart.

use uuid::Uuid;

use crate::{
    dao::models::UserStatsEntity,
    dto::achievements::{AchievementDefinitionDto, AchievementProgress},
    error::ServiceError,
    state::SharedState,
};

/// Where an achievement's live progress value comes from.
enum ProgressSource {
    /// Messages sent today.
    TodayMessages,
    /// Voice time, in whole seconds.
    VoiceSeconds,
    /// No measurable progress; completion is granted externally.
    None,
}

struct AchievementDef {
    name: &'static str,
    description: &'static str,
    target: Option<i64>,
    source: ProgressSource,
}

/// Every achievement the backend knows about, in display order.
const CATALOG: [AchievementDef; 4] = [
    AchievementDef {
        name: "Daily Grind",
        description: "Send 100 messages in a single day.",
        target: Some(100),
        source: ProgressSource::TodayMessages,
    },
    AchievementDef {
        name: "Hour of Voice",
        description: "Spend a full hour in voice channels.",
        target: Some(3600),
        source: ProgressSource::VoiceSeconds,
    },
    AchievementDef {
        name: "First Purchase",
        description: "Buy something from the shop.",
        target: None,
        source: ProgressSource::None,
    },
    AchievementDef {
        name: "Pillar of the Community",
        description: "Awarded by the moderation team.",
        target: None,
        source: ProgressSource::None,
    },
];

/// The full achievement catalog, without any per-user data.
pub fn catalog() -> Vec<AchievementDefinitionDto> {
    CATALOG
        .iter()
        .map(|def| AchievementDefinitionDto {
            name: def.name.to_owned(),
            description: def.description.to_owned(),
            target: def.target,
        })
        .collect()
}

/// Evaluate a user's progress against the catalog.
///
/// Progress is recomputed from the stats on every call, but `completed` only
/// reflects what the awarding side persisted. Reaching the target does not
/// flip the flag by itself.
pub fn evaluate(user: &UserStatsEntity) -> Vec<AchievementProgress> {
    CATALOG
        .iter()
        .map(|def| {
            let progress = match def.source {
                ProgressSource::TodayMessages => user.today_messages,
                ProgressSource::VoiceSeconds => user.voice_time_ms / 1000,
                ProgressSource::None => 0,
            };
            let completed = user
                .achievements
                .iter()
                .any(|record| record.name == def.name && record.completed);
            AchievementProgress {
                name: def.name.to_owned(),
                description: def.description.to_owned(),
                target: def.target,
                progress,
                completed,
            }
        })
        .collect()
}

/// Cached per-user achievement progress.
pub async fn progress_for(
    state: &SharedState,
    uuid: Uuid,
) -> Result<Vec<AchievementProgress>, ServiceError> {
    let store = state.require_stat_store().await?;
    let (progress, _) = state
        .achievement_cache()
        .get_or_load(uuid, || async move {
            let user = store
                .find_user_by_uuid(uuid)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("no profile for {uuid}")))?;
            Ok::<_, ServiceError>(evaluate(&user))
        })
        .await?;
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::AchievementRecordEntity;

    fn blank_user() -> UserStatsEntity {
        UserStatsEntity::new("guild".into(), "user".into(), "user".into(), None, 0)
    }

    #[test]
    fn voice_progress_is_whole_seconds() {
        let mut user = blank_user();
        user.voice_time_ms = 5999;

        let progress = evaluate(&user);
        let voice = progress
            .iter()
            .find(|entry| entry.name == "Hour of Voice")
            .unwrap();
        assert_eq!(voice.progress, 5);
    }

    #[test]
    fn reaching_the_target_does_not_complete() {
        let mut user = blank_user();
        user.today_messages = 250;

        let progress = evaluate(&user);
        let daily = progress
            .iter()
            .find(|entry| entry.name == "Daily Grind")
            .unwrap();
        assert_eq!(daily.progress, 250);
        assert!(!daily.completed);
    }

    #[test]
    fn persisted_completion_is_reported() {
        let mut user = blank_user();
        user.achievements.push(AchievementRecordEntity {
            name: "First Purchase".into(),
            completed: true,
        });

        let progress = evaluate(&user);
        let purchase = progress
            .iter()
            .find(|entry| entry.name == "First Purchase")
            .unwrap();
        assert!(purchase.completed);
    }

    #[test]
    fn catalog_and_evaluation_share_order() {
        let names_from_catalog: Vec<String> =
            catalog().into_iter().map(|def| def.name).collect();
        let names_from_eval: Vec<String> = evaluate(&blank_user())
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names_from_catalog, names_from_eval);
    }
}
