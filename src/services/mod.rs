//! Business logic sitting between the routes and the storage layer.

/// Achievement catalog and evaluator.
pub mod achievement_service;
/// Landing-page counter.
pub mod counter_service;
/// Aggregated OpenAPI document.
pub mod documentation;
/// Health reporting.
pub mod health_service;
/// Discord OAuth login and role bookkeeping.
pub mod identity_service;
/// Cached leaderboard pages.
pub mod leaderboard_service;
/// Profile assembly and message history.
pub mod profile_service;
/// Purchase transactor.
pub mod purchase_service;
/// Leaderboard rank computation.
pub mod rank;
/// Shop catalog.
pub mod shop_service;
/// Storage connection supervision.
pub mod storage_supervisor;
