//! Request/response payloads exposed by the HTTP API.

/// Achievement catalog and progress payloads.
pub mod achievements;
/// OAuth handshake payloads.
pub mod auth;
/// Shared payloads used across route trees.
pub mod common;
/// Health payloads.
pub mod health;
/// Leaderboard payloads.
pub mod leaderboard;
/// Profile payloads.
pub mod profile;
/// Shop and purchase payloads.
pub mod shop;
