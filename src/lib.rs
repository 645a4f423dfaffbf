//! Library crate for starboard-back, exposing modules for binaries and integration tests.

/// Read-through TTL caches.
pub mod cache;
/// Outbound HTTP clients.
pub mod clients;
/// Runtime configuration.
pub mod config;
/// Storage layer.
pub mod dao;
/// Wire payloads.
pub mod dto;
/// Error types.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Business logic.
pub mod services;
/// Shared application state.
pub mod state;
