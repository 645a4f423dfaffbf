//! Clients for external collaborators.

/// Discord OAuth and guild member REST client.
pub mod discord;
