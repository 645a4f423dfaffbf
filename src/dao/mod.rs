//! Persistence layer: entities, the storage abstraction, and its backends.

/// Database model definitions.
pub mod models;
/// User stats, shop, and inventory storage operations.
pub mod stat_store;
/// Storage abstraction layer for database operations.
pub mod storage;
