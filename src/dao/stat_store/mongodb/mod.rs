//! MongoDB-backed [`StatStore`](super::StatStore) implementation.

mod config;
mod connection;
mod error;
mod scope;
mod store;

pub use config::MongoConfig;
pub use error::{MongoDaoError, MongoResult};
pub use store::MongoStatStore;
