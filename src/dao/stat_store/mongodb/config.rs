//! Connection settings for the MongoDB backend.

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

/// Database used when the caller does not name one.
const DEFAULT_DB: &str = "starboard";

/// Parsed MongoDB connection settings.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Parsed client options derived from the connection URI.
    pub options: ClientOptions,
    /// Database holding the stats, shop, and counter collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse a connection URI into reusable client options.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;

        Ok(Self {
            options,
            database_name: db_name.unwrap_or(DEFAULT_DB).to_owned(),
        })
    }
}
