//! Error type for the MongoDB backend.

use mongodb::error::Error as MongoError;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Result alias for MongoDB DAO operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Failures specific to the MongoDB backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Parse failure reported by the driver.
        #[source]
        source: MongoError,
    },
    /// The client could not be constructed from the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// The initial connection ping kept failing.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Last ping failure.
        #[source]
        source: MongoError,
    },
    /// A periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// Index bootstrap failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Index key description.
        index: &'static str,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// A read against a collection failed.
    #[error("query on `{collection}` failed")]
    Query {
        /// Collection being read.
        collection: &'static str,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// A write against a collection failed.
    #[error("write on `{collection}` failed")]
    Write {
        /// Collection being written.
        collection: &'static str,
        /// Driver failure.
        #[source]
        source: MongoError,
    },
    /// Starting the purchase session or transaction failed.
    #[error("failed to open purchase transaction")]
    Transaction {
        /// Driver failure.
        #[source]
        source: MongoError,
    },
}

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        let message = err.to_string();
        StorageError::unavailable(message, err)
    }
}
