//! Backend-agnostic storage errors.

use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Guard re-checked inside the purchase transaction scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseGuard {
    /// The stars balance no longer covers the debit.
    Funds,
    /// The finite stock no longer covers the quantity.
    Stock,
}

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or failed the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human readable description of the failed operation.
        message: String,
        /// Underlying backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A guarded purchase mutation matched nothing; the scope must abort.
    #[error("purchase precondition failed: {}", match .0 {
        PurchaseGuard::Funds => "insufficient stars",
        PurchaseGuard::Stock => "insufficient stock",
    })]
    Precondition(PurchaseGuard),
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
