//! Error types shared by the service and HTTP layers.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    clients::discord::DiscordError,
    dao::storage::{PurchaseGuard, StorageError},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Item is out of stock for the requested quantity.
    #[error("not enough stock for `{item}`")]
    InsufficientStock {
        /// Name of the item that ran out.
        item: String,
    },
    /// Balance cannot cover the discounted total.
    #[error("insufficient stars: need {needed}, have {balance}")]
    InsufficientFunds {
        /// Discounted total the purchase would cost.
        needed: i64,
        /// Current balance of the buyer.
        balance: i64,
    },
    /// The Discord API call backing this operation failed.
    #[error("Discord API unavailable")]
    Upstream(#[source] DiscordError),
    /// Discord asked us to back off; the hint is forwarded to the client.
    #[error("rate limited, retry in {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying, as reported upstream.
        retry_after_secs: u64,
    },
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            // Guard failures carry purchase semantics; everything else means
            // the backend itself is in trouble.
            StorageError::Precondition(PurchaseGuard::Stock) => ServiceError::InsufficientStock {
                item: "requested item".into(),
            },
            StorageError::Precondition(PurchaseGuard::Funds) => ServiceError::InsufficientFunds {
                needed: 0,
                balance: 0,
            },
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<DiscordError> for ServiceError {
    fn from(err: DiscordError) -> Self {
        match err {
            DiscordError::RateLimited { retry_after_secs } => {
                ServiceError::RateLimited { retry_after_secs }
            }
            other => ServiceError::Upstream(other),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Too many requests; carries the retry-after hint in seconds.
    #[error("rate limited, retry in {retry_after_secs}s")]
    TooManyRequests {
        /// Seconds the caller should wait before retrying.
        retry_after_secs: u64,
    },
    /// Upstream platform API failed.
    #[error("upstream unavailable: {0}")]
    BadGateway(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            err @ ServiceError::InsufficientStock { .. } => AppError::BadRequest(err.to_string()),
            err @ ServiceError::InsufficientFunds { .. } => AppError::BadRequest(err.to_string()),
            ServiceError::Upstream(source) => AppError::BadGateway(source.to_string()),
            ServiceError::RateLimited { retry_after_secs } => {
                AppError::TooManyRequests { retry_after_secs }
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let retry_after = match &self {
            AppError::TooManyRequests { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
            retry_after,
        });

        (status, payload).into_response()
    }
}
