// src/error/types.rs

use serde::Serialize;
use thiserror::Error;

/// Failure modes of a remote catalog fetch.
///
/// A fetch either returns the complete paginated listing or one of these;
/// there are no partial results (the diff needs a full snapshot to infer
/// removals).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Network unavailable")]
    NetworkUnavailable,

    #[error("Request timed out")]
    Timeout,

    #[error("Server returned status {0}")]
    ServerError(u16),

    #[error("Response was not a valid catalog payload")]
    InvalidResponse,

    #[error("Rate limited by origin (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },
}

/// Failure modes of a sync pass, as surfaced to callers.
///
/// `RateLimited` here is the *local* gate (minimum interval since the last
/// successful fetch), distinct from the origin's own 429 which arrives as
/// `Fetch(FetchError::RateLimited { .. })`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Sync rate limited (retry in {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("Storage failed: {0}")]
    Storage(String),

    #[error("Store not found")]
    StoreNotFound,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resource not found")]
    NotFound,

    #[error("Other error: {0}")]
    Other(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Other(format!("UUID error: {}", err))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Other(format!("Date parse error: {}", err))
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
