use thiserror::Error;
use uuid::Uuid;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an SQL error.
    #[error("SQLx error")]
    Sqlx { source: sqlx::Error },

    /// Represents a store that could not be reached or has shut down.
    #[error("Store unavailable")]
    StoreUnavailable { source: sqlx::Error },

    /// Represents a stored image URL that does not parse.
    #[error("Unable to parse URL {url}")]
    UnableToParseUrl { url: String, source: url::ParseError },

    /// Represents an attempt to claim an event that no longer exists,
    /// e.g. because the store was reseeded mid-selection.
    #[error("Non-existent ID {0}")]
    NonExistentId(Uuid),

    /// Represents a configured UTC offset outside ±23:59.
    #[error("Invalid UTC offset of {0} minutes")]
    InvalidUtcOffset(i16),
}

impl BackendError {
    /// Whether the caller can reasonably retry the operation later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::StoreUnavailable { .. } | BackendError::NonExistentId(..)
        )
    }
}
