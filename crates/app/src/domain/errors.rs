//! Marketplace errors.

use std::{error::Error as StdError, fmt};

use thiserror::Error;

use crate::{domain::access::AccessError, storage::StorageError};

/// Record type a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Car,
    Booking,
    Transaction,
    Record,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Car => "car",
            Self::Booking => "booking",
            Self::Transaction => "transaction",
            Self::Record => "record",
        })
    }
}

/// Coarse classification callers branch on to pick what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    InvalidState,
    BackendUnavailable,
    Validation,
}

#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error(transparent)]
    Unauthorized(#[from] AccessError),

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("{0}")]
    InvalidState(String),

    #[error("backend unavailable")]
    BackendUnavailable(#[source] StorageError),

    #[error("{0}")]
    Validation(String),

    #[error("booking failed: {message}")]
    BookingFailed { message: String },
}

impl MarketplaceError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::BackendUnavailable(_) | Self::BookingFailed { .. } => {
                ErrorKind::BackendUnavailable
            }
            Self::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Map a storage failure for a lookup of `entity`.
    pub(crate) fn storage(entity: Entity, error: StorageError) -> Self {
        match error {
            StorageError::NotFound | StorageError::InvalidReference => Self::NotFound(entity),
            StorageError::AlreadyExists => Self::InvalidState(format!("{entity} already exists")),
            error => Self::BackendUnavailable(error),
        }
    }
}

impl From<StorageError> for MarketplaceError {
    fn from(error: StorageError) -> Self {
        Self::storage(Entity::Record, error)
    }
}

/// Render an error with its chain of causes, for messages shown to the caller.
pub fn describe(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

/// Attach the looked-up entity to storage errors.
pub(crate) trait StorageResultExt<T> {
    fn or_not_found(self, entity: Entity) -> Result<T, MarketplaceError>;
}

impl<T> StorageResultExt<T> for Result<T, StorageError> {
    fn or_not_found(self, entity: Entity) -> Result<T, MarketplaceError> {
        self.map_err(|error| MarketplaceError::storage(entity, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_distinct_kinds() {
        assert_eq!(
            MarketplaceError::storage(Entity::Car, StorageError::NotFound).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            MarketplaceError::storage(Entity::User, StorageError::AlreadyExists).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            MarketplaceError::from(StorageError::Unavailable("connection refused".into())).kind(),
            ErrorKind::BackendUnavailable
        );
    }

    #[test]
    fn booking_failure_is_a_backend_error() {
        let error = MarketplaceError::BookingFailed {
            message: "disk full".to_string(),
        };

        assert_eq!(error.kind(), ErrorKind::BackendUnavailable);
        assert_eq!(error.to_string(), "booking failed: disk full");
    }

    #[test]
    fn describe_includes_causes() {
        let error = StorageError::Io(std::io::Error::other("disk full"));

        assert_eq!(describe(&error), "snapshot io error: disk full");
    }

    #[test]
    fn access_errors_are_unauthorized() {
        let error = MarketplaceError::from(AccessError::Unauthenticated);

        assert_eq!(error.kind(), ErrorKind::Unauthorized);
    }
}
