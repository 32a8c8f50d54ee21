use crate::link::ShortLink;
use thiserror::Error;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Errors reported by a [`Repository`](crate::Repository) backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("token not found: {0}")]
    NotFound(String),
    #[error("short link has been deleted: {0}")]
    Gone(String),
    #[error("token already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage io failed: {0}")]
    Io(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::Io(error.to_string())
    }
}

/// The kind of a [`LinkError`], without its payload.
///
/// Transport adapters translate this into protocol status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    Gone,
    NotAllowed,
    Unauthenticated,
    Internal,
    Unavailable,
    Cancelled,
}

/// Errors returned by the link lifecycle service.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    /// A link for the same long URL is already active. Carries that link so
    /// callers can still hand out the canonical token.
    #[error("short link already exists: {}", .0.token)]
    AlreadyExists(ShortLink),
    #[error("short link not found: {0}")]
    NotFound(String),
    #[error("short link has been deleted: {0}")]
    Gone(String),
    #[error("not allowed: {0}")]
    NotAllowed(String),
    #[error("caller has no identity")]
    Unauthenticated,
    #[error("internal error: {0}")]
    Internal(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("operation cancelled by caller")]
    Cancelled,
}

impl LinkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LinkError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            LinkError::NotFound(_) => ErrorKind::NotFound,
            LinkError::Gone(_) => ErrorKind::Gone,
            LinkError::NotAllowed(_) => ErrorKind::NotAllowed,
            LinkError::Unauthenticated => ErrorKind::Unauthenticated,
            LinkError::Internal(_) => ErrorKind::Internal,
            LinkError::Unavailable(_) => ErrorKind::Unavailable,
            LinkError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns the already-active link carried by an `AlreadyExists` error.
    pub fn existing_link(&self) -> Option<&ShortLink> {
        match self {
            LinkError::AlreadyExists(link) => Some(link),
            _ => None,
        }
    }
}

impl From<StorageError> for LinkError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound(token) => LinkError::NotFound(token),
            StorageError::Gone(token) => LinkError::Gone(token),
            StorageError::Unavailable(message) | StorageError::Timeout(message) => {
                LinkError::Unavailable(message)
            }
            // A storage-level token collision is not a content duplicate.
            StorageError::Conflict(token) => {
                LinkError::Internal(format!("token collision in storage: {token}"))
            }
            other => LinkError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Token, UserId};

    #[test]
    fn storage_tombstone_errors_keep_their_kind() {
        let not_found: LinkError = StorageError::NotFound("aaaaaaaa".into()).into();
        let gone: LinkError = StorageError::Gone("aaaaaaaa".into()).into();

        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(gone.kind(), ErrorKind::Gone);
    }

    #[test]
    fn storage_conflict_is_internal() {
        let err: LinkError = StorageError::Conflict("aaaaaaaa".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.existing_link().is_none());
    }

    #[test]
    fn storage_outage_is_unavailable() {
        let err: LinkError = StorageError::Timeout("pool timed out".into()).into();
        assert_eq!(err.kind(), ErrorKind::Unavailable);

        let err: LinkError = StorageError::InvalidData("bad row".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn already_exists_carries_link() {
        let link = ShortLink {
            token: Token::new_unchecked("EwHXdJfB"),
            long_url: "https://example.com".to_string(),
            created_by: UserId::from("u1"),
        };
        let err = LinkError::AlreadyExists(link.clone());

        assert_eq!(err.existing_link(), Some(&link));
        assert_eq!(err.to_string(), "short link already exists: EwHXdJfB");
    }
}
