//! Error taxonomy for the synchronization core.

use thiserror::Error;

use crate::storage::StoreError;

/// Coarse category used by the gateway to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing client input. Never retried.
    Validation,
    /// Persistence layer failed.
    Storage,
    /// An external collaborator (auth, capture) failed.
    Collaborator,
    /// Anything else.
    Unknown,
}

/// Errors reported by [`StateSynchronizer`](crate::StateSynchronizer),
/// [`InteractionRelay`](crate::InteractionRelay) and the gateway hooks.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("collaborator failure: {0}")]
    Collaborator(String),

    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Validation(_) => ErrorKind::Validation,
            SyncError::Storage(_) => ErrorKind::Storage,
            SyncError::Collaborator(_) => ErrorKind::Collaborator,
            SyncError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(e: tokio::task::JoinError) -> Self {
        SyncError::Unknown(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(SyncError::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(
            SyncError::from(StoreError::Io("disk".into())).kind(),
            ErrorKind::Storage
        );
        assert_eq!(SyncError::Collaborator("x".into()).kind(), ErrorKind::Collaborator);
        assert_eq!(SyncError::Unknown("x".into()).kind(), ErrorKind::Unknown);
        assert!(SyncError::Validation("x".into()).is_client_error());
        assert!(!SyncError::Unknown("x".into()).is_client_error());
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = SyncError::Validation("missing id".into());
        assert_eq!(err.to_string(), "missing id");
    }

    #[test]
    fn test_storage_message_is_transparent() {
        let err = SyncError::from(StoreError::Database("column family missing".into()));
        assert_eq!(err.to_string(), "Database error: column family missing");
    }
}
