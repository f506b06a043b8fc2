//! Storage layer error types
//!
//! All errors that can occur while talking to the object store are defined
//! here. We use `thiserror` for ergonomic error definition and better error
//! messages

use std::path::PathBuf;

use thiserror::Error;

/// the main error type for object store operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// error from the underlying Git library
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// repo is not initialized
    #[error("repository not initialized: {0}")]
    NotInitialized(PathBuf),

    /// the object is missing, or is not of the requested kind
    #[error("{kind} not found: {id}")]
    ObjectNotFound { kind: &'static str, id: String },

    /// the tree entry has an unexpected type
    #[error("unexpected entry type at {path}: expected {expected}, found {found}")]
    UnexpectedEntryType {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// internal error that shouldn't happen
    #[error("internal error: {0}")]
    Internal(String),
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let missing = StorageError::ObjectNotFound {
            kind: "blob",
            id: "abc".to_string(),
        };
        assert_eq!(missing.to_string(), "blob not found: abc");

        let git_missing = StorageError::from(git2::Error::new(
            git2::ErrorCode::NotFound,
            git2::ErrorClass::Odb,
            "object not found",
        ));
        assert!(matches!(
            git_missing,
            StorageError::Git(ref e) if e.code() == git2::ErrorCode::NotFound
        ));

        let internal = StorageError::Internal("boom".to_string());
        assert_eq!(internal.to_string(), "internal error: boom");
    }
}
