//! Reflog persistence.
//!
//! Each update of `refs/heads/<branch>` captures the branch's local reflog
//! as a commit whose tree holds a single `reflog` blob, and records that
//! commit under `refs/reflogs/<branch>`.
//!
//! ```text
//!  local log ──► ReflogSnapshot ──┐
//!                                 ├──► Verdict ──► ChainBuilder ──► RefPersister
//!  refs/reflogs/<b> ──► Tail ─────┘               (blob/tree/commit)  (pointer)
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use reflog_persist::reflog::{PersistOptions, RefPersister};
//! use reflog_persist::storage::{BranchName, GitRepository};
//!
//! let repo = GitRepository::open("/srv/git/project.git")?;
//! let branch = BranchName::new("main")?;
//! let outcome = RefPersister::new(&repo, PersistOptions::default())
//!     .persist(&branch, &repo.reflog_path(&branch))?;
//! println!("{}", outcome.status_line());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod chain;
mod checker;
mod persister;
mod snapshot;

use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::{CommitId, StorageError};

pub use chain::{BuiltCapture, ChainBuilder, DEFAULT_MESSAGE};
pub use checker::{persisted_snapshot, persisted_tail, Verdict};
pub use persister::{PersistOptions, PersistOutcome, RefPersister};
pub use snapshot::{ReflogSnapshot, Tail, TAIL_LEN};

/// name of the blob that holds a captured reflog
pub const REFLOG_ENTRY: &str = "reflog";

/// Result type for reflog operations.
pub type ReflogResult<T> = Result<T, ReflogError>;

/// Errors that abort a persist run.
#[derive(Debug, Error)]
pub enum ReflogError {
    /// the object store rejected a read or write
    #[error("store error: {0}")]
    Store(#[from] StorageError),

    /// a persisted capture does not hold exactly one `reflog` blob
    #[error("integrity error: capture {commit} holds {matches} blobs named *reflog, expected 1")]
    Integrity { commit: CommitId, matches: usize },

    /// the repository or branch could not be resolved
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl ReflogError {
    /// check if this error means persisted history was tampered with
    pub fn is_integrity(&self) -> bool {
        matches!(self, ReflogError::Integrity { .. })
    }

    /// check if this error happened before any store access
    pub fn is_configuration(&self) -> bool {
        matches!(self, ReflogError::Configuration(_))
    }
}
