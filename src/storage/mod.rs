//! storage layer for reflog-persist
//!
//! this module is the gateway to the content-addressed object store. The
//! reflog logic above it uses the [`ObjectStore`] trait and never touches
//! git2 directly.
//!
//!  # Architecture
//!
//! ```text
//!                    ┌───────────────────────┐
//!                    │      ObjectStore      │
//!                    └───────────────────────┘
//!                       │                 │
//!                       ▼                 ▼
//!             ┌───────────────┐   ┌───────────────┐
//!             │ GitRepository │   │  MemoryStore  │
//!             │    (git2)     │   │   (tests)     │
//!             └───────────────┘   └───────────────┘
//!                     │
//!     ┌───────────┬───┴───────┬───────────┐
//!     ▼           ▼           ▼           ▼
//!  ┌──────┐   ┌──────┐   ┌────────┐   ┌──────┐
//!  │ blob │   │ tree │   │ commit │   │ refs │
//!  └──────┘   └──────┘   └────────┘   └──────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use reflog_persist::storage::{GitRepository, ObjectStore, TreeEntry};
//!
//! let repo = GitRepository::open("/srv/git/project.git")?;
//! let blob = repo.write_blob(b"entry\n")?;
//! let tree = repo.write_tree(&[TreeEntry::blob("reflog", blob)])?;
//! let commit = repo.write_commit(tree, &[], "persist reflog")?;
//! repo.write_ref("refs/reflogs/main", commit)?;
//! # Ok::<(), reflog_persist::storage::StorageError>(())
//! ```

mod blob;
mod commit;
mod error;
mod memory;
mod refs;
mod repository;
mod store;
mod tree;
mod types;

// Re-export public API
pub use commit::CommitInfo;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use repository::GitRepository;
pub use store::ObjectStore;
pub use types::{
    BlobId, BranchName, CommitId, EntryMode, GitSignature, InvalidNameError, ObjectId, TreeEntry,
    TreeId,
};
