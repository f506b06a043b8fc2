//! The object store gateway.
//!
//! Everything above the storage layer talks to the object store through
//! this trait, so the reflog logic can run against a real repository or
//! against [`MemoryStore`](crate::storage::MemoryStore) in tests.

use crate::storage::error::StorageResult;
use crate::storage::types::{BlobId, CommitId, TreeEntry, TreeId};

/// Primitive operations of a content-addressed blob/tree/commit store.
pub trait ObjectStore {
    /// Store raw content. Identical bytes always yield the same id.
    fn write_blob(&self, bytes: &[u8]) -> StorageResult<BlobId>;

    /// Build a tree object from named entries.
    fn write_tree(&self, entries: &[TreeEntry]) -> StorageResult<TreeId>;

    /// Create a commit from a tree and zero or more parents.
    fn write_commit(
        &self,
        tree: TreeId,
        parents: &[CommitId],
        message: &str,
    ) -> StorageResult<CommitId>;

    /// List the entries of a tree.
    fn read_tree_entries(&self, tree: TreeId) -> StorageResult<Vec<TreeEntry>>;

    /// Read a blob's content.
    fn read_blob(&self, blob: BlobId) -> StorageResult<Vec<u8>>;

    /// Resolve a ref to a commit, `None` if it does not exist.
    fn resolve_ref(&self, refname: &str) -> StorageResult<Option<CommitId>>;

    /// The parents of a commit, in order.
    fn parents_of(&self, commit: CommitId) -> StorageResult<Vec<CommitId>>;

    /// The root tree of a commit.
    fn tree_of(&self, commit: CommitId) -> StorageResult<TreeId>;

    /// Point a ref at a commit, overwriting any previous value.
    fn write_ref(&self, refname: &str, target: CommitId) -> StorageResult<()>;
}
