//!   Core Git repository wrapper.
//!
//!  This is the production implementation of [`ObjectStore`]. It wraps
//!  `git2::Repository` behind a mutex and exposes the handful of object and
//!  ref operations the reflog logic needs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use git2::Repository;
use parking_lot::Mutex;

use crate::storage::blob;
use crate::storage::commit::{self, CommitBuilder, CommitInfo};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::refs::RefManager;
use crate::storage::store::ObjectStore;
use crate::storage::tree::{self, TreeHandle};
use crate::storage::types::{BlobId, BranchName, CommitId, GitSignature, TreeEntry, TreeId};

/// The main Git repository wrapper.
///
/// Clone this to share the handle - it uses Arc internally.
#[derive(Clone)]
pub struct GitRepository {
    repo: Arc<Mutex<Repository>>,
    git_dir: PathBuf,
    signature: GitSignature,
}

impl GitRepository {
    /// Open an existing repository (bare or with a work tree).
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let repo =
            Repository::open(path).map_err(|_| StorageError::NotInitialized(path.to_path_buf()))?;
        Ok(Self::wrap(repo))
    }

    /// Initialize a new bare repository.
    pub fn init(path: impl AsRef<Path>) -> StorageResult<Self> {
        let repo = Repository::init_bare(path.as_ref())?;
        Ok(Self::wrap(repo))
    }

    fn wrap(repo: Repository) -> Self {
        let git_dir = repo.path().to_path_buf();
        Self {
            repo: Arc::new(Mutex::new(repo)),
            git_dir,
            signature: GitSignature::reflog_persist(),
        }
    }

    /// Set the signature for commits.
    pub fn with_signature(mut self, signature: GitSignature) -> Self {
        self.signature = signature;
        self
    }

    /// The git directory (`.git` or the bare repository itself).
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Path of the local reflog file for a branch.
    pub fn reflog_path(&self, branch: &BranchName) -> PathBuf {
        branch.log_path(&self.git_dir)
    }

    /// Execute a function with access to the repository.
    pub fn with_repo<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Repository) -> StorageResult<T>,
    {
        let repo = self.repo.lock();
        f(&repo)
    }

    /// Get information about a commit.
    pub fn get_commit(&self, id: CommitId) -> StorageResult<CommitInfo> {
        self.with_repo(|repo| commit::get_commit(repo, id))
    }

    /// Walk the first-parent chain from a commit, newest first.
    pub fn history(&self, from: CommitId, limit: Option<usize>) -> StorageResult<Vec<CommitInfo>> {
        self.with_repo(|repo| {
            let iter = commit::history(repo, from)?;
            match limit {
                Some(n) => iter.take(n).collect(),
                None => iter.collect(),
            }
        })
    }

    /// List all refs below a prefix.
    pub fn list_refs(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.with_repo(|repo| RefManager::list(repo, prefix))
    }
}

impl ObjectStore for GitRepository {
    fn write_blob(&self, bytes: &[u8]) -> StorageResult<BlobId> {
        self.with_repo(|repo| blob::write_blob(repo, bytes))
    }

    fn write_tree(&self, entries: &[TreeEntry]) -> StorageResult<TreeId> {
        self.with_repo(|repo| tree::write_tree(repo, entries))
    }

    fn write_commit(
        &self,
        tree: TreeId,
        parents: &[CommitId],
        message: &str,
    ) -> StorageResult<CommitId> {
        self.with_repo(|repo| {
            CommitBuilder::new(repo)
                .tree(tree)
                .parents(parents.to_vec())
                .message(message)
                .signature(self.signature.clone())
                .commit()
        })
    }

    fn read_tree_entries(&self, tree: TreeId) -> StorageResult<Vec<TreeEntry>> {
        self.with_repo(|repo| TreeHandle::find(repo, tree)?.entries())
    }

    fn read_blob(&self, blob: BlobId) -> StorageResult<Vec<u8>> {
        self.with_repo(|repo| blob::read_blob(repo, blob))
    }

    fn resolve_ref(&self, refname: &str) -> StorageResult<Option<CommitId>> {
        self.with_repo(|repo| RefManager::resolve(repo, refname))
    }

    fn parents_of(&self, commit: CommitId) -> StorageResult<Vec<CommitId>> {
        self.with_repo(|repo| commit::parents_of(repo, commit))
    }

    fn tree_of(&self, commit: CommitId) -> StorageResult<TreeId> {
        self.with_repo(|repo| commit::tree_of(repo, commit))
    }

    fn write_ref(&self, refname: &str, target: CommitId) -> StorageResult<()> {
        self.with_repo(|repo| RefManager::write(repo, refname, target))
    }
}
