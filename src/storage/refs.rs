//!  Reference management.
//!
//!  Git refs are pointers to commits. This module handles resolving a ref
//!  to the commit it points at and force-writing a ref to a new commit.
//!
//!  Persisted reflog pointers live under `refs/reflogs/<branch>`. Writes are
//!  unconditional: the hosting server's per-ref lock serializes updates for
//!  a single branch, so no compare-and-swap happens here.

use git2::{ErrorCode, Repository};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::CommitId;

/// Manages Git references.
pub struct RefManager;

impl RefManager {
    /// Resolve a ref to the commit it points at.
    ///
    /// Returns `None` if the ref does not exist.
    pub fn resolve(repo: &Repository, refname: &str) -> StorageResult<Option<CommitId>> {
        let reference = match repo.find_reference(refname) {
            Ok(reference) => reference,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Git(e)),
        };

        let commit = reference.peel_to_commit()?;
        Ok(Some(CommitId::new(commit.id())))
    }

    /// Point a ref at a commit, creating it if needed.
    ///
    /// This is a force update. Missing parent directories of loose refs are
    /// created by git.
    pub fn write(repo: &Repository, refname: &str, target: CommitId) -> StorageResult<()> {
        repo.find_commit(target.raw())
            .map_err(|_| StorageError::ObjectNotFound {
                kind: "commit",
                id: target.to_string(),
            })?;

        repo.reference(refname, target.raw(), true, &format!("persist reflog {}", target.short()))?;
        Ok(())
    }

    /// List refs below a prefix, e.g. `refs/reflogs/`.
    pub fn list(repo: &Repository, prefix: &str) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for reference in repo.references_glob(&format!("{}*", prefix))? {
            let reference = reference?;
            if let Some(name) = reference.name() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::blob::write_blob;
    use crate::storage::commit::CommitBuilder;
    use crate::storage::tree::write_tree;
    use crate::storage::types::TreeEntry;
    use tempfile::TempDir;

    fn setup_repo_with_commit() -> (TempDir, Repository, CommitId) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init_bare(dir.path()).unwrap();

        let commit_id = {
            let blob = write_blob(&repo, b"A\n").unwrap();
            let tree = write_tree(&repo, &[TreeEntry::blob("reflog", blob)]).unwrap();
            CommitBuilder::new(&repo).tree(tree).commit().unwrap()
        };

        (dir, repo, commit_id)
    }

    #[test]
    fn test_resolve_missing_ref() {
        let (_dir, repo, _) = setup_repo_with_commit();
        assert_eq!(RefManager::resolve(&repo, "refs/reflogs/main").unwrap(), None);
        assert!(repo.find_reference("refs/reflogs/main").is_err());
    }

    #[test]
    fn test_write_and_resolve() {
        let (dir, repo, commit) = setup_repo_with_commit();

        RefManager::write(&repo, "refs/reflogs/feature/deep/name", commit).unwrap();

        assert_eq!(
            RefManager::resolve(&repo, "refs/reflogs/feature/deep/name").unwrap(),
            Some(commit)
        );
        // loose ref file holds the literal id
        let content = std::fs::read_to_string(
            dir.path().join("refs").join("reflogs").join("feature").join("deep").join("name"),
        )
        .unwrap();
        assert_eq!(content.trim(), commit.to_string());
    }

    #[test]
    fn test_write_overwrites() {
        let (_dir, repo, first) = setup_repo_with_commit();
        let second = {
            let blob = write_blob(&repo, b"A\nB\n").unwrap();
            let tree = write_tree(&repo, &[TreeEntry::blob("reflog", blob)]).unwrap();
            CommitBuilder::new(&repo).tree(tree).commit().unwrap()
        };

        RefManager::write(&repo, "refs/reflogs/main", first).unwrap();
        RefManager::write(&repo, "refs/reflogs/main", second).unwrap();

        assert_eq!(RefManager::resolve(&repo, "refs/reflogs/main").unwrap(), Some(second));
    }

    #[test]
    fn test_write_unknown_commit_fails() {
        let (_dir, repo, _) = setup_repo_with_commit();
        let bogus = CommitId::from_hex("4444444444444444444444444444444444444444").unwrap();

        let result = RefManager::write(&repo, "refs/reflogs/main", bogus);
        assert!(matches!(result, Err(StorageError::ObjectNotFound { .. })));
        assert_eq!(RefManager::resolve(&repo, "refs/reflogs/main").unwrap(), None);
    }

    #[test]
    fn test_list() {
        let (_dir, repo, commit) = setup_repo_with_commit();
        RefManager::write(&repo, "refs/reflogs/main", commit).unwrap();
        RefManager::write(&repo, "refs/reflogs/dev", commit).unwrap();

        let names = RefManager::list(&repo, "refs/reflogs/").unwrap();
        assert_eq!(names, vec!["refs/reflogs/dev", "refs/reflogs/main"]);
    }
}
