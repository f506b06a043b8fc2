//!  Commit creation and history traversal
//!
//! every persisted reflog capture is a commit. This module handles commit
//! creation, parent lookup and walking the first-parent chain of captures.

use chrono::{DateTime, TimeZone, Utc};
use git2::{Repository, Revwalk, Sort};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{CommitId, GitSignature, TreeId};

/// information about a commit
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub id: CommitId,
    pub tree_id: TreeId,
    pub parent_ids: Vec<CommitId>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl CommitInfo {
    /// create CommitInfo from a git2::Commit
    pub(crate) fn from_git2(commit: &git2::Commit<'_>) -> Self {
        let time = commit.time();
        let timestamp = Utc
            .timestamp_opt(time.seconds(), 0)
            .single()
            .unwrap_or_else(Utc::now);

        Self {
            id: CommitId::new(commit.id()),
            tree_id: TreeId::new(commit.tree_id()),
            parent_ids: commit.parent_ids().map(CommitId::new).collect(),
            message: commit.message().unwrap_or("").to_string(),
            timestamp,
        }
    }
}

/// builder for creating commits with a fluent interface
pub struct CommitBuilder<'a> {
    repo: &'a Repository,
    tree_id: Option<TreeId>,
    parents: Vec<CommitId>,
    message: String,
    signature: GitSignature,
}

impl<'a> CommitBuilder<'a> {
    /// create a new CommitBuilder
    pub fn new(repo: &'a Repository) -> Self {
        Self {
            repo,
            tree_id: None,
            parents: Vec::new(),
            message: String::new(),
            signature: GitSignature::reflog_persist(),
        }
    }

    /// set the tree for this commit
    pub fn tree(mut self, tree_id: TreeId) -> Self {
        self.tree_id = Some(tree_id);
        self
    }

    /// set all parents at once
    pub fn parents(mut self, parents: Vec<CommitId>) -> Self {
        self.parents = parents;
        self
    }

    /// set the commit message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// set the author/committer signature
    pub fn signature(mut self, signature: GitSignature) -> Self {
        self.signature = signature;
        self
    }

    /// create the commit and return its ID
    ///
    /// no ref is moved; the caller decides where the commit is recorded.
    pub fn commit(self) -> StorageResult<CommitId> {
        let tree_id = self
            .tree_id
            .ok_or_else(|| StorageError::Internal("commit requires a tree".to_string()))?;

        let tree = self
            .repo
            .find_tree(tree_id.raw())
            .map_err(|_| StorageError::ObjectNotFound {
                kind: "tree",
                id: tree_id.to_string(),
            })?;
        let sig = self.signature.to_git2_signature()?;

        // collect parent commits
        let parent_commits: Vec<git2::Commit<'_>> = self
            .parents
            .iter()
            .map(|id| find_commit(self.repo, *id))
            .collect::<Result<_, _>>()?;

        let parent_refs: Vec<&git2::Commit<'_>> = parent_commits.iter().collect();

        let oid = self
            .repo
            .commit(None, &sig, &sig, &self.message, &tree, &parent_refs)?;

        Ok(CommitId::new(oid))
    }
}

fn find_commit(repo: &Repository, id: CommitId) -> StorageResult<git2::Commit<'_>> {
    repo.find_commit(id.raw())
        .map_err(|_| StorageError::ObjectNotFound {
            kind: "commit",
            id: id.to_string(),
        })
}

/// get information about a commit
pub fn get_commit(repo: &Repository, id: CommitId) -> StorageResult<CommitInfo> {
    let commit = find_commit(repo, id)?;
    Ok(CommitInfo::from_git2(&commit))
}

/// list a commit's parents in order
pub fn parents_of(repo: &Repository, id: CommitId) -> StorageResult<Vec<CommitId>> {
    let commit = find_commit(repo, id)?;
    Ok(commit.parent_ids().map(CommitId::new).collect())
}

/// the root tree of a commit
pub fn tree_of(repo: &Repository, id: CommitId) -> StorageResult<TreeId> {
    let commit = find_commit(repo, id)?;
    Ok(TreeId::new(commit.tree_id()))
}

/// iterate over the first-parent chain starting from a commit
pub struct HistoryIterator<'repo> {
    repo: &'repo Repository,
    revwalk: Revwalk<'repo>,
}

impl<'repo> HistoryIterator<'repo> {
    /// create a new history iterator
    pub fn new(repo: &'repo Repository, start: CommitId) -> StorageResult<Self> {
        let mut revwalk = repo.revwalk()?;
        revwalk.push(start.raw())?;
        revwalk.set_sorting(Sort::TOPOLOGICAL)?;
        revwalk.simplify_first_parent()?;

        Ok(Self { repo, revwalk })
    }
}

impl<'repo> Iterator for HistoryIterator<'repo> {
    type Item = StorageResult<CommitInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.revwalk.next()? {
            Ok(oid) => match self.repo.find_commit(oid) {
                Ok(commit) => Some(Ok(CommitInfo::from_git2(&commit))),
                Err(e) => Some(Err(StorageError::Git(e))),
            },
            Err(e) => Some(Err(StorageError::Git(e))),
        }
    }
}

/// get history for a commit
pub fn history(repo: &Repository, start: CommitId) -> StorageResult<HistoryIterator<'_>> {
    HistoryIterator::new(repo, start)
}
