//! tree operations.
//!
//! in Git, a tree is a directory. A persisted reflog capture uses a flat
//! tree with a single `reflog` blob, but the reader here lists whatever the
//! tree actually holds so that tampered captures can be detected upstream.

use git2::{Repository, Tree};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{EntryMode, ObjectId, TreeEntry, TreeId};

/// A read only handle to a git tree
///
/// think of it as a snapshot - it won't change even if new commits are made.
#[derive(Debug)]
pub struct TreeHandle<'repo> {
    tree: Tree<'repo>,
}

impl<'repo> TreeHandle<'repo> {
    /// create a TreeHandle from a git2::Tree
    pub(crate) fn new(tree: Tree<'repo>) -> Self {
        Self { tree }
    }

    /// look up a tree by id
    pub fn find(repo: &'repo Repository, id: TreeId) -> StorageResult<Self> {
        let tree = repo
            .find_tree(id.raw())
            .map_err(|_| StorageError::ObjectNotFound {
                kind: "tree",
                id: id.to_string(),
            })?;
        Ok(Self::new(tree))
    }

    /// list all entries in tree order
    ///
    /// entries whose name is not valid UTF-8 or whose mode is unknown are
    /// reported as an error rather than skipped.
    pub fn entries(&self) -> StorageResult<Vec<TreeEntry>> {
        self.tree
            .iter()
            .map(|entry| {
                let name = entry.name().ok_or_else(|| StorageError::UnexpectedEntryType {
                    path: String::from_utf8_lossy(entry.name_bytes()).into_owned().into(),
                    expected: "utf-8 entry name".to_string(),
                    found: "non utf-8 bytes".to_string(),
                })?;

                let mode = EntryMode::from_raw(entry.filemode()).ok_or_else(|| {
                    StorageError::UnexpectedEntryType {
                        path: name.into(),
                        expected: "known git file mode".to_string(),
                        found: format!("{:o}", entry.filemode()),
                    }
                })?;

                Ok(TreeEntry {
                    name: name.to_string(),
                    mode,
                    id: ObjectId::new(entry.id()),
                })
            })
            .collect()
    }
}

/// write a flat tree made of the given entries
pub fn write_tree(repo: &Repository, entries: &[TreeEntry]) -> StorageResult<TreeId> {
    let mut builder = repo.treebuilder(None)?;
    for entry in entries {
        builder.insert(entry.name.as_str(), entry.id.raw(), entry.mode.as_raw())?;
    }
    let oid = builder.write()?;
    Ok(TreeId::new(oid))
}
