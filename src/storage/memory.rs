//! In-memory object store.
//!
//! A content-addressed fake of [`ObjectStore`] for tests and dry runs.
//! Object ids are git object hashes of a canonical encoding, so blob ids
//! agree with those a real repository assigns to the same bytes. Tree and
//! commit ids are stable for identical inputs but do not match git's,
//! since commits here carry no signature or timestamp.

use std::collections::{BTreeMap, HashMap};

use git2::{ObjectType, Oid};
use parking_lot::Mutex;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::store::ObjectStore;
use crate::storage::types::{BlobId, CommitId, EntryMode, TreeEntry, TreeId};

#[derive(Debug, Clone)]
enum Object {
    Blob(Vec<u8>),
    Tree(Vec<TreeEntry>),
    Commit { tree: TreeId, parents: Vec<CommitId>, message: String },
}

/// In-memory [`ObjectStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<Oid, Object>>,
    refs: Mutex<BTreeMap<String, CommitId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// number of stored objects of all kinds
    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }

    /// snapshot of all refs and their targets
    pub fn refs(&self) -> BTreeMap<String, CommitId> {
        self.refs.lock().clone()
    }

    /// the commit message of a stored commit
    pub fn message_of(&self, commit: CommitId) -> StorageResult<String> {
        match self.objects.lock().get(&commit.raw()) {
            Some(Object::Commit { message, .. }) => Ok(message.clone()),
            _ => Err(not_found("commit", commit)),
        }
    }

    fn insert(&self, kind: ObjectType, encoded: &[u8], object: Object) -> StorageResult<Oid> {
        let oid = Oid::hash_object(kind, encoded)?;
        self.objects.lock().entry(oid).or_insert(object);
        Ok(oid)
    }

    fn contains_commit(&self, id: CommitId) -> bool {
        matches!(self.objects.lock().get(&id.raw()), Some(Object::Commit { .. }))
    }
}

fn not_found(kind: &'static str, id: impl ToString) -> StorageError {
    StorageError::ObjectNotFound {
        kind,
        id: id.to_string(),
    }
}

/// git's tree ordering: directories sort as if their name ended in `/`
fn tree_sort_key(entry: &TreeEntry) -> Vec<u8> {
    let mut key = entry.name.as_bytes().to_vec();
    if entry.mode == EntryMode::Tree {
        key.push(b'/');
    }
    key
}

impl ObjectStore for MemoryStore {
    fn write_blob(&self, bytes: &[u8]) -> StorageResult<BlobId> {
        let oid = self.insert(ObjectType::Blob, bytes, Object::Blob(bytes.to_vec()))?;
        Ok(BlobId::new(oid))
    }

    fn write_tree(&self, entries: &[TreeEntry]) -> StorageResult<TreeId> {
        let mut sorted: BTreeMap<Vec<u8>, TreeEntry> = BTreeMap::new();
        for entry in entries {
            if entry.name.is_empty() || entry.name.contains('/') || entry.name.contains('\0') {
                return Err(StorageError::UnexpectedEntryType {
                    path: entry.name.clone().into(),
                    expected: "single path component".to_string(),
                    found: format!("{:?}", entry.name),
                });
            }
            // later entries replace earlier ones with the same name, like git's treebuilder
            sorted.retain(|_, existing| existing.name != entry.name);
            sorted.insert(tree_sort_key(entry), entry.clone());
        }

        let mut encoded = Vec::new();
        for entry in sorted.values() {
            let header = format!("{:o} {}\0", entry.mode.as_raw(), entry.name);
            encoded.extend_from_slice(header.as_bytes());
            encoded.extend_from_slice(entry.id.raw().as_bytes());
        }

        let entries = sorted.into_values().collect();
        let oid = self.insert(ObjectType::Tree, &encoded, Object::Tree(entries))?;
        Ok(TreeId::new(oid))
    }

    fn write_commit(
        &self,
        tree: TreeId,
        parents: &[CommitId],
        message: &str,
    ) -> StorageResult<CommitId> {
        if !matches!(self.objects.lock().get(&tree.raw()), Some(Object::Tree(_))) {
            return Err(not_found("tree", tree));
        }
        if let Some(missing) = parents.iter().find(|p| !self.contains_commit(**p)) {
            return Err(not_found("commit", missing));
        }

        let mut encoded = format!("tree {}\n", tree);
        for parent in parents {
            encoded.push_str(&format!("parent {}\n", parent));
        }
        encoded.push('\n');
        encoded.push_str(message);

        let oid = self.insert(
            ObjectType::Commit,
            encoded.as_bytes(),
            Object::Commit {
                tree,
                parents: parents.to_vec(),
                message: message.to_string(),
            },
        )?;
        Ok(CommitId::new(oid))
    }

    fn read_tree_entries(&self, tree: TreeId) -> StorageResult<Vec<TreeEntry>> {
        match self.objects.lock().get(&tree.raw()) {
            Some(Object::Tree(entries)) => Ok(entries.clone()),
            _ => Err(not_found("tree", tree)),
        }
    }

    fn read_blob(&self, blob: BlobId) -> StorageResult<Vec<u8>> {
        match self.objects.lock().get(&blob.raw()) {
            Some(Object::Blob(bytes)) => Ok(bytes.clone()),
            _ => Err(not_found("blob", blob)),
        }
    }

    fn resolve_ref(&self, refname: &str) -> StorageResult<Option<CommitId>> {
        Ok(self.refs.lock().get(refname).copied())
    }

    fn parents_of(&self, commit: CommitId) -> StorageResult<Vec<CommitId>> {
        match self.objects.lock().get(&commit.raw()) {
            Some(Object::Commit { parents, .. }) => Ok(parents.clone()),
            _ => Err(not_found("commit", commit)),
        }
    }

    fn tree_of(&self, commit: CommitId) -> StorageResult<TreeId> {
        match self.objects.lock().get(&commit.raw()) {
            Some(Object::Commit { tree, .. }) => Ok(*tree),
            _ => Err(not_found("commit", commit)),
        }
    }

    fn write_ref(&self, refname: &str, target: CommitId) -> StorageResult<()> {
        if !self.contains_commit(target) {
            return Err(not_found("commit", target));
        }
        self.refs.lock().insert(refname.to_string(), target);
        Ok(())
    }
}
