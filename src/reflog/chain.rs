//! Commit-graph construction for persisted captures.
//!
//! | verdict   | parent of the new capture          | effect                 |
//! |-----------|------------------------------------|------------------------|
//! | `Initial` | none                               | root capture           |
//! | `Sane`    | parent of the previous capture     | amend, depth unchanged |
//! | `Insane`  | the previous capture itself        | chain, depth + 1       |
//!
//! Under normal operation every capture holds the full log, so the previous
//! one carries no extra information and is replaced. When the log looks
//! rewritten, the previous capture may be the only record of the lost
//! entries and is kept as an ancestor.

use crate::reflog::checker::Verdict;
use crate::reflog::snapshot::ReflogSnapshot;
use crate::reflog::REFLOG_ENTRY;
use crate::storage::{CommitId, ObjectStore, StorageError, StorageResult, TreeEntry};

/// commit message used unless configured otherwise
pub const DEFAULT_MESSAGE: &str = "persist reflog";

/// A capture written to the store but not yet recorded by any ref.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltCapture {
    pub commit: CommitId,
    pub parent: Option<CommitId>,
}

/// Writes blob, tree and commit for a new capture.
pub struct ChainBuilder<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    message: String,
}

impl<'a, S: ObjectStore + ?Sized> ChainBuilder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            message: DEFAULT_MESSAGE.to_string(),
        }
    }

    /// set the commit message (may be empty)
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Choose the parent of the next capture.
    pub fn parent_for(
        &self,
        verdict: Verdict,
        previous: Option<CommitId>,
    ) -> StorageResult<Option<CommitId>> {
        match (verdict, previous) {
            (Verdict::Initial, _) => Ok(None),
            (Verdict::Sane, Some(prev)) => Ok(self.store.parents_of(prev)?.first().copied()),
            (Verdict::Insane, Some(prev)) => Ok(Some(prev)),
            (verdict, None) => Err(StorageError::Internal(format!(
                "verdict {} requires an existing capture",
                verdict
            ))),
        }
    }

    /// Write the snapshot as a new capture. No ref is moved.
    pub fn build(
        &self,
        verdict: Verdict,
        snapshot: &ReflogSnapshot,
        previous: Option<CommitId>,
    ) -> StorageResult<BuiltCapture> {
        let parent = self.parent_for(verdict, previous)?;

        let blob = self.store.write_blob(snapshot.bytes())?;
        let tree = self.store.write_tree(&[TreeEntry::blob(REFLOG_ENTRY, blob)])?;
        let parents: Vec<CommitId> = parent.into_iter().collect();
        let commit = self.store.write_commit(tree, &parents, &self.message)?;

        Ok(BuiltCapture { commit, parent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn snapshot(content: &str) -> ReflogSnapshot {
        ReflogSnapshot::from_bytes(content.as_bytes().to_vec())
    }

    #[test]
    fn test_initial_capture_is_root() {
        let store = MemoryStore::new();
        let built = ChainBuilder::new(&store)
            .build(Verdict::Initial, &snapshot("A\n"), None)
            .unwrap();

        assert_eq!(built.parent, None);
        assert!(store.parents_of(built.commit).unwrap().is_empty());
        assert_eq!(store.message_of(built.commit).unwrap(), DEFAULT_MESSAGE);

        let entries = store.read_tree_entries(store.tree_of(built.commit).unwrap()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "reflog");
        assert_eq!(store.read_blob(entries[0].id.as_blob()).unwrap(), b"A\n".to_vec());
    }

    #[test]
    fn test_sane_on_root_capture_stays_root() {
        let store = MemoryStore::new();
        let builder = ChainBuilder::new(&store);
        let root = builder.build(Verdict::Initial, &snapshot("A\n"), None).unwrap();

        let amended = builder.build(Verdict::Sane, &snapshot("A\nB\n"), Some(root.commit)).unwrap();

        assert_eq!(amended.parent, None);
        assert!(store.parents_of(amended.commit).unwrap().is_empty());
    }

    #[test]
    fn test_sane_amends_onto_grandparent() {
        let store = MemoryStore::new();
        let builder = ChainBuilder::new(&store);
        let p = builder.build(Verdict::Initial, &snapshot("A\n"), None).unwrap().commit;
        let c = builder.build(Verdict::Insane, &snapshot("X\n"), Some(p)).unwrap().commit;

        let amended = builder.build(Verdict::Sane, &snapshot("X\nY\n"), Some(c)).unwrap();

        assert_eq!(amended.parent, Some(p));
        assert_eq!(store.parents_of(amended.commit).unwrap(), vec![p]);
    }

    #[test]
    fn test_insane_chains_onto_previous() {
        let store = MemoryStore::new();
        let builder = ChainBuilder::new(&store);
        let c = builder.build(Verdict::Initial, &snapshot("A\nB\n"), None).unwrap().commit;

        let chained = builder.build(Verdict::Insane, &snapshot("X\n"), Some(c)).unwrap();

        assert_eq!(chained.parent, Some(c));
        assert_eq!(store.parents_of(chained.commit).unwrap(), vec![c]);
    }

    #[test]
    fn test_custom_and_empty_message() {
        let store = MemoryStore::new();
        let custom = ChainBuilder::new(&store)
            .message("reflog of main")
            .build(Verdict::Initial, &snapshot("A\n"), None)
            .unwrap();
        let empty = ChainBuilder::new(&store)
            .message("")
            .build(Verdict::Initial, &snapshot("A\n"), None)
            .unwrap();

        assert_eq!(store.message_of(custom.commit).unwrap(), "reflog of main");
        assert_eq!(store.message_of(empty.commit).unwrap(), "");
    }

    #[test]
    fn test_continuation_without_previous_is_rejected() {
        let store = MemoryStore::new();
        let builder = ChainBuilder::new(&store);

        assert!(builder.parent_for(Verdict::Sane, None).is_err());
        assert!(builder.parent_for(Verdict::Insane, None).is_err());
        assert_eq!(store.object_count(), 0);
    }
}
