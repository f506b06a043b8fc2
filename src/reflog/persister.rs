//! Orchestration of a single persist run.

use std::path::Path;

use serde::Serialize;

use crate::reflog::chain::{ChainBuilder, DEFAULT_MESSAGE};
use crate::reflog::checker::{persisted_tail, Verdict};
use crate::reflog::snapshot::{ReflogSnapshot, TAIL_LEN};
use crate::reflog::ReflogResult;
use crate::storage::{BranchName, CommitId, ObjectStore};

/// Options for [`RefPersister`].
#[derive(Debug, Clone)]
pub struct PersistOptions {
    /// commit message of new captures
    pub message: String,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self {
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

impl PersistOptions {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// What a persist run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistOutcome {
    pub branch: String,
    pub verdict: Verdict,
    /// new value of `refs/reflogs/<branch>`
    pub commit: CommitId,
    /// value of the pointer before this run
    pub previous: Option<CommitId>,
    /// parent chosen for the new capture
    pub parent: Option<CommitId>,
    /// number of entries in the captured log
    pub entries: usize,
}

impl PersistOutcome {
    /// operator-facing status line
    pub fn status_line(&self) -> String {
        format!("log was {}", self.verdict)
    }
}

/// Captures a branch's local reflog and records it under `refs/reflogs/`.
pub struct RefPersister<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    options: PersistOptions,
}

impl<'a, S: ObjectStore + ?Sized> RefPersister<'a, S> {
    pub fn new(store: &'a S, options: PersistOptions) -> Self {
        Self { store, options }
    }

    /// Persist the reflog at `log_path` for `branch`.
    ///
    /// All objects are written before the pointer moves, so a failure at any
    /// step leaves the previous pointer untouched.
    pub fn persist(&self, branch: &BranchName, log_path: &Path) -> ReflogResult<PersistOutcome> {
        let pointer = branch.reflog_ref();
        let previous = self.store.resolve_ref(&pointer)?;
        let local = ReflogSnapshot::read_all(log_path)?;
        self.persist_snapshot(branch, &local, previous)
    }

    /// Persist an already loaded snapshot against a known pointer value.
    pub fn persist_snapshot(
        &self,
        branch: &BranchName,
        local: &ReflogSnapshot,
        previous: Option<CommitId>,
    ) -> ReflogResult<PersistOutcome> {
        let prior_tail = match previous {
            Some(commit) => Some(persisted_tail(self.store, commit)?),
            None => None,
        };
        let verdict = Verdict::evaluate(prior_tail.as_ref(), &local.tail(TAIL_LEN));

        let built = ChainBuilder::new(self.store)
            .message(self.options.message.as_str())
            .build(verdict, local, previous)?;

        self.store.write_ref(&branch.reflog_ref(), built.commit)?;

        match verdict {
            Verdict::Insane => tracing::warn!(
                branch = %branch,
                %verdict,
                commit = %built.commit,
                previous = ?previous.map(|c| c.short()),
                "reflog is not an append-only continuation, previous capture kept as ancestor"
            ),
            _ => tracing::info!(
                branch = %branch,
                %verdict,
                commit = %built.commit,
                entries = local.len(),
                "reflog persisted"
            ),
        }

        Ok(PersistOutcome {
            branch: branch.to_string(),
            verdict,
            commit: built.commit,
            previous,
            parent: built.parent,
            entries: local.len(),
        })
    }
}
