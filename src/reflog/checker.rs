//! Append-only consistency check.
//!
//! The check is a heuristic. A trustworthy continuation has the previously
//! persisted log's newest entry as its second-to-last entry, i.e. exactly
//! one entry was appended. A log that was truncated and re-appended with a
//! line that happens to match is still classified as sane.

use std::fmt;

use serde::Serialize;

use crate::reflog::snapshot::{ReflogSnapshot, Tail, TAIL_LEN};
use crate::reflog::{ReflogError, ReflogResult, REFLOG_ENTRY};
use crate::storage::{CommitId, ObjectStore};

/// Outcome of comparing the local log against the last persisted capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// nothing persisted yet for this branch
    Initial,
    /// the local log continues the persisted one
    Sane,
    /// the local log does not continue the persisted one
    Insane,
}

impl Verdict {
    /// Compare the persisted tail (if a capture exists) with the local tail.
    pub fn evaluate(prior: Option<&Tail>, local: &Tail) -> Self {
        let Some(prior) = prior else {
            return Verdict::Initial;
        };

        let Some(prior_last) = prior.last() else {
            return Verdict::Sane;
        };

        match local.second_to_last() {
            Some(local_prev) if local_prev == prior_last => Verdict::Sane,
            _ => Verdict::Insane,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Initial => "initial",
            Verdict::Sane => "sane",
            Verdict::Insane => "insane",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read the full reflog stored in a persisted capture.
///
/// The capture's tree must hold exactly one blob whose name ends in
/// `reflog`; anything else means the persisted history was tampered with.
pub fn persisted_snapshot<S>(store: &S, commit: CommitId) -> ReflogResult<ReflogSnapshot>
where
    S: ObjectStore + ?Sized,
{
    let tree = store.tree_of(commit)?;
    let matches: Vec<_> = store
        .read_tree_entries(tree)?
        .into_iter()
        .filter(|entry| entry.mode.is_blob() && entry.name.ends_with(REFLOG_ENTRY))
        .collect();

    if matches.len() != 1 {
        return Err(ReflogError::Integrity {
            commit,
            matches: matches.len(),
        });
    }

    let bytes = store.read_blob(matches[0].id.as_blob())?;
    Ok(ReflogSnapshot::from_bytes(bytes))
}

/// The tail of a persisted capture.
pub fn persisted_tail<S>(store: &S, commit: CommitId) -> ReflogResult<Tail>
where
    S: ObjectStore + ?Sized,
{
    Ok(persisted_snapshot(store, commit)?.tail(TAIL_LEN))
}
