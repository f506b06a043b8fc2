//! Hook entry points.
//!
//! These tie the resolved [`Config`] to a repository and run one operation.
//! The CLI is a thin layer over them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::reflog::{persisted_snapshot, PersistOptions, PersistOutcome, RefPersister, ReflogResult};
use crate::storage::{BranchName, CommitId, GitRepository, ObjectStore};

/// Details of a branch update as passed by the hosting server.
///
/// Only `refname` drives behavior; the rest is logged.
#[derive(Debug, Clone, Default)]
pub struct RefUpdate {
    pub refname: String,
    pub project: Option<String>,
    pub user: Option<String>,
    pub old_rev: Option<String>,
    pub new_rev: Option<String>,
}

/// Persist the reflog of the branch named by `update`.
///
/// Returns `Ok(None)` without touching the store when the ref is not a
/// branch.
pub fn persist(config: &Config, update: &RefUpdate) -> ReflogResult<Option<PersistOutcome>> {
    let Some(branch) = config.branch_for(&update.refname)? else {
        tracing::debug!(refname = %update.refname, "not a branch, nothing to persist");
        return Ok(None);
    };

    tracing::debug!(
        branch = %branch,
        project = ?update.project,
        user = ?update.user,
        old_rev = ?update.old_rev,
        new_rev = ?update.new_rev,
        "persisting reflog"
    );

    let repo = GitRepository::open(&config.git_dir)?;
    let log_path = repo.reflog_path(&branch);
    let options = PersistOptions::default().message(config.message.as_str());

    let outcome = RefPersister::new(&repo, options).persist(&branch, &log_path)?;
    Ok(Some(outcome))
}

/// One persisted capture in a branch's history.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureSummary {
    pub commit: CommitId,
    pub timestamp: DateTime<Utc>,
    pub entries: usize,
    pub parents: usize,
}

/// Persisted history of one branch, newest capture first.
#[derive(Debug, Clone, Serialize)]
pub struct BranchHistory {
    pub branch: String,
    pub captures: Vec<CaptureSummary>,
}

/// Walk the persisted captures of a branch.
///
/// Returns an empty history if nothing was persisted yet.
pub fn history(
    repo: &GitRepository,
    branch: &BranchName,
    limit: Option<usize>,
) -> ReflogResult<BranchHistory> {
    let mut captures = Vec::new();

    if let Some(head) = repo.resolve_ref(&branch.reflog_ref())? {
        for info in repo.history(head, limit)? {
            let snapshot = persisted_snapshot(repo, info.id)?;
            captures.push(CaptureSummary {
                commit: info.id,
                timestamp: info.timestamp,
                entries: snapshot.len(),
                parents: info.parent_ids.len(),
            });
        }
    }

    Ok(BranchHistory {
        branch: branch.to_string(),
        captures,
    })
}

/// All branches that have a persisted reflog.
pub fn persisted_branches(repo: &GitRepository) -> ReflogResult<Vec<BranchName>> {
    let mut branches = Vec::new();
    for refname in repo.list_refs(BranchName::REFLOGS_PREFIX)? {
        if let Some(short) = refname.strip_prefix(BranchName::REFLOGS_PREFIX) {
            branches.push(BranchName::new(short).map_err(crate::config::ConfigError::from)?);
        }
    }
    Ok(branches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RefnamePolicy;
    use crate::reflog::{ReflogError, Verdict};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        GitRepository::init(dir.path()).unwrap();
        let config = Config::new(dir.path());
        (dir, config)
    }

    fn write_log(git_dir: &Path, branch: &str, content: &str) {
        let path = BranchName::new(branch).unwrap().log_path(git_dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn update(refname: &str) -> RefUpdate {
        RefUpdate {
            refname: refname.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_non_branch_update_is_noop() {
        let (dir, config) = setup();

        let outcome = persist(&config, &update("refs/tags/v1.0")).unwrap();

        assert!(outcome.is_none());
        assert!(!dir.path().join("refs").join("reflogs").exists());
    }

    #[test]
    fn test_non_branch_update_skips_repository() {
        let config = Config::new("/nonexistent/repository.git");
        assert!(persist(&config, &update("refs/meta/config")).unwrap().is_none());
    }

    #[test]
    fn test_persist_branch_update() {
        let (dir, config) = setup();
        write_log(dir.path(), "main", "A\nB\n");

        let outcome = persist(&config, &update("refs/heads/main")).unwrap().unwrap();

        assert_eq!(outcome.verdict, Verdict::Initial);
        assert_eq!(outcome.branch, "main");
        let repo = GitRepository::open(dir.path()).unwrap();
        assert_eq!(repo.resolve_ref("refs/reflogs/main").unwrap(), Some(outcome.commit));
        assert_eq!(repo.get_commit(outcome.commit).unwrap().message, "persist reflog");
    }

    #[test]
    fn test_short_refnames() {
        let (dir, config) = setup();
        let config = config.refnames(RefnamePolicy::AllowShort);
        write_log(dir.path(), "dev", "A\n");

        let outcome = persist(&config, &update("dev")).unwrap().unwrap();
        assert_eq!(outcome.branch, "dev");
    }

    #[test]
    fn test_missing_repository_is_store_error() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path().join("missing.git"));

        let result = persist(&config, &update("refs/heads/main"));
        assert!(matches!(result, Err(ReflogError::Store(_))));
    }

    #[test]
    fn test_invalid_branch_is_configuration_error() {
        let (_dir, config) = setup();
        let result = persist(&config, &update("refs/heads/a/../b"));
        assert!(result.unwrap_err().is_configuration());
    }

    #[test]
    fn test_history() {
        let (dir, config) = setup();
        write_log(dir.path(), "main", "A\nB\n");
        persist(&config, &update("refs/heads/main")).unwrap();
        write_log(dir.path(), "main", "X\n");
        persist(&config, &update("refs/heads/main")).unwrap();

        let repo = GitRepository::open(dir.path()).unwrap();
        let branch = BranchName::new("main").unwrap();
        let history = history(&repo, &branch, None).unwrap();

        assert_eq!(history.captures.len(), 2);
        assert_eq!(history.captures[0].entries, 1);
        assert_eq!(history.captures[0].parents, 1);
        assert_eq!(history.captures[1].entries, 2);
        assert_eq!(history.captures[1].parents, 0);

        let limited = super::history(&repo, &branch, Some(1)).unwrap();
        assert_eq!(limited.captures.len(), 1);
    }

    #[test]
    fn test_history_of_unpersisted_branch() {
        let (dir, _config) = setup();
        let repo = GitRepository::open(dir.path()).unwrap();
        let history = history(&repo, &BranchName::new("main").unwrap(), None).unwrap();
        assert!(history.captures.is_empty());
    }

    #[test]
    fn test_persisted_branches() {
        let (dir, config) = setup();
        write_log(dir.path(), "main", "A\n");
        write_log(dir.path(), "release/1.0", "B\n");
        persist(&config, &update("refs/heads/main")).unwrap();
        persist(&config, &update("refs/heads/release/1.0")).unwrap();

        let repo = GitRepository::open(dir.path()).unwrap();
        let names: Vec<_> = persisted_branches(&repo)
            .unwrap()
            .into_iter()
            .map(|b| b.to_string())
            .collect();
        assert_eq!(names, vec!["main", "release/1.0"]);
    }
}
