//! Hook configuration.
//!
//! The repository location and refname handling are resolved once, up front,
//! into a [`Config`] value. Nothing below this layer reads the environment.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::reflog::DEFAULT_MESSAGE;
use crate::storage::{BranchName, InvalidNameError};

/// Configuration errors. All of them happen before the store is opened.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("repository location unknown: pass --git-dir, set GIT_DIR, or give --project")]
    MissingRepository,

    #[error("invalid project name: '{0}'")]
    InvalidProject(String),

    #[error("cannot determine default base path: {0}")]
    NoBasePath(String),

    #[error("invalid branch name: {0}")]
    InvalidBranch(#[from] InvalidNameError),
}

/// How refnames handed to the hook map to branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefnamePolicy {
    /// only `refs/heads/<name>` is a branch; everything else is ignored
    #[default]
    HeadsOnly,
    /// additionally treat bare names (no `refs/` prefix) as branch names
    AllowShort,
}

impl RefnamePolicy {
    /// Map a refname to the branch it names.
    ///
    /// `Ok(None)` means the ref is not a branch and the update is ignored.
    pub fn branch_for(self, refname: &str) -> Result<Option<BranchName>, ConfigError> {
        if let Some(branch) = BranchName::from_refname(refname)? {
            return Ok(Some(branch));
        }
        match self {
            RefnamePolicy::AllowShort if !refname.starts_with("refs/") => {
                Ok(Some(BranchName::new(refname)?))
            }
            _ => Ok(None),
        }
    }
}

/// Where to find the repository.
#[derive(Debug, Clone, Default)]
pub struct RepositoryLocation {
    /// explicit git directory (`--git-dir` or `GIT_DIR`)
    pub git_dir: Option<PathBuf>,
    /// project name, resolved as `<base_path>/<project>.git`
    pub project: Option<String>,
    /// directory holding `<project>.git` repositories
    pub base_path: Option<PathBuf>,
}

impl RepositoryLocation {
    /// Resolve to a git directory.
    ///
    /// An explicit git dir wins; otherwise the project is looked up under
    /// the base path, which defaults to `<exe dir>/../git`.
    pub fn resolve(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.git_dir {
            return Ok(dir.clone());
        }

        let project = self.project.as_deref().ok_or(ConfigError::MissingRepository)?;
        validate_project(project)?;

        let base = match &self.base_path {
            Some(base) => base.clone(),
            None => default_base_path()?,
        };
        Ok(base.join(format!("{}.git", project)))
    }
}

fn validate_project(project: &str) -> Result<(), ConfigError> {
    let trimmed = project.trim_end_matches(".git");
    let path = Path::new(trimmed);
    let valid = !trimmed.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidProject(project.to_string()))
    }
}

/// `<directory of the running executable>/../git`
pub fn default_base_path() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe().map_err(|e| ConfigError::NoBasePath(e.to_string()))?;
    let dir = exe
        .parent()
        .ok_or_else(|| ConfigError::NoBasePath(format!("{} has no parent", exe.display())))?;
    Ok(dir.join("..").join("git"))
}

/// Resolved configuration for a persist run.
#[derive(Debug, Clone)]
pub struct Config {
    /// git directory of the repository
    pub git_dir: PathBuf,
    /// commit message of new captures
    pub message: String,
    /// refname handling
    pub refnames: RefnamePolicy,
}

impl Config {
    /// Create a configuration for the given git directory.
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
            message: DEFAULT_MESSAGE.to_string(),
            refnames: RefnamePolicy::default(),
        }
    }

    /// Resolve the repository location and build a configuration.
    pub fn from_location(location: &RepositoryLocation) -> Result<Self, ConfigError> {
        Ok(Self::new(location.resolve()?))
    }

    /// Set the commit message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the refname policy.
    pub fn refnames(mut self, policy: RefnamePolicy) -> Self {
        self.refnames = policy;
        self
    }

    /// Map a refname to the branch it names, see [`RefnamePolicy::branch_for`].
    pub fn branch_for(&self, refname: &str) -> Result<Option<BranchName>, ConfigError> {
        self.refnames.branch_for(refname)
    }
}
