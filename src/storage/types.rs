//! core type-safe wrappers around git primitives for the storage layer.

use std::fmt;
use std::fmt::Formatter;
use std::path::{Path, PathBuf};

use git2::Oid;
use serde::{Serialize, Serializer};

/// untyped object identifier, as found in tree entries
///
/// Tree entries may point at blobs, subtrees or gitlinks, so they carry
/// this instead of one of the typed ids below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) Oid);

impl ObjectId {
    pub(crate) fn new(oid: Oid) -> Self {
        Self(oid)
    }

    pub(crate) fn raw(&self) -> Oid {
        self.0
    }

    /// parse an ObjectId from a hex string
    pub fn from_hex(hex: &str) -> Result<Self, git2::Error> {
        Oid::from_str(hex).map(ObjectId)
    }

    /// reinterpret as a blob id (caller has checked the entry mode)
    pub fn as_blob(&self) -> BlobId {
        BlobId(self.0)
    }

    /// reinterpret as a tree id
    pub fn as_tree(&self) -> TreeId {
        TreeId(self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// This makes sure we don't accidentally pass a blob ID where a commit ID
/// is expected. The inner Oid is only accessible within the storage module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitId(pub(crate) Oid);

impl CommitId {
    pub(crate) fn new(oid: Oid) -> Self {
        Self(oid)
    }

    /// raw Oid (for internal use only)
    pub(crate) fn raw(&self) -> Oid {
        self.0
    }

    /// parse CommitId from a hex string
    pub fn from_hex(hex: &str) -> Result<Self, git2::Error> {
        Oid::from_str(hex).map(CommitId)
    }

    /// short form of the commit ID
    pub fn short(&self) -> String {
        self.0.to_string()[..7].to_string()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for CommitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Git blob identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobId(pub(crate) Oid);

impl BlobId {
    pub(crate) fn new(oid: Oid) -> Self {
        Self(oid)
    }

    pub(crate) fn raw(&self) -> Oid {
        self.0
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<BlobId> for ObjectId {
    fn from(id: BlobId) -> Self {
        ObjectId(id.0)
    }
}

/// Git tree identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(pub(crate) Oid);

impl TreeId {
    pub(crate) fn new(oid: Oid) -> Self {
        Self(oid)
    }

    pub(crate) fn raw(&self) -> Oid {
        self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TreeId> for ObjectId {
    fn from(id: TreeId) -> Self {
        ObjectId(id.0)
    }
}

/// file mode of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// regular file (100644)
    Blob,
    /// executable file (100755)
    Executable,
    /// subdirectory (040000)
    Tree,
    /// symbolic link (120000)
    Link,
    /// submodule commit (160000)
    Commit,
}

impl EntryMode {
    /// the octal mode git stores for this entry kind
    pub fn as_raw(self) -> i32 {
        match self {
            EntryMode::Blob => 0o100644,
            EntryMode::Executable => 0o100755,
            EntryMode::Tree => 0o040000,
            EntryMode::Link => 0o120000,
            EntryMode::Commit => 0o160000,
        }
    }

    /// map a raw git filemode back to an entry kind
    pub fn from_raw(mode: i32) -> Option<Self> {
        match mode {
            0o100644 | 0o100664 => Some(EntryMode::Blob),
            0o100755 => Some(EntryMode::Executable),
            0o040000 => Some(EntryMode::Tree),
            0o120000 => Some(EntryMode::Link),
            0o160000 => Some(EntryMode::Commit),
            _ => None,
        }
    }

    /// true for entries whose content is a blob
    pub fn is_blob(self) -> bool {
        matches!(self, EntryMode::Blob | EntryMode::Executable | EntryMode::Link)
    }
}

/// a single named entry of a tree object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub mode: EntryMode,
    pub id: ObjectId,
}

impl TreeEntry {
    /// create a new entry
    pub fn new(name: impl Into<String>, mode: EntryMode, id: impl Into<ObjectId>) -> Self {
        Self {
            name: name.into(),
            mode,
            id: id.into(),
        }
    }

    /// a regular-file entry pointing at a blob
    pub fn blob(name: impl Into<String>, id: BlobId) -> Self {
        Self::new(name, EntryMode::Blob, id)
    }
}

/// A branch, identified by its short name (the part after `refs/heads/`).
///
/// Each branch maps to one local log file and one persisted-history
/// pointer under `refs/reflogs/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchName(String);

impl BranchName {
    /// namespace of local branches
    pub const HEADS_PREFIX: &'static str = "refs/heads/";

    /// namespace of persisted reflog pointers
    pub const REFLOGS_PREFIX: &'static str = "refs/reflogs/";

    /// create a new BranchName from a short name
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidNameError::Empty);
        }
        if name.contains("..") || name.ends_with('/') || name.starts_with('/') {
            return Err(InvalidNameError::InvalidPath(name));
        }
        for (i, c) in name.chars().enumerate() {
            if c.is_control() || c == ' ' || c == '\\' {
                return Err(InvalidNameError::InvalidCharacter { char: c, position: i });
            }
        }
        Ok(Self(name))
    }

    /// Parse a full refname.
    ///
    /// Returns `Ok(None)` for refs outside `refs/heads/`.
    pub fn from_refname(refname: &str) -> Result<Option<Self>, InvalidNameError> {
        match refname.strip_prefix(Self::HEADS_PREFIX) {
            Some(short) => Self::new(short).map(Some),
            None => Ok(None),
        }
    }

    /// get the full ref path (e.g., "refs/heads/main")
    pub fn as_ref_path(&self) -> String {
        format!("{}{}", Self::HEADS_PREFIX, self.0)
    }

    /// the pointer that tracks this branch's persisted reflog
    pub fn reflog_ref(&self) -> String {
        format!("{}{}", Self::REFLOGS_PREFIX, self.0)
    }

    /// path of the local reflog file inside a git directory
    pub fn log_path(&self, git_dir: &Path) -> PathBuf {
        let mut path = git_dir.join("logs");
        for part in self.as_ref_path().split('/') {
            path.push(part);
        }
        path
    }

    /// get the short name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// git signature (author/committer info)
#[derive(Debug, Clone)]
pub struct GitSignature {
    pub name: String,
    pub email: String,
}

impl GitSignature {
    /// create a new signature
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// default signature for persisted reflog commits
    pub fn reflog_persist() -> Self {
        Self::new("reflog-persist", "reflog-persist@localhost")
    }

    /// convert to git2::Signature
    pub(crate) fn to_git2_signature(&self) -> Result<git2::Signature<'static>, git2::Error> {
        git2::Signature::now(&self.name, &self.email)
    }
}

impl Default for GitSignature {
    fn default() -> Self {
        Self::reflog_persist()
    }
}

/// error type for invalid branch names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    Empty,
    InvalidCharacter { char: char, position: usize },
    InvalidPath(String),
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name cannot be empty"),
            Self::InvalidCharacter { char, position } => {
                write!(f, "invalid character {:?} at position {}", char, position)
            }
            Self::InvalidPath(path) => write!(f, "invalid path: '{}'", path),
        }
    }
}

impl std::error::Error for InvalidNameError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_from_refname() {
        let branch = BranchName::from_refname("refs/heads/feature/x").unwrap().unwrap();
        assert_eq!(branch.as_str(), "feature/x");
        assert_eq!(branch.as_ref_path(), "refs/heads/feature/x");
        assert_eq!(branch.reflog_ref(), "refs/reflogs/feature/x");
    }

    #[test]
    fn test_non_branch_refname_is_ignored() {
        assert_eq!(BranchName::from_refname("refs/tags/v1.0").unwrap(), None);
        assert_eq!(BranchName::from_refname("refs/changes/01/1/1").unwrap(), None);
        assert_eq!(BranchName::from_refname("main").unwrap(), None);
    }

    #[test]
    fn test_branch_name_invalid() {
        assert_eq!(BranchName::new(""), Err(InvalidNameError::Empty));
        assert!(BranchName::new("a/../b").is_err());
        assert!(BranchName::new("/main").is_err());
        assert!(BranchName::new("main/").is_err());
        assert!(BranchName::new("has space").is_err());
        assert!(BranchName::from_refname("refs/heads/").is_err());
    }

    #[test]
    fn test_log_path() {
        let branch = BranchName::new("release/1.x").unwrap();
        let path = branch.log_path(Path::new("/srv/git/p.git"));
        assert_eq!(
            path,
            Path::new("/srv/git/p.git")
                .join("logs")
                .join("refs")
                .join("heads")
                .join("release")
                .join("1.x")
        );
    }

    #[test]
    fn test_entry_mode_roundtrip() {
        for mode in [
            EntryMode::Blob,
            EntryMode::Executable,
            EntryMode::Tree,
            EntryMode::Link,
            EntryMode::Commit,
        ] {
            assert_eq!(EntryMode::from_raw(mode.as_raw()), Some(mode));
        }
        assert_eq!(EntryMode::from_raw(0o777), None);
        assert!(!EntryMode::Tree.is_blob());
    }

    #[test]
    fn test_commit_id_short_and_serialize() {
        let id = CommitId::from_hex("0123456789abcdef0123456789abcdef01234567").unwrap();
        assert_eq!(id.short(), "0123456");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"0123456789abcdef0123456789abcdef01234567\""
        );
    }
}
