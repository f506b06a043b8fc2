//! Local reflog snapshots.
//!
//! The reflog file is append-only plain text with one head movement per
//! line. Lines are opaque: they are only ever compared for equality.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::storage::StorageResult;

/// number of trailing lines the consistency check looks at
pub const TAIL_LEN: usize = 2;

/// Full content of a reflog, as read from disk or from a persisted blob.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReflogSnapshot {
    bytes: Vec<u8>,
    lines: Vec<String>,
}

impl ReflogSnapshot {
    /// Read a local reflog file.
    ///
    /// A missing file yields an empty snapshot: a branch that is being
    /// created has no log yet when the update hook runs.
    pub fn read_all(path: &Path) -> StorageResult<Self> {
        match fs::read(path) {
            Ok(bytes) => Ok(Self::from_bytes(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "reflog file missing, treating as empty");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Build a snapshot from raw content.
    ///
    /// The bytes are kept verbatim for persistence; invalid UTF-8 is only
    /// replaced in the line view used for comparison.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let lines = split_lines(&bytes);
        Self { bytes, lines }
    }

    /// raw content
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// all entries in order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// up to `n` last lines, oldest first
    pub fn tail(&self, n: usize) -> Tail {
        let start = self.lines.len().saturating_sub(n);
        Tail(self.lines[start..].to_vec())
    }
}

/// A newline terminates a line; it never starts an empty trailing one.
fn split_lines(bytes: &[u8]) -> Vec<String> {
    if bytes.is_empty() {
        return Vec::new();
    }
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    body.split(|b| *b == b'\n')
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect()
}

/// The last few lines of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tail(Vec<String>);

impl Tail {
    pub fn new(lines: Vec<String>) -> Self {
        Self(lines)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// most recent entry
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// entry just before the most recent one
    pub fn second_to_last(&self) -> Option<&str> {
        self.0.len().checked_sub(2).map(|i| self.0[i].as_str())
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_lines() {
        assert!(ReflogSnapshot::from_bytes(Vec::new()).is_empty());
        assert_eq!(ReflogSnapshot::from_bytes(b"A\nB\n".to_vec()).lines(), ["A", "B"]);
        assert_eq!(ReflogSnapshot::from_bytes(b"A\nB".to_vec()).lines(), ["A", "B"]);
        assert_eq!(ReflogSnapshot::from_bytes(b"\n".to_vec()).lines(), [""]);
        assert_eq!(ReflogSnapshot::from_bytes(b"A\n\nB\n".to_vec()).lines(), ["A", "", "B"]);
    }

    #[test]
    fn test_carriage_return_is_part_of_line() {
        let snapshot = ReflogSnapshot::from_bytes(b"A\r\nB\r\n".to_vec());
        assert_eq!(snapshot.lines(), ["A\r", "B\r"]);
    }

    #[test]
    fn test_bytes_kept_verbatim() {
        let raw = b"caf\xe9\nB\n".to_vec();
        let snapshot = ReflogSnapshot::from_bytes(raw.clone());
        assert_eq!(snapshot.bytes(), raw.as_slice());
        assert_eq!(snapshot.lines()[0], "caf\u{fffd}");
    }

    #[test]
    fn test_tail() {
        let snapshot = ReflogSnapshot::from_bytes(b"A\nB\nC\n".to_vec());
        let tail = snapshot.tail(TAIL_LEN);
        assert_eq!(tail.lines(), ["B", "C"]);
        assert_eq!(tail.last(), Some("C"));
        assert_eq!(tail.second_to_last(), Some("B"));

        let short = ReflogSnapshot::from_bytes(b"X\n".to_vec()).tail(TAIL_LEN);
        assert_eq!(short.len(), 1);
        assert_eq!(short.last(), Some("X"));
        assert_eq!(short.second_to_last(), None);

        let empty = ReflogSnapshot::default().tail(TAIL_LEN);
        assert!(empty.is_empty());
        assert_eq!(empty.last(), None);
    }

    #[test]
    fn test_read_all() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main");
        fs::write(&path, b"A\nB\n").unwrap();

        let snapshot = ReflogSnapshot::read_all(&path).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.bytes(), b"A\nB\n");
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let snapshot = ReflogSnapshot::read_all(&dir.path().join("missing")).unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.bytes().is_empty());
    }

    #[test]
    fn test_read_directory_fails() {
        let dir = TempDir::new().unwrap();
        assert!(ReflogSnapshot::read_all(dir.path()).is_err());
    }
}
