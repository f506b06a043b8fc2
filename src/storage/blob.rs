//! Blob operations for raw content storage.
//!
//! A persisted reflog is stored verbatim as a single blob. Nothing is
//! parsed or re-encoded on the way in, so the blob id depends only on the
//! bytes of the local log file.

use git2::Repository;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::BlobId;

/// write raw bytes as a blob to the repository
///
/// returns the blob ID (SHA-1 hash of the content)
pub fn write_blob(repo: &Repository, bytes: &[u8]) -> StorageResult<BlobId> {
    let oid = repo.blob(bytes)?;
    Ok(BlobId::new(oid))
}

/// read a blob's content from the repository
pub fn read_blob(repo: &Repository, blob_id: BlobId) -> StorageResult<Vec<u8>> {
    let blob = repo
        .find_blob(blob_id.raw())
        .map_err(|_| StorageError::ObjectNotFound {
            kind: "blob",
            id: blob_id.to_string(),
        })?;
    Ok(blob.content().to_vec())
}
