//! Promotion of a staging tree into an immutable, digest-named release.
//!
//! ```text
//! <release_dir>/
//!   version.json        {"release_digest": "...", "last_updated": 1700000000}
//!   <digest>/v1/...     one directory per published digest, never modified
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, info};

use crate::api::catalog::ReleasePointer;
use crate::consts::VERSION_POINTER_FILENAME;
use crate::util::fs::{copy_dir_all, write_atomic};
use crate::util::hash::{ChecksumError, ContentHash, checksum};

#[derive(Debug, Error)]
pub enum PublishError {
  #[error("failed to checksum staging tree: {0}")]
  Checksum(#[from] ChecksumError),

  #[error("failed to create release directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to copy '{from}' to '{to}': {source}")]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to serialize release pointer: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to write release pointer '{path}': {source}")]
  WritePointer {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// A published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
  pub digest: ContentHash,
  /// `<release_dir>/<digest>`
  pub path: PathBuf,
}

/// Copy `staging` into `<release_dir>/<digest>` and repoint `version.json` at it.
///
/// The staging tree is left untouched. Publishing content that already has a
/// release only refreshes the pointer's timestamp.
pub fn publish(staging: &Path, release_dir: &Path) -> Result<Release, PublishError> {
  let digest = checksum(staging)?;
  let path = release_dir.join(digest.as_ref());

  fs::create_dir_all(release_dir).map_err(|source| PublishError::CreateDir {
    path: release_dir.to_path_buf(),
    source,
  })?;

  if path.is_dir() {
    debug!(digest = %digest, "release already exists");
  } else {
    // Copy next to the final location first so a partial copy is never visible under the digest.
    let incoming = tempfile::Builder::new()
      .prefix(".incoming-")
      .tempdir_in(release_dir)
      .map_err(|source| PublishError::CreateDir {
        path: release_dir.to_path_buf(),
        source,
      })?;
    let copy_error = |source| PublishError::Copy {
      from: staging.to_path_buf(),
      to: path.clone(),
      source,
    };
    copy_dir_all(staging, incoming.path()).map_err(copy_error)?;
    fs::rename(incoming.path(), &path).map_err(copy_error)?;
    info!(digest = %digest, path = %path.display(), "published release");
  }

  write_pointer(release_dir, &digest)?;

  Ok(Release { digest, path })
}

/// Read the current `version.json`, if any.
pub fn read_pointer(release_dir: &Path) -> Option<ReleasePointer> {
  let content = fs::read(release_dir.join(VERSION_POINTER_FILENAME)).ok()?;
  serde_json::from_slice(&content).ok()
}

fn write_pointer(release_dir: &Path, digest: &ContentHash) -> Result<(), PublishError> {
  let last_updated = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs())
    .unwrap_or(0);
  let pointer = ReleasePointer {
    release_digest: digest.0.clone(),
    last_updated,
  };

  let path = release_dir.join(VERSION_POINTER_FILENAME);
  let content = serde_json::to_vec(&pointer).map_err(PublishError::Serialize)?;
  write_atomic(&path, &content).map_err(|source| PublishError::WritePointer { path, source })
}
