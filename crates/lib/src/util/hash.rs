//! Content addressing of rendered trees.
//!
//! - `ContentHash`: a full 64-character hex SHA-256
//! - `checksum()`: digest of a directory's `(relative path, content)` pairs
//! - `hash_file()`: single file hashing
//! - `hash_bytes()`: arbitrary byte hashing

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// A full 64-character SHA-256, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl AsRef<str> for ContentHash {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
  #[error("failed to walk directory '{path}': {source}")]
  WalkDir {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("failed to read file '{path}': {source}")]
  ReadFile {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("path '{0}' is not valid UTF-8")]
  NonUtf8Path(PathBuf),
}

/// Compute the digest of every regular file under `tree`.
///
/// Each file contributes `<relative path>\0<hex sha256 of content>\n`, with
/// the path using forward slashes. Entries are sorted by path before the
/// combined SHA-256 is taken, so the result depends only on file names and
/// contents. Directories, symlinks and metadata are ignored.
pub fn checksum(tree: &Path) -> Result<ContentHash, ChecksumError> {
  let mut entries: Vec<(String, ContentHash)> = Vec::new();

  for entry in WalkDir::new(tree) {
    let entry = entry.map_err(|source| ChecksumError::WalkDir {
      path: tree.to_path_buf(),
      source,
    })?;
    if !entry.file_type().is_file() {
      continue;
    }

    let rel_path = entry.path().strip_prefix(tree).unwrap_or(entry.path());
    let rel_path = rel_path
      .components()
      .map(|c| c.as_os_str().to_str())
      .collect::<Option<Vec<_>>>()
      .ok_or_else(|| ChecksumError::NonUtf8Path(entry.path().to_path_buf()))?
      .join("/");

    entries.push((rel_path, hash_file(entry.path())?));
  }

  entries.sort_by(|a, b| a.0.cmp(&b.0));

  let mut hasher = Sha256::new();
  for (rel_path, content_hash) in &entries {
    hasher.update(rel_path.as_bytes());
    hasher.update(b"\0");
    hasher.update(content_hash.0.as_bytes());
    hasher.update(b"\n");
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> Result<ContentHash, ChecksumError> {
  let read_error = |source| ChecksumError::ReadFile {
    path: path.to_path_buf(),
    source,
  };
  let mut file = fs::File::open(path).map_err(read_error)?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(read_error)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  ContentHash(hex::encode(Sha256::digest(data)))
}
