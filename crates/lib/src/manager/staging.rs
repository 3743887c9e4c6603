use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::TempDir;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
  #[error("failed to create '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to serialize '{path}': {source}")]
  Serialize {
    path: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to write '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Scratch directory receiving one file per rendered endpoint.
///
/// Every tree is a fresh directory under the configured staging location and
/// is removed when dropped, so a failed or repeated build never sees leftovers.
#[derive(Debug)]
pub struct StagingTree {
  dir: TempDir,
}

impl StagingTree {
  pub fn create_in(parent: &Path) -> Result<Self, RenderError> {
    let create_error = |source| RenderError::CreateDir {
      path: parent.to_path_buf(),
      source,
    };
    fs::create_dir_all(parent).map_err(create_error)?;
    let dir = tempfile::Builder::new()
      .prefix("render-")
      .tempdir_in(parent)
      .map_err(create_error)?;
    Ok(Self { dir })
  }

  pub fn root(&self) -> &Path {
    self.dir.path()
  }

  /// Write `value` as compact JSON at the release-relative `path`.
  pub fn write_json<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<(), RenderError> {
    let bytes = serde_json::to_vec(value).map_err(|source| RenderError::Serialize {
      path: path.to_string(),
      source,
    })?;
    self.write_raw(path, &bytes)
  }

  pub fn write_raw(&self, path: &str, bytes: &[u8]) -> Result<(), RenderError> {
    let full = self.root().join(path);
    if let Some(parent) = full.parent() {
      fs::create_dir_all(parent).map_err(|source| RenderError::CreateDir {
        path: parent.to_path_buf(),
        source,
      })?;
    }
    fs::write(&full, bytes).map_err(|source| RenderError::Write { path: full, source })
  }
}
