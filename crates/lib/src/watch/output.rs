use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;

use crate::manager::{BuildError, ManagerConfig};
use crate::release::Release;
use crate::util::fs::replace_symlink;

#[derive(Debug, Error)]
pub enum RebuildError {
  #[error("failed to create output directory in '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error("failed to point '{link}' at the new release: {source}")]
  Link {
    link: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("rebuild task panicked: {0}")]
  Join(#[source] tokio::task::JoinError),
}

/// Build outputs under one root, with a stable `current` link to the latest.
///
/// Each build gets its own temporary directory holding `staging/` and
/// `release/`. `current` always points at the `release/` of the newest
/// successful build; older build directories are removed once replaced.
#[derive(Debug)]
pub struct LiveOutput {
  root: PathBuf,
  link: PathBuf,
  active: Option<TempDir>,
}

impl LiveOutput {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    Self {
      link: root.join("current"),
      root,
      active: None,
    }
  }

  /// The stable path to serve from.
  pub fn link(&self) -> &Path {
    &self.link
  }

  /// Directory of the build `current` points at, if any build succeeded.
  pub fn active_dir(&self) -> Option<&Path> {
    self.active.as_ref().map(TempDir::path)
  }

  /// Run `build` into a fresh directory and make it current on success.
  pub fn rebuild<F>(&mut self, build: F) -> Result<Release, RebuildError>
  where
    F: FnOnce(ManagerConfig) -> Result<Release, BuildError>,
  {
    std::fs::create_dir_all(&self.root).map_err(|source| RebuildError::CreateDir {
      path: self.root.clone(),
      source,
    })?;
    let dir = tempfile::Builder::new()
      .prefix("build-")
      .tempdir_in(&self.root)
      .map_err(|source| RebuildError::CreateDir {
        path: self.root.clone(),
        source,
      })?;

    let config = ManagerConfig::in_dir(dir.path());
    let release = build(config.clone())?;

    replace_symlink(&config.release_dir, &self.link).map_err(|source| RebuildError::Link {
      link: self.link.clone(),
      source,
    })?;

    if let Some(previous) = self.active.replace(dir) {
      debug!(path = %previous.path().display(), "removing previous build");
    }
    Ok(release)
  }
}
