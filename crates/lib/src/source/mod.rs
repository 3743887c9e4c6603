//! Discovering which integration versions exist.
//!
//! A [`CatalogSource`] lists versions and hands out the [`ContentLoader`] that
//! reads each one:
//! - [`GitSource`]: one version per matching tag, read from history
//! - [`PathSource`]: one synthetic version per directory on disk
//! - [`SnapshotSource`]: both, dispatching on [`Origin`]

mod git;
mod path;
mod snapshot;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::consts::DEFAULT_INTEGRATIONS_DIR;
use crate::loader::{ContentLoader, LoadError};
use crate::version::{IntegrationVersion, Origin};

pub use git::GitSource;
pub use path::PathSource;
pub use snapshot::SnapshotSource;

/// Location of the integrations inside a repository checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
  pub repo_dir: PathBuf,
  /// Directory under `repo_dir` holding `<namespace>/<name>/` trees.
  pub integrations_dir_name: String,
}

impl SourceConfig {
  pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
    Self {
      repo_dir: repo_dir.into(),
      integrations_dir_name: DEFAULT_INTEGRATIONS_DIR.to_string(),
    }
  }

  pub fn with_integrations_dir(mut self, name: impl Into<String>) -> Self {
    self.integrations_dir_name = name.into();
    self
  }

  pub fn integrations_dir(&self) -> PathBuf {
    self.repo_dir.join(&self.integrations_dir_name)
  }

  /// Repository-relative path of one integration, with forward slashes.
  pub fn integration_prefix(&self, namespace: &str, name: &str) -> String {
    format!(
      "{}/{}/{}",
      self.integrations_dir_name.trim_end_matches('/'),
      namespace,
      name
    )
  }
}

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("failed to open repository at '{path}': {source}")]
  OpenRepository {
    path: PathBuf,
    #[source]
    source: Box<gix::open::Error>,
  },

  #[error("failed to list tags in '{path}': {source}")]
  ListTags {
    path: PathBuf,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("failed to list integrations directory '{path}': {source}")]
  ListDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Where integration versions come from.
pub trait CatalogSource: Send + Sync {
  /// Every version this source knows about, in discovery order.
  fn load_integrations(&self) -> Result<Vec<IntegrationVersion>, ResolveError>;

  /// A loader reading the files of `version`.
  fn loader_for(&self, version: &IntegrationVersion) -> Result<Box<dyn ContentLoader>, LoadError>;
}

/// Which versions a build should consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
  /// Tagged releases only.
  Git,
  /// The working tree only.
  Path,
  /// Tagged releases plus the working tree.
  Snapshot,
}

impl SourceMode {
  pub fn open(self, config: SourceConfig) -> Box<dyn CatalogSource> {
    match self {
      SourceMode::Git => Box::new(GitSource::new(config)),
      SourceMode::Path => Box::new(PathSource::new(config)),
      SourceMode::Snapshot => Box::new(SnapshotSource::new(config)),
    }
  }
}

fn list_dirs(path: &Path) -> Result<Vec<String>, ResolveError> {
  let list_error = |source| ResolveError::ListDir {
    path: path.to_path_buf(),
    source,
  };

  let mut names = Vec::new();
  for entry in std::fs::read_dir(path).map_err(list_error)? {
    let entry = entry.map_err(list_error)?;
    if !entry.file_type().map_err(list_error)?.is_dir() {
      continue;
    }
    if let Some(name) = entry.file_name().to_str() {
      names.push(name.to_string());
    }
  }
  names.sort();
  Ok(names)
}

fn origin_mismatch(version: &IntegrationVersion, expected: Origin) -> LoadError {
  LoadError::OriginMismatch {
    version: version.to_string(),
    actual: version.origin,
    expected,
  }
}
