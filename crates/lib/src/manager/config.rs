use std::path::PathBuf;

use thiserror::Error;

/// Output locations of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
  /// Parent of the scratch trees each build renders into.
  pub staging_dir: PathBuf,
  /// Directory receiving `<digest>/` releases and `version.json`.
  pub release_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("staging dir must not be empty")]
  EmptyStagingDir,

  #[error("release dir must not be empty")]
  EmptyReleaseDir,
}

impl ManagerConfig {
  /// Conventional `staging/` + `release/` layout under one working directory.
  pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
    let dir = dir.into();
    Self {
      staging_dir: dir.join("staging"),
      release_dir: dir.join("release"),
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.staging_dir.as_os_str().is_empty() {
      return Err(ConfigError::EmptyStagingDir);
    }
    if self.release_dir.as_os_str().is_empty() {
      return Err(ConfigError::EmptyReleaseDir);
    }
    Ok(())
  }
}
