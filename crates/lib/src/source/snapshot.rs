use super::{CatalogSource, GitSource, PathSource, ResolveError, SourceConfig};
use crate::loader::{ContentLoader, LoadError};
use crate::version::{IntegrationVersion, Origin};

/// Tagged history merged with the working tree.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
  git: GitSource,
  path: PathSource,
}

impl SnapshotSource {
  pub fn new(config: SourceConfig) -> Self {
    Self {
      git: GitSource::new(config.clone()),
      path: PathSource::new(config),
    }
  }
}

impl CatalogSource for SnapshotSource {
  fn load_integrations(&self) -> Result<Vec<IntegrationVersion>, ResolveError> {
    let mut versions = self.git.load_integrations()?;
    versions.extend(self.path.load_integrations()?);
    Ok(versions)
  }

  fn loader_for(&self, version: &IntegrationVersion) -> Result<Box<dyn ContentLoader>, LoadError> {
    match version.origin {
      Origin::Historical => self.git.loader_for(version),
      Origin::WorkingTree => self.path.loader_for(version),
    }
  }
}
