use tracing::info;

use super::{CatalogSource, ResolveError, SourceConfig, list_dirs, origin_mismatch};
use crate::loader::{ContentLoader, LoadError, WorkingTreeLoader};
use crate::version::{IntegrationVersion, Origin};

/// Every `<namespace>/<name>` directory of the working tree, as one synthetic version each.
#[derive(Debug, Clone)]
pub struct PathSource {
  config: SourceConfig,
}

impl PathSource {
  pub fn new(config: SourceConfig) -> Self {
    Self { config }
  }
}

impl CatalogSource for PathSource {
  fn load_integrations(&self) -> Result<Vec<IntegrationVersion>, ResolveError> {
    let root = self.config.integrations_dir();
    let mut versions = Vec::new();

    for namespace in list_dirs(&root)? {
      for name in list_dirs(&root.join(&namespace))? {
        let dir = root.join(&namespace).join(&name);
        let version = IntegrationVersion::working_tree(&namespace, &name, &dir.to_string_lossy());
        info!(
          namespace = %version.namespace,
          name = %version.name,
          version = %version.semver(),
          origin = %version.origin,
          "found integration version"
        );
        versions.push(version);
      }
    }

    Ok(versions)
  }

  fn loader_for(&self, version: &IntegrationVersion) -> Result<Box<dyn ContentLoader>, LoadError> {
    if version.origin != Origin::WorkingTree {
      return Err(origin_mismatch(version, Origin::WorkingTree));
    }
    let dir = self
      .config
      .integrations_dir()
      .join(&version.namespace)
      .join(&version.name);
    Ok(Box::new(WorkingTreeLoader::new(dir)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consts::WORKING_TREE_MAJOR;
  use crate::loader::fixtures::write_integration;
  use tempfile::TempDir;

  #[test]
  fn one_version_per_directory() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("integrations");
    write_integration(&root.join("acme/widget"), "acme", "widget");
    write_integration(&root.join("acme/gadget"), "acme", "gadget");
    write_integration(&root.join("zeta/probe"), "zeta", "probe");
    std::fs::write(root.join("README.md"), "ignored").unwrap();
    std::fs::write(root.join("acme/NOTES.md"), "ignored").unwrap();

    let source = PathSource::new(SourceConfig::new(temp.path()));
    let versions = source.load_integrations().unwrap();

    let ids: Vec<_> = versions.iter().map(|v| format!("{}/{}", v.namespace, v.name)).collect();
    assert_eq!(ids, vec!["acme/gadget", "acme/widget", "zeta/probe"]);
    assert!(versions.iter().all(|v| v.major == WORKING_TREE_MAJOR && v.origin == Origin::WorkingTree));

    let loader = source.loader_for(&versions[1]).unwrap();
    assert_eq!(loader.load_config().unwrap().metadata.name, "widget");
  }

  #[test]
  fn custom_integrations_dir() {
    let temp = TempDir::new().unwrap();
    write_integration(&temp.path().join("catalog/acme/widget"), "acme", "widget");

    let source = PathSource::new(SourceConfig::new(temp.path()).with_integrations_dir("catalog"));
    assert_eq!(source.load_integrations().unwrap().len(), 1);
  }

  #[test]
  fn missing_integrations_dir_is_an_error() {
    let temp = TempDir::new().unwrap();
    let source = PathSource::new(SourceConfig::new(temp.path()));
    assert!(matches!(source.load_integrations(), Err(ResolveError::ListDir { .. })));
  }
}
