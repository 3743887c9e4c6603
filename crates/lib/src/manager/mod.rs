//! Rendering the static API.
//!
//! [`CatalogManager::build`] renders every endpoint into a staging tree and
//! publishes it, stopping at the first failure. [`validate`] walks the same
//! versions through the same loading routine but records every failure before
//! reporting; it only needs a source, never output locations.

mod config;
pub mod endpoints;
mod staging;

use std::fmt;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::api::catalog::{Catalog, IntegrationVersionView, IntegrationWithVersions, NamespaceIndex};
use crate::api::{Integration, Resources};
use crate::loader::{ContentLoader, Images, LoadError};
use crate::release::{PublishError, Release, publish};
use crate::source::{CatalogSource, ResolveError};
use crate::version::{IntegrationVersion, NamespacedIntegrations, latest_version};

pub use config::{ConfigError, ManagerConfig};
pub use staging::{RenderError, StagingTree};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("invalid manager config: {0}")]
  Config(#[from] ConfigError),

  #[error("failed to resolve integration versions: {0}")]
  Resolve(#[from] ResolveError),

  #[error("failed to load {version}: {source}")]
  Load {
    version: String,
    #[source]
    source: LoadError,
  },

  #[error("failed to render endpoint: {0}")]
  Render(#[from] RenderError),

  #[error("failed to publish release: {0}")]
  Publish(#[from] PublishError),
}

impl BuildError {
  fn load(version: &IntegrationVersion, source: LoadError) -> Self {
    BuildError::Load {
      version: version.to_string(),
      source,
    }
  }
}

/// One integration version that could not be loaded or failed validation.
#[derive(Debug)]
pub struct ValidationFailure {
  pub namespace: String,
  pub name: String,
  pub version: String,
  pub error: LoadError,
}

impl fmt::Display for ValidationFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}:{}: {}", self.namespace, self.name, self.version, self.error)
  }
}

#[derive(Debug, Error)]
pub enum ValidateError {
  #[error("failed to resolve integration versions: {0}")]
  Resolve(#[from] ResolveError),

  #[error("{} of {checked} integration versions failed validation", failures.len())]
  Failed {
    checked: usize,
    failures: Vec<ValidationFailure>,
  },
}

/// Outcome of a clean validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationReport {
  pub checked: usize,
}

/// Everything read for one integration version.
#[derive(Debug)]
pub struct VersionContent {
  pub config: Integration,
  pub resources: Resources,
  pub logo: Option<Vec<u8>>,
  pub readme: Option<Vec<u8>>,
  pub changelog: Option<Vec<u8>>,
  pub images: Images,
}

pub struct CatalogManager {
  config: ManagerConfig,
  source: Box<dyn CatalogSource>,
}

impl CatalogManager {
  pub fn new(config: ManagerConfig, source: Box<dyn CatalogSource>) -> Result<Self, ConfigError> {
    config.validate()?;
    Ok(Self { config, source })
  }

  pub fn config(&self) -> &ManagerConfig {
    &self.config
  }

  /// Every known version, grouped by namespace and name.
  pub fn integrations(&self) -> Result<NamespacedIntegrations, ResolveError> {
    Ok(self.source.load_integrations()?.into_iter().collect())
  }

  /// Load and validate every artifact of one version.
  pub fn load_version(&self, version: &IntegrationVersion) -> Result<VersionContent, LoadError> {
    load_version(self.source.as_ref(), version)
  }

  /// Render every endpoint and publish the result as a new release.
  ///
  /// The first error aborts the build; nothing is published in that case.
  pub fn build(&self) -> Result<Release, BuildError> {
    let integrations = self.integrations()?;
    let staging = StagingTree::create_in(&self.config.staging_dir)?;
    let mut catalog = Catalog::default();

    for (namespace, versioned) in integrations.iter() {
      let mut names = Vec::new();

      for (name, versions) in versioned {
        for version in versions {
          let content = self.load_version(version).map_err(|e| BuildError::load(version, e))?;
          render_version(&staging, version, &content)?;
          debug!(%namespace, %name, version = %version.semver(), "rendered integration version");
        }

        let Some(latest) = latest_version(versions) else {
          continue;
        };
        let config = self
          .source
          .loader_for(latest)
          .and_then(|loader| loader.load_config())
          .map_err(|e| BuildError::load(latest, e))?;

        let mut sorted: Vec<&IntegrationVersion> = versions.iter().collect();
        sorted.sort_by(|a, b| a.cmp_precedence(b));
        let semvers: Vec<String> = sorted.iter().map(|v| v.semver()).collect();

        staging.write_json(&endpoints::versions(namespace, name), &semvers)?;
        staging.write_json(
          &endpoints::integration(namespace, name),
          &IntegrationWithVersions {
            integration: config.clone(),
            versions: semvers,
          },
        )?;

        catalog
          .namespaced_integrations
          .entry(namespace.clone())
          .or_default()
          .push(IntegrationVersionView {
            integration: config.summary(),
            version: latest.semver(),
          });
        names.push(name.clone());
      }

      staging.write_json(
        &endpoints::namespace(namespace),
        &NamespaceIndex {
          name: namespace.clone(),
          integrations: names,
        },
      )?;
    }

    staging.write_json(&endpoints::catalog(), &catalog)?;

    let release = publish(staging.root(), &self.config.release_dir)?;
    info!(
      digest = %release.digest,
      path = %release.path.display(),
      versions = integrations.version_count(),
      "build complete"
    );
    Ok(release)
  }

  /// Load every version and report all failures together.
  pub fn validate(&self) -> Result<ValidationReport, ValidateError> {
    validate(self.source.as_ref())
  }
}

/// Load and validate every artifact of one version.
///
/// Logo, README and CHANGELOG are optional; a missing or empty resource
/// manifest yields no resources.
pub fn load_version(source: &dyn CatalogSource, version: &IntegrationVersion) -> Result<VersionContent, LoadError> {
  let loader = source.loader_for(version)?;

  let config = loader.load_config()?;
  let resources = match loader.load_resources() {
    Ok(resources) => resources,
    Err(LoadError::NotFound(_) | LoadError::EmptyResources(_)) => Resources::new(),
    Err(err) => return Err(err),
  };

  Ok(VersionContent {
    config,
    resources,
    logo: optional(loader.load_logo())?,
    readme: optional(loader.load_readme())?,
    changelog: optional(loader.load_changelog())?,
    images: loader.load_images()?,
  })
}

/// Load every version of `source` and report all failures together.
///
/// Nothing is rendered, so no output locations are needed.
pub fn validate(source: &dyn CatalogSource) -> Result<ValidationReport, ValidateError> {
  let integrations: NamespacedIntegrations = source.load_integrations()?.into_iter().collect();
  let mut failures = Vec::new();
  let mut checked = 0;

  for (namespace, versioned) in integrations.iter() {
    for (name, versions) in versioned {
      for version in versions {
        checked += 1;
        if let Err(err) = load_version(source, version) {
          error!(%namespace, %name, version = %version.semver(), error = %err, "integration failed validation");
          failures.push(ValidationFailure {
            namespace: namespace.clone(),
            name: name.clone(),
            version: version.semver(),
            error: err,
          });
        }
      }
    }
  }

  if failures.is_empty() {
    info!(checked, "all integrations are valid");
    Ok(ValidationReport { checked })
  } else {
    Err(ValidateError::Failed { checked, failures })
  }
}

fn render_version(
  staging: &StagingTree,
  version: &IntegrationVersion,
  content: &VersionContent,
) -> Result<(), RenderError> {
  staging.write_json(
    &endpoints::version(version),
    &IntegrationVersionView {
      integration: content.config.clone(),
      version: version.semver(),
    },
  )?;
  staging.write_json(&endpoints::resources(version), &content.resources)?;

  if let Some(logo) = &content.logo {
    staging.write_raw(&endpoints::logo(version), logo)?;
  }
  if let Some(readme) = &content.readme {
    staging.write_raw(&endpoints::readme(version), readme)?;
  }
  if let Some(changelog) = &content.changelog {
    staging.write_raw(&endpoints::changelog(version), changelog)?;
  }
  for (file, bytes) in &content.images {
    staging.write_raw(&endpoints::image(version, file), bytes)?;
  }
  Ok(())
}

fn optional(result: Result<Vec<u8>, LoadError>) -> Result<Option<Vec<u8>>, LoadError> {
  match result {
    Ok(bytes) => Ok(Some(bytes)),
    Err(err) if err.is_not_found() => Ok(None),
    Err(err) => Err(err),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;
  use std::path::Path;

  use tempfile::TempDir;
  use tracing_test::traced_test;

  use crate::loader::fixtures::config;
  use crate::version::{ResolvedTag, resolve_tag};

  type Files = HashMap<String, Vec<u8>>;

  struct MemoryLoader(Files);

  impl ContentLoader for MemoryLoader {
    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>, LoadError> {
      Ok(self.0.get(path).cloned())
    }

    fn list_files(&self, dir: &str) -> Result<Option<Vec<String>>, LoadError> {
      let prefix = format!("{dir}/");
      let mut names: Vec<String> = self
        .0
        .keys()
        .filter_map(|path| path.strip_prefix(&prefix))
        .filter(|rest| !rest.contains('/'))
        .map(str::to_string)
        .collect();
      if names.is_empty() {
        return Ok(None);
      }
      names.sort();
      Ok(Some(names))
    }
  }

  #[derive(Default)]
  struct MemorySource {
    versions: Vec<(IntegrationVersion, Files)>,
  }

  impl MemorySource {
    /// Add a version whose config has the given short description, plus extra files.
    fn with(mut self, tag: &str, short_description: &str, extra: &[(&str, &[u8])]) -> Self {
      let ResolvedTag::Matched(version) = resolve_tag(tag, "memory").unwrap() else {
        panic!("test tag {tag} should match");
      };
      let mut files = Files::new();
      files.insert(
        "sensu-integration.yaml".to_string(),
        config(&version.namespace, &version.name, short_description).into_bytes(),
      );
      for (path, bytes) in extra {
        files.insert(path.to_string(), bytes.to_vec());
      }
      self.versions.push((version, files));
      self
    }

    /// Add a version with raw files only.
    fn with_files(mut self, tag: &str, files: &[(&str, &[u8])]) -> Self {
      let ResolvedTag::Matched(version) = resolve_tag(tag, "memory").unwrap() else {
        panic!("test tag {tag} should match");
      };
      let files = files.iter().map(|(p, b)| (p.to_string(), b.to_vec())).collect();
      self.versions.push((version, files));
      self
    }
  }

  impl CatalogSource for MemorySource {
    fn load_integrations(&self) -> Result<Vec<IntegrationVersion>, ResolveError> {
      Ok(self.versions.iter().map(|(v, _)| v.clone()).collect())
    }

    fn loader_for(&self, version: &IntegrationVersion) -> Result<Box<dyn ContentLoader>, LoadError> {
      self
        .versions
        .iter()
        .find(|(v, _)| v == version)
        .map(|(_, files)| Box::new(MemoryLoader(files.clone())) as Box<dyn ContentLoader>)
        .ok_or_else(|| LoadError::NotFound(version.to_string()))
    }
  }

  const RESOURCES: &[u8] = b"type: CheckConfig\napi_version: core/v2\n---\ntype: Handler\napi_version: core/v2\n";

  fn manager(temp: &TempDir, source: MemorySource) -> CatalogManager {
    CatalogManager::new(ManagerConfig::in_dir(temp.path()), Box::new(source)).unwrap()
  }

  fn read_json(root: &Path, rel: &str) -> serde_json::Value {
    let bytes = std::fs::read(root.join(rel)).unwrap_or_else(|e| panic!("{rel}: {e}"));
    serde_json::from_slice(&bytes).unwrap()
  }

  #[test]
  fn build_renders_every_endpoint() {
    let temp = TempDir::new().unwrap();
    let source = MemorySource::default()
      .with(
        "acme/widget/1.2.3",
        "old",
        &[
          ("sensu-resources.yaml", RESOURCES),
          ("logo.png", b"png"),
          ("README.md", b"# widget"),
          ("CHANGELOG.md", b"## 1.2.3"),
          ("img/diagram.png", b"diagram"),
          ("img/notes.txt", b"notes"),
        ],
      )
      .with("acme/widget/1.3.0", "new", &[("README.md", b"# widget 1.3")])
      .with("acme/gadget/0.1.0", "gadget", &[])
      .with("zeta/probe/2.0.0", "probe", &[]);

    let manager = manager(&temp, source);
    let release = manager.build().unwrap();
    let root = release.path.as_path();

    let widget = read_json(root, "v1/acme/widget.json");
    assert_eq!(widget["versions"], serde_json::json!(["1.2.3", "1.3.0"]));
    assert_eq!(widget["short_description"], "new");
    assert!(widget.get("prompts").is_some());
    assert_eq!(
      read_json(root, "v1/acme/widget/versions.json"),
      serde_json::json!(["1.2.3", "1.3.0"])
    );

    let old = read_json(root, "v1/acme/widget/1.2.3.json");
    assert_eq!(old["version"], "1.2.3");
    assert_eq!(old["short_description"], "old");

    let resources = read_json(root, "v1/acme/widget/1.2.3/sensu-resources.json");
    assert_eq!(resources.as_array().map(Vec::len), Some(2));
    assert_eq!(
      read_json(root, "v1/acme/gadget/0.1.0/sensu-resources.json"),
      serde_json::json!([])
    );

    assert!(root.join("v1/acme/widget/1.2.3/logo.png").is_file());
    assert!(root.join("v1/acme/widget/1.2.3/CHANGELOG.md").is_file());
    assert!(root.join("v1/acme/widget/1.2.3/img/diagram.png").is_file());
    assert!(!root.join("v1/acme/widget/1.2.3/img/notes.txt").exists());
    assert!(!root.join("v1/acme/widget/1.3.0/logo.png").exists());
    assert_eq!(
      std::fs::read_to_string(root.join("v1/acme/widget/1.3.0/README.md")).unwrap(),
      "# widget 1.3"
    );

    assert_eq!(
      read_json(root, "v1/acme.json"),
      serde_json::json!({"name": "acme", "integrations": ["gadget", "widget"]})
    );

    let catalog: Catalog = serde_json::from_value(read_json(root, "v1/catalog.json")).unwrap();
    assert_eq!(
      catalog.namespaced_integrations.keys().collect::<Vec<_>>(),
      vec!["acme", "zeta"]
    );
    let latest = catalog.get("acme", "widget").unwrap();
    assert_eq!(latest.version, "1.3.0");
    assert!(latest.integration.prompts.is_empty());
    let raw_catalog = std::fs::read_to_string(root.join("v1/catalog.json")).unwrap();
    assert!(!raw_catalog.contains("prompts"));

    let pointer = crate::release::read_pointer(&manager.config().release_dir).unwrap();
    assert_eq!(pointer.release_digest, release.digest.0);
  }

  #[test]
  fn build_fails_fast_and_publishes_nothing() {
    let temp = TempDir::new().unwrap();
    let source = MemorySource::default()
      .with("acme/widget/1.0.0", "fine", &[])
      .with("acme/widget/1.1.0", "", &[])
      .with("zeta/probe/1.0.0", "fine", &[]);

    let manager = manager(&temp, source);
    let err = manager.build().unwrap_err();

    match err {
      BuildError::Load { version, source } => {
        assert_eq!(version, "acme/widget:1.1.0");
        assert!(matches!(source, LoadError::Validation { .. }));
      }
      other => panic!("unexpected error: {other}"),
    }
    assert!(!manager.config().release_dir.exists());
  }

  #[test]
  fn build_with_missing_config_fails() {
    let temp = TempDir::new().unwrap();
    let source = MemorySource::default().with_files("acme/widget/1.0.0", &[("README.md", b"docs")]);

    let err = manager(&temp, source).build().unwrap_err();
    assert!(matches!(err, BuildError::Load { source: LoadError::NotFound(_), .. }));
  }

  #[test]
  fn identical_content_gives_identical_digest() {
    let source = || {
      MemorySource::default()
        .with("acme/widget/1.0.0", "same", &[("logo.png", b"png")])
        .with("acme/widget/1.1.0", "same", &[])
    };

    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let a = manager(&first, source()).build().unwrap();
    let b = manager(&second, source()).build().unwrap();

    assert_eq!(a.digest, b.digest);
  }

  #[test]
  fn repeated_build_republishes_same_release() {
    let temp = TempDir::new().unwrap();
    let manager = manager(&temp, MemorySource::default().with("acme/widget/1.0.0", "same", &[]));

    let first = manager.build().unwrap();
    let second = manager.build().unwrap();

    assert_eq!(first, second);
    assert!(second.path.join("v1/catalog.json").is_file());
    let leftovers = std::fs::read_dir(&manager.config().staging_dir).unwrap().count();
    assert_eq!(leftovers, 0);
  }

  #[test]
  fn build_after_failure_starts_clean() {
    let temp = TempDir::new().unwrap();
    let failing = manager(&temp, MemorySource::default().with("acme/widget/1.0.0", "", &[]));
    assert!(failing.build().is_err());

    let fixed = manager(&temp, MemorySource::default().with("acme/widget/1.0.0", "fine", &[]));
    let release = fixed.build().unwrap();
    assert!(release.path.join("v1/acme/widget/1.0.0.json").is_file());
  }

  #[traced_test]
  #[test]
  fn validate_reports_every_failure() {
    let temp = TempDir::new().unwrap();
    let source = MemorySource::default()
      .with("acme/broken/1.0.0", "", &[])
      .with_files("acme/garbled/1.0.0", &[("sensu-integration.yaml", b"type: [")])
      .with("acme/widget/1.0.0", "fine", &[("sensu-resources.yaml", b"- not\n- a mapping\n")])
      .with("zeta/probe/1.0.0", "fine", &[]);

    let err = manager(&temp, source).validate().unwrap_err();

    let ValidateError::Failed { checked, failures } = err else {
      panic!("expected aggregate failure");
    };
    assert_eq!(checked, 4);
    let failed: Vec<_> = failures.iter().map(|f| format!("{}/{}", f.namespace, f.name)).collect();
    assert_eq!(failed, vec!["acme/broken", "acme/garbled", "acme/widget"]);
    assert!(matches!(failures[0].error, LoadError::Validation { .. }));
    assert!(matches!(failures[1].error, LoadError::Decode { .. }));
    assert!(logs_contain("integration failed validation"));
    assert!(logs_contain("acme"));
    assert!(!temp.path().join("release").exists());
  }

  #[test]
  fn validate_passes_clean_catalog() {
    let temp = TempDir::new().unwrap();
    let source = MemorySource::default()
      .with("acme/widget/1.0.0", "fine", &[])
      .with("acme/widget/1.1.0", "fine", &[("sensu-resources.yaml", RESOURCES)]);

    assert_eq!(
      manager(&temp, source).validate().unwrap(),
      ValidationReport { checked: 2 }
    );
  }

  #[test]
  fn validate_needs_no_output_locations() {
    let source = MemorySource::default()
      .with("acme/widget/1.0.0", "fine", &[])
      .with("acme/gadget/1.0.0", "", &[]);

    let Err(ValidateError::Failed { checked, failures }) = validate(&source) else {
      panic!("gadget should fail validation");
    };
    assert_eq!(checked, 2);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].name, "gadget");
  }
}
