use tracing::{error, info, warn};

use super::{CatalogSource, ResolveError, SourceConfig, origin_mismatch};
use crate::loader::{ContentLoader, HistoricalLoader, LoadError};
use crate::version::{IntegrationVersion, Origin, ResolvedTag, resolve_tag};

/// One version per `<namespace>/<name>/<semver>` tag in the repository.
#[derive(Debug, Clone)]
pub struct GitSource {
  config: SourceConfig,
}

impl GitSource {
  pub fn new(config: SourceConfig) -> Self {
    Self { config }
  }
}

impl CatalogSource for GitSource {
  fn load_integrations(&self) -> Result<Vec<IntegrationVersion>, ResolveError> {
    let path = &self.config.repo_dir;
    let repo = gix::open(path).map_err(|e| ResolveError::OpenRepository {
      path: path.clone(),
      source: Box::new(e),
    })?;
    let list_error = |source: Box<dyn std::error::Error + Send + Sync>| ResolveError::ListTags {
      path: path.clone(),
      source,
    };

    let references = repo.references().map_err(|e| list_error(Box::new(e)))?;
    let tags = references.tags().map_err(|e| list_error(Box::new(e)))?;

    let mut versions = Vec::new();
    for reference in tags {
      let reference = reference.map_err(list_error)?;
      let tag = reference.name().shorten().to_string();

      let peel = format!("{}^{{commit}}", reference.name().as_bstr());
      let commit = match repo.rev_parse_single(peel.as_str()) {
        Ok(id) => id.detach().to_string(),
        Err(err) => {
          warn!(%tag, reason = %err, "skipping tag that does not point at a commit");
          continue;
        }
      };

      match resolve_tag(&tag, &commit) {
        Ok(ResolvedTag::Matched(version)) => {
          info!(
            %tag,
            namespace = %version.namespace,
            name = %version.name,
            version = %version.semver(),
            origin = %version.origin,
            "found integration version"
          );
          versions.push(version);
        }
        Ok(ResolvedTag::Unmatched) => {
          warn!(%tag, reason = "unmatched git tag", "skipping integration version");
        }
        Err(err) => {
          error!(%tag, error = %err, "malformed integration tag");
        }
      }
    }

    Ok(versions)
  }

  fn loader_for(&self, version: &IntegrationVersion) -> Result<Box<dyn ContentLoader>, LoadError> {
    if version.origin != Origin::Historical {
      return Err(origin_mismatch(version, Origin::Historical));
    }
    let prefix = self.config.integration_prefix(&version.namespace, &version.name);
    let loader = HistoricalLoader::open(&self.config.repo_dir, &version.source_ref, prefix)?;
    Ok(Box::new(loader))
  }
}
