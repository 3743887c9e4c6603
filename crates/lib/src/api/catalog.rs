//! Bodies of the JSON endpoints written into a release.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Integration;

/// `v1/<ns>/<name>/<ver>.json` and the entries of `catalog.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationVersionView {
  #[serde(flatten)]
  pub integration: Integration,
  pub version: String,
}

/// `v1/<ns>/<name>.json`: the latest config plus every published version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationWithVersions {
  #[serde(flatten)]
  pub integration: Integration,
  pub versions: Vec<String>,
}

/// `v1/<ns>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceIndex {
  pub name: String,
  pub integrations: Vec<String>,
}

/// `v1/catalog.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
  pub namespaced_integrations: BTreeMap<String, Vec<IntegrationVersionView>>,
}

impl Catalog {
  pub fn get(&self, namespace: &str, name: &str) -> Option<&IntegrationVersionView> {
    self
      .namespaced_integrations
      .get(namespace)?
      .iter()
      .find(|entry| entry.integration.metadata.name == name)
  }
}

/// `version.json` at the output root; the only file rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasePointer {
  pub release_digest: String,
  /// Unix seconds.
  pub last_updated: u64,
}
