use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::consts::WORKING_TREE_MAJOR;

/// Where the content of an integration version is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
  /// A tagged revision in the repository history.
  Historical,
  /// The live checkout on disk.
  WorkingTree,
}

impl fmt::Display for Origin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Origin::Historical => write!(f, "historical"),
      Origin::WorkingTree => write!(f, "working-tree"),
    }
  }
}

/// A single version of a namespaced integration.
///
/// Identity is `(namespace, name, major, minor, patch, prerelease)`. Build
/// metadata is carried for display but never takes part in equality, hashing
/// or ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationVersion {
  pub namespace: String,
  pub name: String,
  pub major: u64,
  pub minor: u64,
  pub patch: u64,
  /// Dot-separated prerelease identifiers, empty when absent.
  pub prerelease: String,
  /// Build metadata, empty when absent.
  pub build_metadata: String,
  /// Commit id for historical versions, directory path for working-tree versions.
  pub source_ref: String,
  pub origin: Origin,
}

impl IntegrationVersion {
  /// The synthetic, always-newest version of an integration found on disk.
  pub fn working_tree(namespace: &str, name: &str, path: &str) -> Self {
    Self {
      namespace: namespace.to_string(),
      name: name.to_string(),
      major: WORKING_TREE_MAJOR,
      minor: 0,
      patch: 0,
      prerelease: String::new(),
      build_metadata: String::new(),
      source_ref: path.to_string(),
      origin: Origin::WorkingTree,
    }
  }

  /// The semantic version string, including prerelease and build metadata.
  pub fn semver(&self) -> String {
    let mut version = format!("{}.{}.{}", self.major, self.minor, self.patch);
    if !self.prerelease.is_empty() {
      version.push('-');
      version.push_str(&self.prerelease);
    }
    if !self.build_metadata.is_empty() {
      version.push('+');
      version.push_str(&self.build_metadata);
    }
    version
  }

  /// The tag this version was (or would be) published under.
  pub fn tag_name(&self) -> String {
    format!("{}/{}/{}", self.namespace, self.name, self.semver())
  }

  /// Compare by semantic-version precedence, ignoring namespace, name and build metadata.
  pub fn cmp_precedence(&self, other: &Self) -> Ordering {
    (self.major, self.minor, self.patch)
      .cmp(&(other.major, other.minor, other.patch))
      .then_with(|| cmp_prerelease(&self.prerelease, &other.prerelease))
  }

  fn identity(&self) -> (&str, &str, u64, u64, u64, &str) {
    (
      &self.namespace,
      &self.name,
      self.major,
      self.minor,
      self.patch,
      &self.prerelease,
    )
  }
}

/// Absence of a prerelease ranks above any prerelease; otherwise identifiers
/// are compared field by field, numerically where both are numeric.
fn cmp_prerelease(a: &str, b: &str) -> Ordering {
  match (semver::Prerelease::new(a), semver::Prerelease::new(b)) {
    (Ok(a), Ok(b)) => a.cmp(&b),
    _ => match (a.is_empty(), b.is_empty()) {
      (true, true) => Ordering::Equal,
      (true, false) => Ordering::Greater,
      (false, true) => Ordering::Less,
      (false, false) => a.cmp(b),
    },
  }
}

impl PartialEq for IntegrationVersion {
  fn eq(&self, other: &Self) -> bool {
    self.identity() == other.identity()
  }
}

impl Eq for IntegrationVersion {}

impl Hash for IntegrationVersion {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.identity().hash(state);
  }
}

impl PartialOrd for IntegrationVersion {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for IntegrationVersion {
  fn cmp(&self, other: &Self) -> Ordering {
    (self.namespace.as_str(), self.name.as_str())
      .cmp(&(other.namespace.as_str(), other.name.as_str()))
      .then_with(|| self.cmp_precedence(other))
  }
}

impl fmt::Display for IntegrationVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}:{}", self.namespace, self.name, self.semver())
  }
}

/// Pick the highest version by precedence. Ties keep the first one seen.
pub fn latest_version(versions: &[IntegrationVersion]) -> Option<&IntegrationVersion> {
  let mut iter = versions.iter();
  let mut latest = iter.next()?;
  for version in iter {
    if version.cmp_precedence(latest) == Ordering::Greater {
      latest = version;
    }
  }
  Some(latest)
}

/// Integration name -> its versions, in first-seen order.
pub type VersionedIntegrations = BTreeMap<String, Vec<IntegrationVersion>>;

/// Namespace -> integration name -> versions.
///
/// Built fresh on every run. Keys are ordered so traversal (and therefore the
/// rendered output) is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespacedIntegrations(BTreeMap<String, VersionedIntegrations>);

impl NamespacedIntegrations {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a version. Returns `false` if a version with the same identity is
  /// already present, in which case the earlier one is kept.
  pub fn insert(&mut self, version: IntegrationVersion) -> bool {
    let versions = self
      .0
      .entry(version.namespace.clone())
      .or_default()
      .entry(version.name.clone())
      .or_default();
    if versions.contains(&version) {
      return false;
    }
    versions.push(version);
    true
  }

  pub fn get(&self, namespace: &str, name: &str) -> Option<&[IntegrationVersion]> {
    self.0.get(namespace)?.get(name).map(Vec::as_slice)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &VersionedIntegrations)> {
    self.0.iter()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Total number of versions across every namespace.
  pub fn version_count(&self) -> usize {
    self.0.values().flat_map(|names| names.values()).map(Vec::len).sum()
  }
}

impl FromIterator<IntegrationVersion> for NamespacedIntegrations {
  fn from_iter<I: IntoIterator<Item = IntegrationVersion>>(iter: I) -> Self {
    let mut integrations = Self::new();
    for version in iter {
      integrations.insert(version);
    }
    integrations
  }
}
