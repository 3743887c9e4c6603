use std::num::ParseIntError;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::types::{IntegrationVersion, Origin};

/// `namespace/name/major.minor.patch[-prerelease][+build]`
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(concat!(
    r"^(?P<namespace>[a-z0-9_-]+)/(?P<name>[a-z0-9_-]+)/",
    r"(?P<major>0|[1-9]\d*)\.(?P<minor>0|[1-9]\d*)\.(?P<patch>0|[1-9]\d*)",
    r"(?:-(?P<prerelease>(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?",
    r"(?:\+(?P<build>[0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
  ))
  .unwrap_or_else(|e| panic!("invalid tag pattern: {e}"))
});

/// Outcome of matching a raw reference against the tag grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedTag {
  Matched(IntegrationVersion),
  /// Not an integration tag. Callers log and skip it.
  Unmatched,
}

/// A tag that matched the grammar but could not be turned into a version.
#[derive(Debug, Error)]
pub enum TagError {
  #[error("tag '{tag}' is missing the {group} component")]
  MissingGroup { tag: String, group: &'static str },

  #[error("tag '{tag}' has an invalid {group} version: {source}")]
  InvalidNumber {
    tag: String,
    group: &'static str,
    #[source]
    source: ParseIntError,
  },
}

/// Parse a tag-like reference into an [`IntegrationVersion`].
///
/// `source_ref` is the revision the tag points at and is recorded verbatim.
/// A non-matching string is not an error; it yields [`ResolvedTag::Unmatched`].
pub fn resolve_tag(tag: &str, source_ref: &str) -> Result<ResolvedTag, TagError> {
  let Some(caps) = TAG_PATTERN.captures(tag) else {
    return Ok(ResolvedTag::Unmatched);
  };

  let group = |name: &'static str| {
    caps.name(name).map(|m| m.as_str()).ok_or(TagError::MissingGroup {
      tag: tag.to_string(),
      group: name,
    })
  };
  let number = |name: &'static str| -> Result<u64, TagError> {
    group(name)?.parse::<u64>().map_err(|source| TagError::InvalidNumber {
      tag: tag.to_string(),
      group: name,
      source,
    })
  };
  let optional = |name: &str| caps.name(name).map(|m| m.as_str().to_string()).unwrap_or_default();

  Ok(ResolvedTag::Matched(IntegrationVersion {
    namespace: group("namespace")?.to_string(),
    name: group("name")?.to_string(),
    major: number("major")?,
    minor: number("minor")?,
    patch: number("patch")?,
    prerelease: optional("prerelease"),
    build_metadata: optional("build"),
    source_ref: source_ref.to_string(),
    origin: Origin::Historical,
  }))
}
