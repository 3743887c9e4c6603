use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifying metadata stitched in from the config envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub namespace: String,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub labels: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Class {
  Community,
  Partner,
  Supported,
  Enterprise,
  /// Any value outside the vocabulary. Never passes validation.
  #[serde(other)]
  Unknown,
}

impl Class {
  pub const VALID: &'static [&'static str] = &["community", "partner", "supported", "enterprise"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
  Alerts,
  Deregistration,
  Discovery,
  Events,
  Incidents,
  Metrics,
  Monitoring,
  Remediation,
  /// Any value outside the vocabulary. Never passes validation.
  #[serde(other)]
  Unknown,
}

impl Provider {
  pub const VALID: &'static [&'static str] = &[
    "alerts",
    "deregistration",
    "discovery",
    "events",
    "incidents",
    "metrics",
    "monitoring",
    "remediation",
  ];
}

/// An input question or section heading shown to the installing user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub name: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub body: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub title: String,
  #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
  pub input: serde_json::Map<String, serde_json::Value>,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcePatchRef {
  #[serde(rename = "type")]
  pub kind: String,
  pub api_version: String,
  pub name: String,
}

/// JSON-Patch style operations applied to one resource of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcePatch {
  pub resource: ResourcePatchRef,
  #[serde(default)]
  pub patches: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostInstall {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub title: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub body: String,
}

impl PostInstall {
  pub fn validate(&self) -> Result<(), ValidationError> {
    match self.kind.as_str() {
      "markdown" => {
        if self.body.is_empty() {
          return Err(ValidationError::PostInstallBodyRequired);
        }
        if !self.title.is_empty() {
          return Err(ValidationError::PostInstallTitleForbidden);
        }
        Ok(())
      }
      "section" => Ok(()),
      other => Err(ValidationError::PostInstallType(other.to_string())),
    }
  }
}

/// The `catalog/v1.Integration` spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Integration {
  #[serde(default)]
  pub metadata: Metadata,
  #[serde(default)]
  pub display_name: String,
  #[serde(default)]
  pub class: Option<Class>,
  #[serde(default)]
  pub contributors: Vec<String>,
  #[serde(default)]
  pub provider: Option<Provider>,
  #[serde(default)]
  pub short_description: String,
  #[serde(default)]
  pub supported_platforms: Vec<String>,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub prompts: Vec<Prompt>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub resource_patches: Vec<ResourcePatch>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub post_install: Vec<PostInstall>,
}

impl Integration {
  /// Check the semantic rules every published integration must satisfy.
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.metadata.namespace.is_empty() {
      return Err(ValidationError::EmptyNamespace);
    }
    if self.metadata.name.is_empty() {
      return Err(ValidationError::EmptyName);
    }
    if self.display_name.is_empty() {
      return Err(ValidationError::EmptyDisplayName);
    }
    if matches!(self.class, None | Some(Class::Unknown)) {
      return Err(ValidationError::InvalidClass);
    }
    if matches!(self.provider, None | Some(Provider::Unknown)) {
      return Err(ValidationError::InvalidProvider);
    }
    if self.short_description.is_empty() {
      return Err(ValidationError::EmptyShortDescription);
    }
    if self.contributors.is_empty() {
      return Err(ValidationError::NoContributors);
    }
    for step in &self.post_install {
      step.validate()?;
    }
    Ok(())
  }

  /// A copy without the fields considered too verbose for aggregate listings.
  pub fn summary(&self) -> Self {
    Self {
      prompts: Vec::new(),
      resource_patches: Vec::new(),
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("namespace cannot be empty")]
  EmptyNamespace,

  #[error("name cannot be empty")]
  EmptyName,

  #[error("display_name cannot be empty")]
  EmptyDisplayName,

  #[error("class must be one of {}", Vocabulary(Class::VALID))]
  InvalidClass,

  #[error("provider must be one of {}", Vocabulary(Provider::VALID))]
  InvalidProvider,

  #[error("short_description cannot be empty")]
  EmptyShortDescription,

  #[error("one or more contributors must be defined")]
  NoContributors,

  #[error("post_install: body cannot be empty for type markdown")]
  PostInstallBodyRequired,

  #[error("post_install: title must be empty for type markdown")]
  PostInstallTitleForbidden,

  #[error("post_install: invalid type '{0}'")]
  PostInstallType(String),
}

struct Vocabulary(&'static [&'static str]);

impl fmt::Display for Vocabulary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}]", self.0.join(", "))
  }
}

#[cfg(test)]
pub(crate) mod fixtures {
  use super::*;

  /// A valid integration with every optional section populated.
  pub fn integration(namespace: &str, name: &str) -> Integration {
    let mut input = serde_json::Map::new();
    input.insert("type".into(), "string".into());
    input.insert("title".into(), "Who does Number Two work for?".into());
    input.insert("default".into(), "Dr. Evil".into());

    let mut patch = serde_json::Map::new();
    patch.insert("path".into(), "/spec/id".into());
    patch.insert("op".into(), "replace".into());
    patch.insert("value".into(), "[[employer]]".into());

    Integration {
      metadata: Metadata {
        name: name.to_string(),
        namespace: namespace.to_string(),
        ..Default::default()
      },
      display_name: name.to_uppercase(),
      class: Some(Class::Community),
      contributors: vec!["@artem".to_string(), "@olha".to_string()],
      provider: Some(Provider::Alerts),
      short_description: "lorem ipsum".to_string(),
      supported_platforms: vec!["linux".to_string(), "darwin".to_string()],
      tags: vec!["tag1".to_string(), "tag2".to_string()],
      prompts: vec![
        Prompt {
          kind: "section".to_string(),
          title: "Example Section".to_string(),
          ..Default::default()
        },
        Prompt {
          kind: "question".to_string(),
          name: "employer".to_string(),
          input,
          ..Default::default()
        },
      ],
      resource_patches: vec![ResourcePatch {
        resource: ResourcePatchRef {
          kind: "Handler".to_string(),
          api_version: "core/v2".to_string(),
          name: "foo_handler".to_string(),
        },
        patches: vec![patch],
      }],
      post_install: Vec::new(),
    }
  }
}
