use serde::Deserialize;
use thiserror::Error;

use super::integration::{Integration, Metadata};

/// `api_version` + `type` of the only config kind understood today.
pub const INTEGRATION_TYPE_VERSION: &str = "catalog/v1.Integration";

/// Generic wrapper every config file is written in.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
  #[serde(rename = "type", default)]
  pub kind: String,
  #[serde(default)]
  pub api_version: String,
  #[serde(default)]
  pub metadata: Metadata,
  #[serde(default)]
  pub spec: serde_yaml::Value,
}

impl Envelope {
  pub fn type_version(&self) -> String {
    format!("{}.{}", self.api_version, self.kind)
  }
}

#[derive(Debug, Error)]
pub enum DecodeError {
  #[error("malformed config envelope")]
  Envelope(#[source] serde_yaml::Error),

  #[error("unsupported config type '{0}'")]
  UnsupportedType(String),

  #[error("malformed spec for {type_version}")]
  Spec {
    type_version: String,
    #[source]
    source: serde_yaml::Error,
  },
}

/// Decode raw config bytes into an [`Integration`].
///
/// The envelope metadata replaces whatever metadata the spec carried. The
/// result is not validated.
pub fn decode_config(bytes: &[u8]) -> Result<Integration, DecodeError> {
  let envelope: Envelope = serde_yaml::from_slice(bytes).map_err(DecodeError::Envelope)?;

  let type_version = envelope.type_version();
  if type_version != INTEGRATION_TYPE_VERSION {
    return Err(DecodeError::UnsupportedType(type_version));
  }

  let mut integration = if envelope.spec.is_null() {
    Integration::default()
  } else {
    serde_yaml::from_value::<Integration>(envelope.spec)
      .map_err(|source| DecodeError::Spec { type_version, source })?
  };
  integration.metadata = envelope.metadata;

  Ok(integration)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{Class, Provider};

  const CONFIG: &str = r#"---
type: Integration
api_version: catalog/v1
metadata:
  namespace: acme
  name: widget
  labels:
    tier: gold
spec:
  display_name: Widget
  class: supported
  provider: metrics
  short_description: Collects widget metrics
  contributors:
    - "@acme"
  supported_platforms: [linux]
  tags: [widgets]
  prompts:
    - type: section
      title: Setup
    - type: question
      name: url
      required: true
      input:
        type: string
        title: Endpoint URL
  resource_patches:
    - resource:
        type: CheckConfig
        api_version: core/v2
        name: widget-check
      patches:
        - path: /spec/command
          op: replace
          value: "widget --url [[url]]"
  post_install:
    - type: markdown
      body: "Done!"
"#;

  #[test]
  fn decodes_integration_envelope() {
    let integration = decode_config(CONFIG.as_bytes()).unwrap();

    assert_eq!(integration.metadata.namespace, "acme");
    assert_eq!(integration.metadata.name, "widget");
    assert_eq!(integration.metadata.labels.get("tier").map(String::as_str), Some("gold"));
    assert_eq!(integration.class, Some(Class::Supported));
    assert_eq!(integration.provider, Some(Provider::Metrics));
    assert_eq!(integration.prompts.len(), 2);
    assert!(integration.prompts[1].required);
    assert_eq!(integration.resource_patches[0].resource.name, "widget-check");
    assert_eq!(integration.post_install[0].body, "Done!");
    assert_eq!(integration.validate(), Ok(()));
  }

  #[test]
  fn envelope_metadata_wins_over_spec() {
    let config = CONFIG.replace("  display_name: Widget", "  display_name: Widget\n  metadata:\n    name: other");
    let integration = decode_config(config.as_bytes()).unwrap();
    assert_eq!(integration.metadata.name, "widget");
  }

  #[test]
  fn unknown_class_decodes_but_fails_validation() {
    let config = CONFIG.replace("class: supported", "class: premium");
    let integration = decode_config(config.as_bytes()).unwrap();
    assert_eq!(integration.class, Some(Class::Unknown));
    assert!(integration.validate().is_err());
  }

  #[test]
  fn rejects_unsupported_type() {
    let config = CONFIG.replace("type: Integration", "type: Dashboard");
    let err = decode_config(config.as_bytes()).unwrap_err();
    assert!(matches!(err, DecodeError::UnsupportedType(ref t) if t == "catalog/v1.Dashboard"));
  }

  #[test]
  fn rejects_malformed_yaml() {
    let err = decode_config(b"type: [unterminated").unwrap_err();
    assert!(matches!(err, DecodeError::Envelope(_)));
  }

  #[test]
  fn rejects_malformed_spec() {
    let config = CONFIG.replace("  contributors:\n    - \"@acme\"", "  contributors: 42");
    let err = decode_config(config.as_bytes()).unwrap_err();
    assert!(matches!(err, DecodeError::Spec { .. }));
  }
}
