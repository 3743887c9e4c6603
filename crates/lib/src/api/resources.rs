use serde::Deserialize;
use thiserror::Error;

/// The documents of a resource manifest, in file order.
pub type Resources = Vec<serde_json::Map<String, serde_json::Value>>;

#[derive(Debug, Error)]
pub enum ResourceError {
  #[error("resource manifest contains no documents")]
  Empty,

  #[error("malformed resource document #{document}")]
  Decode {
    document: usize,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("resource document #{document} is not a mapping")]
  NotMapping { document: usize },
}

/// Parse a multi-document YAML manifest into one list of JSON objects.
///
/// Empty documents (a trailing `---` for instance) are skipped. A manifest
/// without any document is [`ResourceError::Empty`].
pub fn resources_from_yaml(bytes: &[u8]) -> Result<Resources, ResourceError> {
  let mut resources = Resources::new();

  for (index, document) in serde_yaml::Deserializer::from_slice(bytes).enumerate() {
    let document_number = index + 1;
    let value = serde_json::Value::deserialize(document).map_err(|source| ResourceError::Decode {
      document: document_number,
      source,
    })?;

    match value {
      serde_json::Value::Null => continue,
      serde_json::Value::Object(map) => resources.push(map),
      _ => {
        return Err(ResourceError::NotMapping {
          document: document_number,
        });
      }
    }
  }

  if resources.is_empty() {
    return Err(ResourceError::Empty);
  }
  Ok(resources)
}

#[cfg(test)]
mod tests {
  use super::*;

  const MANIFEST: &str = r#"---
type: CheckConfig
api_version: core/v2
metadata:
  name: widget-check
spec:
  command: widget
  interval: 30
---
type: Handler
api_version: core/v2
metadata:
  name: widget-handler
spec:
  type: pipe
  command: cat
"#;

  #[test]
  fn documents_become_one_array() {
    let resources = resources_from_yaml(MANIFEST.as_bytes()).unwrap();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0]["type"], "CheckConfig");
    assert_eq!(resources[0]["spec"]["interval"], 30);
    assert_eq!(resources[1]["metadata"]["name"], "widget-handler");
  }

  #[test]
  fn single_document_is_still_an_array() {
    let resources = resources_from_yaml(b"type: Asset\napi_version: core/v2\n").unwrap();
    let json = serde_json::to_string(&resources).unwrap();
    assert_eq!(json, r#"[{"api_version":"core/v2","type":"Asset"}]"#);
  }

  #[test]
  fn trailing_separator_is_ignored() {
    let manifest = format!("{MANIFEST}---\n");
    assert_eq!(resources_from_yaml(manifest.as_bytes()).unwrap().len(), 2);
  }

  #[test]
  fn empty_manifest_is_an_error() {
    assert!(matches!(resources_from_yaml(b""), Err(ResourceError::Empty)));
  }

  #[test]
  fn malformed_document_fails_the_whole_manifest() {
    let manifest = format!("{MANIFEST}---\nspec: [unterminated\n");
    assert!(matches!(
      resources_from_yaml(manifest.as_bytes()),
      Err(ResourceError::Decode { .. })
    ));
  }

  #[test]
  fn scalar_document_is_rejected() {
    assert!(matches!(
      resources_from_yaml(b"just a string\n"),
      Err(ResourceError::NotMapping { document: 1 })
    ));
  }
}
