//! Reading the artifacts of one integration version.
//!
//! [`ContentLoader`] has two implementations: [`WorkingTreeLoader`] reads an
//! integration directory off disk, [`HistoricalLoader`] reads the same relative
//! paths out of a committed git tree. Only the two primitive reads differ; every
//! `load_*` operation is shared, so both produce identical results for
//! identical content.

mod git;
mod path;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::api::{self, DecodeError, Integration, ResourceError, Resources, ValidationError};
use crate::consts::{
  CHANGELOG_FILENAME, CONFIG_FILENAME, IMAGE_EXTENSIONS, IMAGES_DIRNAME, LOGO_FILENAME, README_FILENAME,
  RESOURCES_FILENAME,
};
use crate::version::Origin;

pub use git::HistoricalLoader;
pub use path::WorkingTreeLoader;

/// Image file name to content.
pub type Images = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Error)]
pub enum LoadError {
  #[error("failed to read '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read '{path}' from revision {revision}: {source}")]
  Git {
    revision: String,
    path: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("'{0}' does not exist")]
  NotFound(String),

  #[error("failed to decode '{path}': {source}")]
  Decode {
    path: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("'{path}' declares an unsupported config type '{type_version}'")]
  UnsupportedType { path: String, type_version: String },

  #[error("'{path}' failed validation: {source}")]
  Validation {
    path: String,
    #[source]
    source: ValidationError,
  },

  #[error("'{0}' contains no resources")]
  EmptyResources(String),

  #[error("{version} is {actual} content, this source only reads {expected} content")]
  OriginMismatch {
    version: String,
    actual: Origin,
    expected: Origin,
  },
}

impl LoadError {
  /// Whether the error only means the file is absent.
  pub fn is_not_found(&self) -> bool {
    matches!(self, LoadError::NotFound(_))
  }
}

/// Capability set over the files of one integration version.
///
/// Paths are relative to the integration directory and use forward slashes.
pub trait ContentLoader {
  /// Read a file. `Ok(None)` when it does not exist.
  fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>, LoadError>;

  /// Names of the regular files directly inside a directory. `Ok(None)` when
  /// the directory does not exist.
  fn list_files(&self, dir: &str) -> Result<Option<Vec<String>>, LoadError>;

  /// Decode and validate `sensu-integration.yaml`.
  fn load_config(&self) -> Result<Integration, LoadError> {
    let bytes = self
      .read_file(CONFIG_FILENAME)?
      .ok_or_else(|| LoadError::NotFound(CONFIG_FILENAME.to_string()))?;

    let integration = api::decode_config(&bytes).map_err(|err| match err {
      DecodeError::UnsupportedType(type_version) => LoadError::UnsupportedType {
        path: CONFIG_FILENAME.to_string(),
        type_version,
      },
      other => LoadError::Decode {
        path: CONFIG_FILENAME.to_string(),
        source: Box::new(other),
      },
    })?;

    integration.validate().map_err(|source| LoadError::Validation {
      path: CONFIG_FILENAME.to_string(),
      source,
    })?;

    Ok(integration)
  }

  /// Parse `sensu-resources.yaml`. Absent or empty manifests are errors here;
  /// callers decide whether to tolerate them.
  fn load_resources(&self) -> Result<Resources, LoadError> {
    let bytes = self
      .read_file(RESOURCES_FILENAME)?
      .ok_or_else(|| LoadError::NotFound(RESOURCES_FILENAME.to_string()))?;

    api::resources_from_yaml(&bytes).map_err(|err| match err {
      ResourceError::Empty => LoadError::EmptyResources(RESOURCES_FILENAME.to_string()),
      other => LoadError::Decode {
        path: RESOURCES_FILENAME.to_string(),
        source: Box::new(other),
      },
    })
  }

  fn load_logo(&self) -> Result<Vec<u8>, LoadError> {
    load_required(self, LOGO_FILENAME)
  }

  fn load_readme(&self) -> Result<Vec<u8>, LoadError> {
    load_required(self, README_FILENAME)
  }

  fn load_changelog(&self) -> Result<Vec<u8>, LoadError> {
    load_required(self, CHANGELOG_FILENAME)
  }

  /// Every `img/*.{jpg,gif,png}`. A missing `img` directory is an empty set.
  fn load_images(&self) -> Result<Images, LoadError> {
    let mut images = Images::new();
    let Some(names) = self.list_files(IMAGES_DIRNAME)? else {
      return Ok(images);
    };

    for name in names.into_iter().filter(|name| is_image(name)) {
      let path = format!("{IMAGES_DIRNAME}/{name}");
      if let Some(bytes) = self.read_file(&path)? {
        images.insert(name, bytes);
      }
    }
    Ok(images)
  }
}

fn load_required<L: ContentLoader + ?Sized>(loader: &L, path: &str) -> Result<Vec<u8>, LoadError> {
  loader
    .read_file(path)?
    .ok_or_else(|| LoadError::NotFound(path.to_string()))
}

fn is_image(name: &str) -> bool {
  Path::new(name)
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext))
}
