use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{ContentLoader, LoadError};

/// Reads an integration straight from its directory on disk.
#[derive(Debug, Clone)]
pub struct WorkingTreeLoader {
  root: PathBuf,
}

impl WorkingTreeLoader {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl ContentLoader for WorkingTreeLoader {
  fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>, LoadError> {
    let full = self.root.join(path);
    match std::fs::read(&full) {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(source) => Err(LoadError::Read { path: full, source }),
    }
  }

  fn list_files(&self, dir: &str) -> Result<Option<Vec<String>>, LoadError> {
    let full = self.root.join(dir);
    let entries = match std::fs::read_dir(&full) {
      Ok(entries) => entries,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      Err(source) => return Err(LoadError::Read { path: full, source }),
    };

    let mut names = Vec::new();
    for entry in entries {
      let entry = entry.map_err(|source| LoadError::Read {
        path: full.clone(),
        source,
      })?;
      let file_type = entry.file_type().map_err(|source| LoadError::Read {
        path: entry.path(),
        source,
      })?;
      if !file_type.is_file() {
        continue;
      }
      if let Some(name) = entry.file_name().to_str() {
        names.push(name.to_string());
      }
    }
    names.sort();
    Ok(Some(names))
  }
}
