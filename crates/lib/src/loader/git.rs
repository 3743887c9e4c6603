use std::path::Path;

use gix::ObjectId;

use super::{ContentLoader, LoadError};

/// Reads an integration out of a committed tree without checking it out.
pub struct HistoricalLoader {
  repo: gix::Repository,
  revision: String,
  tree_id: ObjectId,
  prefix: String,
}

impl HistoricalLoader {
  /// `revision` is anything `rev-parse` understands; `prefix` is the
  /// integration directory relative to the repository root.
  pub fn open(repo_dir: &Path, revision: &str, prefix: impl Into<String>) -> Result<Self, LoadError> {
    let prefix = prefix.into();
    let git_error = |source: Box<dyn std::error::Error + Send + Sync>| LoadError::Git {
      revision: revision.to_string(),
      path: prefix.clone(),
      source,
    };

    let repo = gix::open(repo_dir).map_err(|e| git_error(Box::new(e)))?;
    let spec = format!("{revision}^{{tree}}");
    let tree_id = repo
      .rev_parse_single(spec.as_str())
      .map_err(|e| git_error(Box::new(e)))?
      .detach();

    Ok(Self {
      repo,
      revision: revision.to_string(),
      tree_id,
      prefix,
    })
  }

  pub fn revision(&self) -> &str {
    &self.revision
  }

  fn full_path(&self, path: &str) -> String {
    if self.prefix.is_empty() {
      path.to_string()
    } else {
      format!("{}/{}", self.prefix.trim_end_matches('/'), path)
    }
  }

  fn git_error(&self, path: &str, source: impl std::error::Error + Send + Sync + 'static) -> LoadError {
    LoadError::Git {
      revision: self.revision.clone(),
      path: path.to_string(),
      source: Box::new(source),
    }
  }

  fn entry(&self, path: &str) -> Result<Option<gix::object::tree::Entry<'_>>, LoadError> {
    let mut tree = self
      .repo
      .find_tree(self.tree_id)
      .map_err(|e| self.git_error(path, e))?;
    tree.peel_to_entry_by_path(path).map_err(|e| self.git_error(path, e))
  }
}

impl ContentLoader for HistoricalLoader {
  fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>, LoadError> {
    let full = self.full_path(path);
    let Some(entry) = self.entry(&full)? else {
      return Ok(None);
    };
    if !entry.mode().is_blob() {
      return Ok(None);
    }

    let object = entry.object().map_err(|e| self.git_error(&full, e))?;
    Ok(Some(object.detach().data))
  }

  fn list_files(&self, dir: &str) -> Result<Option<Vec<String>>, LoadError> {
    let full = self.full_path(dir);
    let Some(entry) = self.entry(&full)? else {
      return Ok(None);
    };
    if !entry.mode().is_tree() {
      return Ok(None);
    }

    let tree = entry
      .object()
      .map_err(|e| self.git_error(&full, e))?
      .try_into_tree()
      .map_err(|e| self.git_error(&full, e))?;

    let mut names = Vec::new();
    for item in tree.iter() {
      let item = item.map_err(|e| self.git_error(&full, e))?;
      if item.mode().is_blob() {
        names.push(item.filename().to_string());
      }
    }
    names.sort();
    Ok(Some(names))
  }
}
