//! Implementation of the `catalog-api generate` command.
//!
//! Renders the static API once and leaves the release on disk for publishing.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use catalog_api_lib::manager::{CatalogManager, ManagerConfig};
use catalog_api_lib::source::{SourceConfig, SourceMode};

use crate::output::{OutputFormat, elapsed, print_json, print_stat, print_success, short_digest};

#[derive(Serialize)]
struct GenerateOutput<'a> {
  digest: &'a str,
  release_dir: &'a Path,
  release_path: &'a Path,
}

/// Execute the generate command.
///
/// Versions come from the repository's tags, plus the working tree when
/// `snapshot` is set. The first failure aborts the build. The generated tree
/// is kept after the command exits.
pub fn cmd_generate(source: SourceConfig, snapshot: bool, temp_dir: Option<&Path>, format: OutputFormat) -> Result<()> {
  let started = Instant::now();
  let work_dir = super::work_dir(temp_dir)?.keep();

  let mode = if snapshot { SourceMode::Snapshot } else { SourceMode::Git };
  let config = ManagerConfig::in_dir(&work_dir);
  let release_dir = config.release_dir.clone();

  let manager = CatalogManager::new(config, mode.open(source)).context("Invalid output configuration")?;
  let release = manager.build().context("Failed to generate catalog API")?;
  info!(digest = %release.digest, path = %release.path.display(), "catalog api generated");

  if format.is_json() {
    print_json(&GenerateOutput {
      digest: release.digest.as_ref(),
      release_dir: &release_dir,
      release_path: &release.path,
    })?;
  } else {
    print_success(&format!(
      "Generated release {} in {}",
      short_digest(release.digest.as_ref()),
      elapsed(started)
    ));
    print_stat("Digest", release.digest.as_ref());
    print_stat("Release dir", &release_dir.display().to_string());
  }

  Ok(())
}
