mod generate;
mod server;
mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;

pub use generate::cmd_generate;
pub use server::{ServerOptions, cmd_server};
pub use validate::cmd_validate;

/// Fresh working directory for generated files, under `base` or the system temp dir.
fn work_dir(base: Option<&Path>) -> Result<TempDir> {
  let mut builder = tempfile::Builder::new();
  builder.prefix("catalog-api-");
  match base {
    Some(base) => {
      std::fs::create_dir_all(base).with_context(|| format!("Failed to create {}", base.display()))?;
      builder.tempdir_in(base)
    }
    None => builder.tempdir(),
  }
  .context("Failed to create working directory")
}
