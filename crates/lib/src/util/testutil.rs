//! Test utilities for catalog-api-lib.
//!
//! Throwaway git repositories are built with the `git` binary so the tests
//! exercise real objects. Callers skip when git is not installed.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// A scratch repository with a fixed committer identity.
pub struct GitRepo {
  dir: TempDir,
}

impl GitRepo {
  /// Returns `None` when no usable `git` binary is on `PATH`.
  pub fn init() -> Option<Self> {
    let available = Command::new("git")
      .arg("--version")
      .output()
      .map(|out| out.status.success())
      .unwrap_or(false);
    if !available {
      eprintln!("git not available, skipping");
      return None;
    }

    let repo = Self {
      dir: TempDir::new().unwrap(),
    };
    repo.git(&["init", "--quiet"]);
    Some(repo)
  }

  pub fn path(&self) -> &Path {
    self.dir.path()
  }

  pub fn commit_all(&self, message: &str) {
    self.git(&["add", "--all"]);
    self.git(&["commit", "--quiet", "--allow-empty", "-m", message]);
  }

  /// Annotated when `message` is given, lightweight otherwise.
  pub fn tag(&self, name: &str, message: Option<&str>) {
    match message {
      Some(message) => self.git(&["tag", "-a", name, "-m", message]),
      None => self.git(&["tag", name]),
    }
  }

  pub fn head(&self) -> String {
    let out = Command::new("git")
      .args(["rev-parse", "HEAD"])
      .current_dir(self.path())
      .output()
      .unwrap();
    String::from_utf8(out.stdout).unwrap().trim().to_string()
  }

  fn git(&self, args: &[&str]) {
    let status = Command::new("git")
      .args(args)
      .current_dir(self.path())
      .env("GIT_AUTHOR_NAME", "Catalog Test")
      .env("GIT_AUTHOR_EMAIL", "test@example.com")
      .env("GIT_COMMITTER_NAME", "Catalog Test")
      .env("GIT_COMMITTER_EMAIL", "test@example.com")
      .env("GIT_CONFIG_NOSYSTEM", "1")
      .env("HOME", self.path())
      .status()
      .unwrap();
    assert!(status.success(), "git {args:?} failed");
  }
}
