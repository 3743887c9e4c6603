//! Development rebuild loop.
//!
//! `Idle -> Debouncing -> Rebuilding -> Idle`. Raw filesystem events are
//! collapsed by [`debounce`]; each rebuild renders into a fresh directory,
//! repoints the stable `current` link and notifies live-reload clients.

mod debounce;
mod output;

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::consts::{DEFAULT_DEBOUNCE, RELOAD_MESSAGE};
use crate::live::Notifier;
use crate::manager::{BuildError, ManagerConfig};
use crate::release::Release;

pub use debounce::debounce;
pub use output::{LiveOutput, RebuildError};

/// Renders one build into the given output locations.
pub type BuildFn = dyn Fn(ManagerConfig) -> Result<Release, BuildError> + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
  /// Quiet period after the last event before a rebuild starts.
  pub debounce: Duration,
}

impl Default for WatchConfig {
  fn default() -> Self {
    Self {
      debounce: DEFAULT_DEBOUNCE,
    }
  }
}

#[derive(Debug, Error)]
pub enum WatchError {
  #[error("failed to watch '{path}': {source}")]
  Watch {
    path: String,
    #[source]
    source: notify::Error,
  },
}

/// Runs builds into a [`LiveOutput`] and announces successful ones.
#[derive(Clone)]
pub struct Rebuilder {
  output: Arc<Mutex<LiveOutput>>,
  build: Arc<BuildFn>,
  notifier: Notifier,
}

impl Rebuilder {
  pub fn new(output: LiveOutput, build: Arc<BuildFn>, notifier: Notifier) -> Self {
    Self {
      output: Arc::new(Mutex::new(output)),
      build,
      notifier,
    }
  }

  /// Build on the blocking pool, swap the output in and broadcast a reload.
  ///
  /// On failure the previous output stays in place and nothing is broadcast.
  pub async fn rebuild(&self) -> Result<Release, RebuildError> {
    let output = Arc::clone(&self.output);
    let build = Arc::clone(&self.build);

    let result = tokio::task::spawn_blocking(move || {
      let mut output = output.lock().unwrap_or_else(PoisonError::into_inner);
      output.rebuild(|config| build(config))
    })
    .await
    .map_err(RebuildError::Join)
    .and_then(|result| result);

    match &result {
      Ok(release) => {
        info!(digest = %release.digest, "rebuild complete");
        self.notifier.broadcast(RELOAD_MESSAGE);
      }
      Err(err) => error!(error = %err, "rebuild failed, keeping previous output"),
    }
    result
  }
}

/// Forward filesystem events under `path` as unit signals.
///
/// The returned watcher must be kept alive for events to flow.
pub fn watch_tree(path: &Path) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<()>), WatchError> {
  let (tx, rx) = mpsc::unbounded_channel();
  let watch_error = |source| WatchError::Watch {
    path: path.display().to_string(),
    source,
  };

  let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
    Ok(event) if event.kind.is_access() => {}
    Ok(_) => {
      let _ = tx.send(());
    }
    Err(err) => warn!(error = %err, "filesystem watch error"),
  })
  .map_err(watch_error)?;
  watcher.watch(path, RecursiveMode::Recursive).map_err(watch_error)?;

  Ok((watcher, rx))
}

/// Watch `path` and rebuild on change until `cancel` fires.
///
/// An in-flight rebuild always runs to completion before this returns.
pub async fn run(
  path: &Path,
  config: WatchConfig,
  rebuilder: Rebuilder,
  cancel: CancellationToken,
) -> Result<(), WatchError> {
  let (watcher, events) = watch_tree(path)?;
  info!(path = %path.display(), debounce = ?config.debounce, "watching for changes");

  let rebuilder = &rebuilder;
  debounce(events, config.debounce, cancel, move || async move {
    let _ = rebuilder.rebuild().await;
  })
  .await;

  drop(watcher);
  info!("stopped watching");
  Ok(())
}
