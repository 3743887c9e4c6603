//! Implementation of the `catalog-api server` command.
//!
//! Builds the API once, serves it over HTTP with live reload, and optionally
//! rebuilds whenever the repository changes.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use catalog_api_lib::live::Notifier;
use catalog_api_lib::manager::{BuildError, CatalogManager, ManagerConfig};
use catalog_api_lib::release::Release;
use catalog_api_lib::server;
use catalog_api_lib::source::{SourceConfig, SourceMode};
use catalog_api_lib::watch::{self, BuildFn, LiveOutput, Rebuilder, WatchConfig};

use crate::output::{print_info, print_stat, print_success, short_digest};

pub struct ServerOptions {
  pub port: u16,
  /// Include the working tree alongside tagged versions.
  pub snapshot: bool,
  /// Debounce period when watching for changes.
  pub watch: Option<Duration>,
  pub temp_dir: Option<PathBuf>,
}

/// Execute the server command.
pub fn cmd_server(source: SourceConfig, options: ServerOptions) -> Result<()> {
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(run(source, options))
}

async fn run(source: SourceConfig, options: ServerOptions) -> Result<()> {
  let cancel = CancellationToken::new();
  tokio::spawn({
    let cancel = cancel.clone();
    async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        info!("interrupt received, shutting down");
      }
      cancel.cancel();
    }
  });

  // Removed on exit together with every build rendered below it.
  let work_dir = super::work_dir(options.temp_dir.as_deref())?;
  let output = LiveOutput::new(work_dir.path());
  let link = output.link().to_path_buf();

  let mode = if options.snapshot { SourceMode::Snapshot } else { SourceMode::Git };
  let repo_dir = source.repo_dir.clone();
  let build: Arc<BuildFn> = Arc::new(move |config: ManagerConfig| -> Result<Release, BuildError> {
    CatalogManager::new(config, mode.open(source.clone()))?.build()
  });

  let (notifier, broker) = Notifier::spawn(cancel.clone());
  let rebuilder = Rebuilder::new(output, build, notifier.clone());

  let release = rebuilder.rebuild().await.context("Initial build failed")?;
  print_success(&format!("Generated release {}", short_digest(release.digest.as_ref())));

  let addr = SocketAddr::from(([127, 0, 0, 1], options.port));
  let listener = server::bind(addr).await?;
  let app = server::router(&link, notifier, cancel.clone());
  let server = tokio::spawn(server::serve(listener, app, cancel.clone()));

  print_info(&format!("Serving catalog API at http://{}/", addr));
  print_stat("Live reload", &format!("ws://{}/ws", addr));
  print_stat("Output", &link.display().to_string());

  if let Some(debounce) = options.watch {
    let config = WatchConfig { debounce };
    if let Err(err) = watch::run(&repo_dir, config, rebuilder, cancel.clone()).await {
      cancel.cancel();
      return Err(err).context("Failed to watch repository");
    }
  }

  let served = server.await.context("Server task panicked")?;
  cancel.cancel();
  if broker.await.is_err() {
    warn!("live reload broker stopped abnormally");
  }
  served?;

  Ok(())
}
