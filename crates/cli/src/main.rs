mod cmd;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use catalog_api_lib::consts::DEFAULT_INTEGRATIONS_DIR;
use catalog_api_lib::source::SourceConfig;

use output::OutputFormat;

/// Build and serve the static integration catalog API
#[derive(Parser)]
#[command(name = "catalog-api")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(flatten)]
  repo: RepoArgs,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Args)]
struct RepoArgs {
  /// Path to the catalog repository
  #[arg(long, global = true, env = "CATALOG_API_REPO_DIR", default_value = ".")]
  repo_dir: PathBuf,

  /// Name of the directory holding namespaced integrations
  #[arg(long, global = true, env = "CATALOG_API_INTEGRATIONS_DIR", default_value = DEFAULT_INTEGRATIONS_DIR)]
  integrations_dir: String,
}

impl RepoArgs {
  fn source_config(&self) -> Result<SourceConfig> {
    let repo_dir = dunce::canonicalize(&self.repo_dir)
      .with_context(|| format!("Repository not found: {}", self.repo_dir.display()))?;
    Ok(SourceConfig::new(repo_dir).with_integrations_dir(&self.integrations_dir))
  }
}

#[derive(Subcommand)]
enum Commands {
  /// Generate a static catalog API from the repository's tags
  Generate {
    /// Also include the integrations in the working tree
    #[arg(long)]
    snapshot: bool,

    /// Directory the generated files are written under (default: system temp dir)
    #[arg(long, env = "CATALOG_API_TEMP_DIR")]
    temp_dir: Option<PathBuf>,
  },

  /// Validate every integration in the working tree
  Validate,

  /// Serve a generated catalog API with live reload
  Server {
    /// Port to listen on
    #[arg(short, long, env = "CATALOG_API_PORT", default_value_t = 8083)]
    port: u16,

    /// Generate the API from tags only, ignoring the working tree
    #[arg(long)]
    without_snapshot: bool,

    /// Rebuild when the repository changes
    #[arg(short, long)]
    watch: bool,

    /// Quiet period before a rebuild starts
    #[arg(long, value_parser = humantime::parse_duration, default_value = "1250ms")]
    debounce: Duration,

    /// Directory the generated files are written under (default: system temp dir)
    #[arg(long, env = "CATALOG_API_TEMP_DIR")]
    temp_dir: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let source = cli.repo.source_config()?;

  match cli.command {
    Commands::Generate { snapshot, temp_dir } => cmd::cmd_generate(source, snapshot, temp_dir.as_deref(), cli.output),
    Commands::Validate => cmd::cmd_validate(source, cli.output),
    Commands::Server {
      port,
      without_snapshot,
      watch,
      debounce,
      temp_dir,
    } => cmd::cmd_server(
      source,
      cmd::ServerOptions {
        port,
        snapshot: !without_snapshot,
        watch: watch.then_some(debounce),
        temp_dir,
      },
    ),
  }
}
