//! pawtrack command-line client.
//!
//! Reads `pawtrack.toml` (or the path given with `--config`), connects to the
//! configured backend, and runs one command against the signed-in account.
//!
//! ```text
//! pawtrack signup --name Sam --email sam@example.com --password hunter22
//! pawtrack pets add Mochi --kind cat --born 2021-04-02
//! pawtrack visits add mochi --vet "Dr. Lee" --at 2026-11-02T09:30:00Z
//! ```

mod commands;
mod print;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use pawtrack_gateway_sqlite::SqliteGateway;
use pawtrack_rest::{RestConfig, RestGateway};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{
  commands::Command,
  settings::{Backend, Settings},
};

#[derive(Parser)]
#[command(author, version, about = "Keep track of your pets' care")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "pawtrack.toml")]
  config: PathBuf,

  /// Overrides `backend` from the configuration.
  #[arg(long, value_enum)]
  backend: Option<Backend>,

  /// Overrides the configured account email.
  #[arg(long, global = true)]
  email: Option<String>,

  /// Overrides the configured account password.
  #[arg(long, global = true)]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so command output stays clean.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(backend) = cli.backend {
    settings.backend = backend;
  }
  if cli.email.is_some() {
    settings.email = cli.email;
  }
  if cli.password.is_some() {
    settings.password = cli.password;
  }

  match settings.backend {
    Backend::Local => {
      let path = settings.resolved_store_path();
      if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
      {
        std::fs::create_dir_all(parent)
          .with_context(|| format!("failed to create {}", parent.display()))?;
      }
      let gateway = SqliteGateway::open(&path)
        .await
        .with_context(|| format!("failed to open store at {}", path.display()))?;
      tracing::debug!(path = %path.display(), "opened local store");
      commands::run(Arc::new(gateway), &settings, cli.command).await
    }
    Backend::Remote => {
      let url = settings
        .url
        .clone()
        .context("remote backend needs `url`; set it in pawtrack.toml or PAWTRACK_URL")?;
      let key = settings
        .anon_key
        .clone()
        .context("remote backend needs `anon_key`; set it in pawtrack.toml or PAWTRACK_ANON_KEY")?;
      tracing::debug!(%url, "using remote backend");
      let gateway = RestGateway::new(RestConfig::new(url, key))
        .context("failed to build HTTP client")?;
      commands::run(Arc::new(gateway), &settings, cli.command).await
    }
  }
}
