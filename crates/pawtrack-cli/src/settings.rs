//! Layered configuration: `pawtrack.toml`, then `PAWTRACK_*` environment
//! variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::ValueEnum;
use pawtrack_store::media::DEFAULT_URL_TTL_SECS;
use serde::Deserialize;

/// Which backend the commands run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  /// A SQLite file on this machine.
  #[default]
  Local,
  /// The hosted service at `url`.
  Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default)]
  pub backend:             Backend,
  pub url:                 Option<String>,
  pub anon_key:            Option<String>,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  pub email:               Option<String>,
  pub password:            Option<String>,
  #[serde(default = "default_ttl")]
  pub signed_url_ttl_secs: u64,
}

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/pawtrack/pawtrack.db") }

fn default_ttl() -> u64 { DEFAULT_URL_TTL_SECS }

impl Settings {
  /// Read `path` (if it exists) layered under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("PAWTRACK"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  /// Credentials every command except `signup` signs in with.
  pub fn credentials(&self) -> anyhow::Result<(String, String)> {
    let email = self
      .email
      .clone()
      .context("no `email` configured; pass --email or set it in pawtrack.toml")?;
    let password = self
      .password
      .clone()
      .context("no `password` configured; pass --password or set it in pawtrack.toml")?;
    Ok((email, password))
  }

  /// `store_path` with a leading `~` expanded to the home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
