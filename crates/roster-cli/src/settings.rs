//! Runtime settings: `roster.toml` overlaid with `ROSTER_*` variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite database file; a leading `~/` is expanded.
  pub store_path: PathBuf,
  /// Tenant every command works in; created on first use.
  pub tenant:     String,
  /// Optional TOML file replacing some or all built-in mapping tables.
  pub tables:     Option<PathBuf>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("roster.db"),
      tenant:     "default".to_string(),
      tables:     None,
    }
  }
}

impl Settings {
  /// Read `path` if it exists, then the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_file(config::File::from(path).required(false))
  }

  fn from_file<F>(file: F) -> anyhow::Result<Self>
  where
    F: config::Source + Send + Sync + 'static,
  {
    let mut settings: Self = config::Config::builder()
      .add_source(file)
      .add_source(config::Environment::with_prefix("ROSTER"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise Settings")?;

    settings.store_path = expand_tilde(&settings.store_path);
    settings.tables = settings.tables.as_deref().map(expand_tilde);
    Ok(settings)
  }
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
