//! Layered runtime settings: an optional TOML file under `MUSTER_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Settings deserialised from `muster.toml` and the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_store_path")]
  pub store_path:             PathBuf,
  /// Restrict queries to active participants.
  #[serde(default)]
  pub active_only:            bool,
  #[serde(default)]
  pub allow_future_exercises: bool,
}

fn default_store_path() -> PathBuf { PathBuf::from("muster.db") }

impl Settings {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("MUSTER"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
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

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_uses_defaults() {
    let settings = Settings::load(Path::new("/nonexistent/muster.toml")).unwrap();
    assert!(!settings.allow_future_exercises);
  }

  #[test]
  fn reads_toml_file() {
    let path = std::env::temp_dir().join(format!("muster-{}.toml", std::process::id()));
    std::fs::write(
      &path,
      "store_path = \"/var/lib/muster/ares.db\"\nallow_future_exercises = true\n",
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(settings.store_path, PathBuf::from("/var/lib/muster/ares.db"));
    assert!(settings.allow_future_exercises);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/muster.db")),
      PathBuf::from(home).join("muster.db")
    );
    assert_eq!(expand_tilde(Path::new("/tmp/x.db")), PathBuf::from("/tmp/x.db"));
  }
}
