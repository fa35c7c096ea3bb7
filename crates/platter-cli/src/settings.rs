//! Runtime configuration, read from a TOML file and `PLATTER_*` environment
//! variables (environment wins; nested keys use `__`, e.g.
//! `PLATTER_SPOTIFY__CLIENT_ID`).

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use platter_spotify::SpotifyConfig;
use serde::Deserialize;

/// Shape of the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// CSV file holding the card registry.
  #[serde(default = "default_registry_path")]
  pub registry_path:    PathBuf,
  /// Spotify device that cards play on; required by `run`.
  pub device_id:        Option<String>,
  /// Links accepted per enrollment when each one is already bound.
  #[serde(default = "default_max_url_attempts")]
  pub max_url_attempts: usize,
  /// Required by `run` and `devices`.
  pub spotify:          Option<SpotifyConfig>,
}

fn default_registry_path() -> PathBuf { PathBuf::from("data/rfid.csv") }

fn default_max_url_attempts() -> usize { 3 }

impl Settings {
  /// Layer the (optional) file at `path` under the process environment.
  pub fn load(path: &Path) -> Result<Self> { Self::load_with_env(path, None) }

  /// As [`Settings::load`], reading variables from `env` instead of the
  /// process environment when given.
  fn load_with_env(path: &Path, env: Option<config::Map<String, String>>) -> Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("PLATTER")
          .prefix_separator("_")
          .separator("__")
          .source(env),
      )
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut settings: Settings = raw
      .try_deserialize()
      .context("failed to deserialise configuration")?;
    settings.registry_path = expand_tilde(&settings.registry_path);
    Ok(settings)
  }

  pub fn spotify(&self) -> Result<SpotifyConfig> {
    self
      .spotify
      .clone()
      .context("missing [spotify] section (client_id, client_secret, refresh_token)")
  }

  pub fn device_id(&self) -> Result<&str> {
    self
      .device_id
      .as_deref()
      .filter(|id| !id.is_empty())
      .context("missing device_id; run `platter devices` to list available ones")
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
  use std::fs;

  use super::*;

  fn env<const N: usize>(vars: [(&str, &str); N]) -> config::Map<String, String> {
    vars.into_iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect()
  }

  #[test]
  fn reads_file_with_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("platter.toml");
    fs::write(
      &path,
      r#"
        registry_path = "/var/lib/platter/rfid.csv"
        device_id = "abc"

        [spotify]
        client_id = "id"
        client_secret = "secret"
        refresh_token = "refresh"
      "#,
    )
    .unwrap();

    let settings = Settings::load_with_env(&path, Some(env([]))).unwrap();
    assert_eq!(settings.registry_path, PathBuf::from("/var/lib/platter/rfid.csv"));
    assert_eq!(settings.device_id().unwrap(), "abc");
    assert_eq!(settings.max_url_attempts, 3);

    let spotify = settings.spotify().unwrap();
    assert_eq!(spotify.client_id, "id");
    assert_eq!(spotify.api_base, "https://api.spotify.com/v1");
  }

  #[test]
  fn missing_sections_are_reported_when_needed() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("platter.toml");
    fs::write(&path, "max_url_attempts = 5\n").unwrap();

    let settings = Settings::load_with_env(&path, Some(env([]))).unwrap();
    assert_eq!(settings.max_url_attempts, 5);
    assert!(settings.spotify().is_err());
    assert!(settings.device_id().is_err());
  }

  #[test]
  fn environment_alone_is_enough() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let settings = Settings::load_with_env(
      &missing,
      Some(env([
        ("PLATTER_DEVICE_ID", "dev1"),
        ("PLATTER_REGISTRY_PATH", "/srv/rfid.csv"),
        ("PLATTER_SPOTIFY__CLIENT_ID", "id"),
        ("PLATTER_SPOTIFY__CLIENT_SECRET", "secret"),
        ("PLATTER_SPOTIFY__REFRESH_TOKEN", "refresh"),
        ("UNRELATED_DEVICE_ID", "ignored"),
      ])),
    )
    .unwrap();

    assert_eq!(settings.device_id().unwrap(), "dev1");
    assert_eq!(settings.registry_path, PathBuf::from("/srv/rfid.csv"));
    let spotify = settings.spotify().unwrap();
    assert_eq!(spotify.client_id, "id");
    assert_eq!(spotify.client_secret, "secret");
    assert_eq!(spotify.refresh_token, "refresh");
  }

  #[test]
  fn environment_overrides_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("platter.toml");
    fs::write(
      &path,
      r#"
        device_id = "from-file"

        [spotify]
        client_id = "file-id"
        client_secret = "secret"
        refresh_token = "refresh"
      "#,
    )
    .unwrap();

    let settings = Settings::load_with_env(
      &path,
      Some(env([
        ("PLATTER_DEVICE_ID", "from-env"),
        ("PLATTER_SPOTIFY__CLIENT_ID", "env-id"),
      ])),
    )
    .unwrap();

    assert_eq!(settings.device_id().unwrap(), "from-env");
    let spotify = settings.spotify().unwrap();
    assert_eq!(spotify.client_id, "env-id");
    assert_eq!(spotify.client_secret, "secret");
  }
}
