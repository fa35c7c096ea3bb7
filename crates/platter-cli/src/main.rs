//! `platter` — play Spotify media by scanning RFID cards.
//!
//! `platter run` waits for card scans on stdin (a USB reader in keyboard mode
//! types the card number and Enter). Known cards start playback on the
//! configured device; unknown cards prompt for a Spotify link and are
//! enrolled; the rebind card reassigns another card.
//!
//! The first `run` against a missing registry asks for the card to use as
//! the rebind card and creates the registry with it.

mod console;
mod settings;

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use platter_core::{
  binding::MediaKind,
  input::TokenReader,
  media::Player,
  media_url,
  resolver::{Resolver, ResolverConfig},
  store::RegistryStore,
};
use platter_spotify::SpotifyClient;
use platter_store_csv::CsvStore;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

use crate::{console::Console, settings::Settings};

#[derive(Parser)]
#[command(author, version, about = "Play Spotify media from RFID cards")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "platter.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Read cards and play what they are bound to (the default).
  Run,
  /// Print every binding in the registry.
  List {
    /// Emit JSON instead of a table.
    #[arg(long)]
    json: bool,
  },
  /// Show the media reference a Spotify link would be stored as.
  ParseUrl { url: String },
  /// List the Spotify devices available for playback.
  Devices,
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = || Settings::load(&cli.config);

  match cli.command.as_ref().unwrap_or(&Command::Run) {
    Command::Run => run(&settings()?).await,
    Command::List { json } => list(&settings()?, *json),
    // Works without any configuration.
    Command::ParseUrl { url } => parse_url(url),
    Command::Devices => devices(&settings()?).await,
  }
}

// ─── run ─────────────────────────────────────────────────────────────────────

async fn run(settings: &Settings) -> Result<()> {
  let device_id = settings.device_id()?.to_owned();
  let client = SpotifyClient::new(settings.spotify()?)?;
  let mut console = Console::stdin();

  let Some(store) = open_or_bootstrap(settings, &mut console).await? else {
    return Ok(());
  };
  info!(
    path = %store.path().display(),
    bindings = store.registry().len().saturating_sub(1),
    "registry loaded"
  );

  let config = ResolverConfig { max_url_attempts: settings.max_url_attempts };
  let mut resolver = Resolver::new(store, console, client.clone()).with_config(config);

  while let Some(card) = resolver.input_mut().read().await {
    let Some(record) = resolver.resolve(card).await else {
      continue;
    };
    if let Err(e) = client
      .play(&device_id, record.media_kind(), record.media_ref())
      .await
    {
      error!(%record, error = %e, "playback failed");
    }
  }

  info!("input closed, exiting");
  Ok(())
}

/// Open the registry, creating it around a freshly scanned rebind card when
/// the file does not exist yet. `None` if input ends before a card is read.
async fn open_or_bootstrap(
  settings: &Settings,
  console: &mut Console<impl tokio::io::AsyncBufRead + Unpin>,
) -> Result<Option<CsvStore>> {
  let path = &settings.registry_path;
  if let Some(store) = CsvStore::load(path)
    .with_context(|| format!("failed to open registry {}", path.display()))?
  {
    return Ok(Some(store));
  }

  warn!(path = %path.display(), "no registry found; scan the card to use for rebinding");
  let Some(rebind) = console.read().await else {
    return Ok(None);
  };
  let store = CsvStore::bootstrap(path, rebind)
    .with_context(|| format!("failed to create registry {}", path.display()))?;
  info!(card = %rebind, "rebind card registered");
  Ok(Some(store))
}

// ─── list ────────────────────────────────────────────────────────────────────

fn list(settings: &Settings, json: bool) -> Result<()> {
  let path = &settings.registry_path;
  let Some(store) = CsvStore::load(path)
    .with_context(|| format!("failed to open registry {}", path.display()))?
  else {
    bail!("no registry at {}; run `platter run` to create one", path.display());
  };
  let records = store.registry().records();

  if json {
    println!("{}", serde_json::to_string_pretty(records)?);
    return Ok(());
  }

  println!("{:<12} {:<10} {:<40} {:<30} ARTIST", "CARD", "KIND", "ITEM", "NAME");
  for r in records {
    if r.is_sentinel() {
      println!("{:<12} {:<10} (rebind card)", r.token_id(), r.media_kind());
      continue;
    }
    println!(
      "{:<12} {:<10} {:<40} {:<30} {}",
      r.token_id(),
      r.media_kind(),
      r.media_ref(),
      r.media_name(),
      r.artist_name()
    );
  }
  Ok(())
}

// ─── parse-url ───────────────────────────────────────────────────────────────

fn parse_url(url: &str) -> Result<()> {
  let parsed = media_url::parse(url)?;
  if parsed.has_locale_segment() {
    warn!(segment = %parsed.kind, "remove the locale segment; the link cannot be bound as is");
  } else if MediaKind::playable(&parsed.kind).is_none() {
    warn!(kind = %parsed.kind, "this kind of link cannot be bound to a card");
  }
  println!("kind: {}", parsed.kind);
  println!("ref:  {}", parsed.media_ref());
  Ok(())
}

// ─── devices ─────────────────────────────────────────────────────────────────

async fn devices(settings: &Settings) -> Result<()> {
  let client = SpotifyClient::new(settings.spotify()?)?;
  let devices = client.devices().await.context("failed to list devices")?;
  if devices.is_empty() {
    println!("no devices available; start a Spotify Connect player first");
    return Ok(());
  }
  for d in devices {
    let active = if d.is_active { "*" } else { " " };
    println!("{active} {:<40} {:<12} {}", d.id.as_deref().unwrap_or("-"), d.kind, d.name);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use platter_core::binding::TokenId;

  use super::*;

  #[test]
  fn defaults_to_run() {
    let cli = Cli::try_parse_from(["platter"]).unwrap();
    assert!(cli.command.is_none());
    assert_eq!(cli.config, PathBuf::from("platter.toml"));
  }

  #[test]
  fn parses_subcommands() {
    let cli = Cli::try_parse_from(["platter", "-c", "/etc/platter.toml", "list", "--json"]).unwrap();
    assert!(matches!(cli.command, Some(Command::List { json: true })));
    assert_eq!(cli.config, PathBuf::from("/etc/platter.toml"));

    let cli =
      Cli::try_parse_from(["platter", "parse-url", "https://open.spotify.com/album/x"]).unwrap();
    assert!(matches!(cli.command, Some(Command::ParseUrl { .. })));
  }

  #[test]
  fn parse_url_rejects_foreign_links() {
    assert!(parse_url("https://example.com/track/x").is_err());
    assert!(parse_url("https://open.spotify.com/track/x").is_ok());
  }

  #[tokio::test]
  async fn first_run_bootstraps_with_scanned_card() {
    let dir = tempfile::TempDir::new().unwrap();
    let settings = Settings {
      registry_path:    dir.path().join("rfid.csv"),
      device_id:        None,
      max_url_attempts: 3,
      spotify:          None,
    };

    let mut console = Console::new(&b"not-a-card\n99\n"[..]);
    let store = open_or_bootstrap(&settings, &mut console).await.unwrap().unwrap();
    assert_eq!(store.registry().sentinel().unwrap().token_id(), TokenId(99));

    // Second open finds the file and does not read input.
    let mut closed = Console::new(&b""[..]);
    let store = open_or_bootstrap(&settings, &mut closed).await.unwrap().unwrap();
    assert_eq!(store.registry().len(), 1);
  }

  #[tokio::test]
  async fn bootstrap_needs_a_card() {
    let dir = tempfile::TempDir::new().unwrap();
    let settings = Settings {
      registry_path:    dir.path().join("rfid.csv"),
      device_id:        None,
      max_url_attempts: 3,
      spotify:          None,
    };
    let mut console = Console::new(&b""[..]);
    assert!(open_or_bootstrap(&settings, &mut console).await.unwrap().is_none());
    assert!(!settings.registry_path.exists());
  }
}
