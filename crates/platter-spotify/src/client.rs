//! Async HTTP client wrapping the Spotify Web API.

use std::{sync::Arc, time::Duration};

use platter_core::{
  binding::MediaKind,
  media::{MediaCatalog, MediaInfo, PLAYLIST_ARTIST, PlaybackTarget, Player},
  media_url::SCHEME,
};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
  Error, Result,
  auth::{Credentials, TokenCache},
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Connection settings, deserialised from the `[spotify]` config table.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyConfig {
  pub client_id:     String,
  pub client_secret: String,
  pub refresh_token: String,
  #[serde(default = "default_api_base")]
  pub api_base:      String,
  #[serde(default = "default_accounts_base")]
  pub accounts_base: String,
}

fn default_api_base() -> String { "https://api.spotify.com/v1".to_owned() }

fn default_accounts_base() -> String { "https://accounts.spotify.com".to_owned() }

// ─── Response shapes ─────────────────────────────────────────────────────────

/// The fields shared by track, album and playlist objects that we use.
#[derive(Debug, Deserialize)]
struct CatalogItem {
  name:    String,
  #[serde(default)]
  artists: Vec<Artist>,
}

#[derive(Debug, Deserialize)]
struct Artist {
  name: String,
}

/// A playback device as reported by `GET /me/player/devices`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Device {
  pub id:        Option<String>,
  pub name:      String,
  #[serde(rename = "type")]
  pub kind:      String,
  #[serde(default)]
  pub is_active: bool,
}

#[derive(Deserialize)]
struct DeviceList {
  devices: Vec<Device>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for the parts of the Web API Platter needs.
///
/// Cheap to clone — the inner [`reqwest::Client`] and the token cache are
/// `Arc`-based.
#[derive(Clone)]
pub struct SpotifyClient {
  http:   Client,
  config: Arc<SpotifyConfig>,
  tokens: Arc<TokenCache>,
}

impl SpotifyClient {
  pub fn new(config: SpotifyConfig) -> Result<Self> {
    let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
    let tokens = TokenCache::new(Credentials {
      client_id:     config.client_id.clone(),
      client_secret: config.client_secret.clone(),
      refresh_token: config.refresh_token.clone(),
    });
    Ok(Self { http, config: Arc::new(config), tokens: Arc::new(tokens) })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
  }

  async fn authed(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
    let token = self
      .tokens
      .access_token(&self.http, &self.config.accounts_base)
      .await?;
    Ok(req.bearer_auth(token))
  }

  /// Send `req` and map non-success statuses to [`Error::Status`]. A 401
  /// drops the cached access token so the next call refreshes it.
  async fn send(&self, req: reqwest::RequestBuilder, context: &str) -> Result<Response> {
    let resp = self.authed(req).await?.send().await?;
    if resp.status() == StatusCode::UNAUTHORIZED {
      self.tokens.invalidate().await;
    }
    ensure_success(resp, context).await
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  /// `GET /{tracks|albums|playlists}/{id}`
  pub async fn metadata(&self, kind: MediaKind, media_ref: &str) -> Result<MediaInfo> {
    let id = media_id(kind, media_ref)?;
    let path = format!("/{}/{id}", collection(kind)?);

    let item: CatalogItem = self
      .send(self.http.get(self.url(&path)), &format!("GET {path}"))
      .await?
      .json()
      .await?;

    let info = media_info(kind, item).ok_or_else(|| Error::Response {
      context: format!("GET {path}"),
      reason:  "no artist listed".to_owned(),
    })?;
    debug!(%media_ref, name = %info.media_name, "catalog lookup");
    Ok(info)
  }

  // ── Player ────────────────────────────────────────────────────────────────

  /// `PUT /me/player/play?device_id=<id>`
  pub async fn start_playback(&self, device_id: &str, target: &PlaybackTarget) -> Result<()> {
    let req = self
      .http
      .put(self.url("/me/player/play"))
      .query(&[("device_id", device_id)])
      .json(target);
    self.send(req, "PUT /me/player/play").await?;
    info!(device = %device_id, ?target, "playing");
    Ok(())
  }

  /// `GET /me/player/devices`
  pub async fn devices(&self) -> Result<Vec<Device>> {
    let list: DeviceList = self
      .send(self.http.get(self.url("/me/player/devices")), "GET /me/player/devices")
      .await?
      .json()
      .await?;
    Ok(list.devices)
  }
}

impl MediaCatalog for SpotifyClient {
  type Error = Error;

  async fn resolve(&self, kind: MediaKind, media_ref: &str) -> Result<MediaInfo> {
    self.metadata(kind, media_ref).await
  }
}

impl Player for SpotifyClient {
  type Error = Error;

  async fn play(&self, device_id: &str, kind: MediaKind, media_ref: &str) -> Result<()> {
    let target = PlaybackTarget::new(kind, media_ref).ok_or(Error::NotPlayable(kind))?;
    self.start_playback(device_id, &target).await
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

pub(crate) async fn ensure_success(resp: Response, context: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(Error::Status { context: context.to_owned(), status, body })
}

/// The bare id from `spotify:<kind>:<id>`; the kind in the reference must
/// match `kind`.
fn media_id(kind: MediaKind, media_ref: &str) -> Result<&str> {
  let invalid = || Error::InvalidRef(media_ref.to_owned());
  let mut parts = media_ref.splitn(3, ':');
  match (parts.next(), parts.next(), parts.next()) {
    (Some(scheme), Some(k), Some(id))
      if scheme == SCHEME && k == kind.as_ref() && !id.is_empty() =>
    {
      Ok(id)
    }
    _ => Err(invalid()),
  }
}

fn collection(kind: MediaKind) -> Result<&'static str> {
  match kind {
    MediaKind::Track => Ok("tracks"),
    MediaKind::Album => Ok("albums"),
    MediaKind::Playlist => Ok("playlists"),
    MediaKind::Rebind => Err(Error::NotPlayable(kind)),
  }
}

/// Name plus first artist; playlists report [`PLAYLIST_ARTIST`].
fn media_info(kind: MediaKind, item: CatalogItem) -> Option<MediaInfo> {
  let artist_name = match kind {
    MediaKind::Playlist => PLAYLIST_ARTIST.to_owned(),
    _ => item.artists.into_iter().next()?.name,
  };
  Some(MediaInfo { media_name: item.name, artist_name })
}
