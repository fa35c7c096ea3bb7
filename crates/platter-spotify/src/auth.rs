//! OAuth access tokens from a long-lived refresh token.
//!
//! Playback control needs a user token, so the client is configured with a
//! refresh token obtained once through the authorization-code flow. Access
//! tokens are requested from the accounts service on demand and reused until
//! a minute before they expire.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{Result, client::ensure_success};

/// Refresh a cached token this long before Spotify says it expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Application credentials plus the user's refresh token.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub client_id:     String,
  pub client_secret: String,
  pub refresh_token: String,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token:  String,
  expires_in:    u64,
  /// Present only when Spotify rotates the refresh token.
  #[serde(default)]
  refresh_token: Option<String>,
}

struct AccessToken {
  value:      String,
  expires_at: Instant,
}

struct TokenState {
  refresh_token: String,
  access:        Option<AccessToken>,
}

/// Shared access-token cache; one refresh at a time.
pub(crate) struct TokenCache {
  client_id:     String,
  client_secret: String,
  state:         Mutex<TokenState>,
}

impl TokenCache {
  pub(crate) fn new(credentials: Credentials) -> Self {
    Self {
      client_id:     credentials.client_id,
      client_secret: credentials.client_secret,
      state:         Mutex::new(TokenState {
        refresh_token: credentials.refresh_token,
        access:        None,
      }),
    }
  }

  /// A valid access token, refreshing it first if needed.
  pub(crate) async fn access_token(&self, http: &Client, accounts_base: &str) -> Result<String> {
    let mut state = self.state.lock().await;
    if let Some(token) = &state.access
      && token.expires_at > Instant::now()
    {
      return Ok(token.value.clone());
    }

    let url = format!("{}/api/token", accounts_base.trim_end_matches('/'));
    let resp = http
      .post(&url)
      .basic_auth(&self.client_id, Some(&self.client_secret))
      .form(&[
        ("grant_type", "refresh_token"),
        ("refresh_token", state.refresh_token.as_str()),
      ])
      .send()
      .await?;
    let body: TokenResponse = ensure_success(resp, "POST /api/token").await?.json().await?;

    if let Some(rotated) = body.refresh_token {
      state.refresh_token = rotated;
    }
    let lifetime = Duration::from_secs(body.expires_in).saturating_sub(EXPIRY_MARGIN);
    state.access = Some(AccessToken {
      value:      body.access_token.clone(),
      expires_at: Instant::now() + lifetime,
    });

    debug!(valid_for = ?lifetime, "spotify access token refreshed");
    Ok(body.access_token)
  }

  /// Forget the cached access token, e.g. after the API rejected it.
  pub(crate) async fn invalidate(&self) { self.state.lock().await.access = None; }
}
