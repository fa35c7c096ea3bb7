//! Binding records — the association of one card with one playable item.
//!
//! Records are immutable. A rebind is modelled as delete-then-insert, never as
//! an in-place update, so the only ways to obtain a record are the validating
//! constructors below.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Literal used for every column of the rebind card's row.
pub const SENTINEL_LITERAL: &str = "overwrite";

// ─── Token ───────────────────────────────────────────────────────────────────

/// The numeric identifier read from an RFID card.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl FromStr for TokenId {
  type Err = std::num::ParseIntError;

  fn from_str(s: &str) -> Result<Self, Self::Err> { s.trim().parse().map(Self) }
}

impl From<u64> for TokenId {
  fn from(id: u64) -> Self { Self(id) }
}

// ─── Media kind ──────────────────────────────────────────────────────────────

/// What a card points at. `Rebind` marks the single rebind card.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
  Track,
  Album,
  Playlist,
  #[serde(rename = "overwrite")]
  #[strum(serialize = "overwrite")]
  Rebind,
}

impl MediaKind {
  /// Parse a kind that may be enrolled: `track`, `album` or `playlist`.
  pub fn playable(s: &str) -> Option<Self> {
    match s.parse() {
      Ok(Self::Rebind) | Err(_) => None,
      Ok(kind) => Some(kind),
    }
  }

  pub fn is_sentinel(self) -> bool { matches!(self, Self::Rebind) }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One row of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingRecord {
  token_id:    TokenId,
  media_kind:  MediaKind,
  media_ref:   String,
  media_name:  String,
  artist_name: String,
}

impl BindingRecord {
  /// Build an ordinary (playable) binding.
  ///
  /// `media_ref` and `media_name` must be non-empty; `artist_name` may be
  /// empty when the catalog has no artist to report.
  pub fn new(
    token_id: TokenId,
    media_kind: MediaKind,
    media_ref: impl Into<String>,
    media_name: impl Into<String>,
    artist_name: impl Into<String>,
  ) -> Result<Self> {
    if media_kind.is_sentinel() {
      return Err(Error::InvalidRecord(
        "the rebind card is created with BindingRecord::sentinel",
      ));
    }
    let media_ref = media_ref.into();
    if media_ref.trim().is_empty() {
      return Err(Error::InvalidRecord("media reference is empty"));
    }
    let media_name = media_name.into();
    if media_name.trim().is_empty() {
      return Err(Error::InvalidRecord("media name is empty"));
    }

    Ok(Self {
      token_id,
      media_kind,
      media_ref,
      media_name,
      artist_name: artist_name.into(),
    })
  }

  /// The rebind card's record: every descriptive column holds `overwrite`.
  pub fn sentinel(token_id: TokenId) -> Self {
    Self {
      token_id,
      media_kind:  MediaKind::Rebind,
      media_ref:   SENTINEL_LITERAL.to_owned(),
      media_name:  SENTINEL_LITERAL.to_owned(),
      artist_name: SENTINEL_LITERAL.to_owned(),
    }
  }

  pub fn token_id(&self) -> TokenId { self.token_id }

  pub fn media_kind(&self) -> MediaKind { self.media_kind }

  pub fn media_ref(&self) -> &str { &self.media_ref }

  pub fn media_name(&self) -> &str { &self.media_name }

  pub fn artist_name(&self) -> &str { &self.artist_name }

  pub fn is_sentinel(&self) -> bool { self.media_kind.is_sentinel() }
}

impl fmt::Display for BindingRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_sentinel() {
      return write!(f, "{} → rebind card", self.token_id);
    }
    write!(
      f,
      "{} → {} \"{}\" by {} ({})",
      self.token_id, self.media_kind, self.media_name, self.artist_name, self.media_ref
    )
  }
}
