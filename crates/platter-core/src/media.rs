//! Media catalog and player traits, plus the mapping from a binding to what
//! the player is asked to start.

use serde::Serialize;

use crate::binding::{BindingRecord, MediaKind};

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Display metadata returned by a [`MediaCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
  pub media_name:  String,
  pub artist_name: String,
}

/// Artist name reported for playlists, which have no single artist.
pub const PLAYLIST_ARTIST: &str = "Various Artists";

/// Looks up display metadata for a canonical media reference.
pub trait MediaCatalog {
  type Error: std::error::Error + Send + Sync + 'static;

  async fn resolve(
    &self,
    kind: MediaKind,
    media_ref: &str,
  ) -> Result<MediaInfo, Self::Error>;
}

// ─── Playback ────────────────────────────────────────────────────────────────

/// What a player should start: a list of individual items, or a collection
/// played as a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PlaybackTarget {
  Items { uris: Vec<String> },
  Context { context_uri: String },
}

impl PlaybackTarget {
  /// Tracks play as a single item, albums and playlists as a context. The
  /// rebind card has nothing to play.
  pub fn new(kind: MediaKind, media_ref: &str) -> Option<Self> {
    match kind {
      MediaKind::Track => Some(Self::Items { uris: vec![media_ref.to_owned()] }),
      MediaKind::Album | MediaKind::Playlist => {
        Some(Self::Context { context_uri: media_ref.to_owned() })
      }
      MediaKind::Rebind => None,
    }
  }

  pub fn for_record(record: &BindingRecord) -> Option<Self> {
    Self::new(record.media_kind(), record.media_ref())
  }
}

/// Starts playback on a device.
pub trait Player {
  type Error: std::error::Error + Send + Sync + 'static;

  async fn play(
    &self,
    device_id: &str,
    kind: MediaKind,
    media_ref: &str,
  ) -> Result<(), Self::Error>;
}
