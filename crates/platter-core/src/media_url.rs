//! Spotify share-link parser.
//!
//! Turns a web link such as `https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy?si=…`
//! into the canonical `spotify:album:4aawyAB9vmqN3uQ7FjRGTy` reference that is
//! stored in the registry and handed to the player. Pure; no network access.
//!
//! The kind is always the first path component, so localized links such as
//! `https://open.spotify.com/intl-de/track/…` yield the kind `intl-de` and are
//! refused at enrollment. [`MediaUrl::has_locale_segment`] detects them so the
//! caller can tell the user to drop the segment.

use crate::{Error, Result};

/// Every accepted link starts with this prefix.
pub const WEB_PREFIX: &str = "https://open.spotify.com/";

/// URI scheme of canonical media references.
pub const SCHEME: &str = "spotify";

const LOCALE_PREFIX: &str = "intl-";

/// The two path components extracted from a share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrl {
  /// First path component, e.g. `track`. Not checked against the known kinds;
  /// that happens when the link is enrolled.
  pub kind: String,
  /// Second path component with any query string or fragment removed.
  pub id:   String,
}

impl MediaUrl {
  /// The canonical `spotify:<kind>:<id>` reference.
  pub fn media_ref(&self) -> String { format!("{SCHEME}:{}:{}", self.kind, self.id) }

  /// Whether the link carries a locale segment (`intl-xx`) where the kind
  /// should be.
  pub fn has_locale_segment(&self) -> bool { self.kind.starts_with(LOCALE_PREFIX) }
}

/// Parse a share link. Surrounding whitespace is ignored.
pub fn parse(url: &str) -> Result<MediaUrl> {
  let url = url.trim();
  let rest = url
    .strip_prefix(WEB_PREFIX)
    .ok_or_else(|| Error::InvalidMediaUrl(format!("{url:?} is not a {WEB_PREFIX} link")))?;

  let (kind, tail) = rest
    .split_once('/')
    .ok_or_else(|| Error::InvalidMediaUrl(format!("{url:?} has no media id")))?;

  let id = tail
    .split(['/', '?', '#'])
    .next()
    .unwrap_or_default();

  if kind.is_empty() || kind.contains(['?', '#']) {
    return Err(Error::InvalidMediaUrl(format!("{url:?} has no media type")));
  }
  if id.is_empty() {
    return Err(Error::InvalidMediaUrl(format!("{url:?} has no media id")));
  }

  Ok(MediaUrl { kind: kind.to_owned(), id: id.to_owned() })
}
