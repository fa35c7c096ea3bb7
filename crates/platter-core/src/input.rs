//! Traits for the two sources of human input: card scans and typed links.

use crate::binding::TokenId;

/// A card reader.
pub trait TokenReader {
  /// Block until a card is presented and return its identifier.
  ///
  /// Implementations retry unreadable or malformed scans themselves and only
  /// return `None` once the underlying device or stream is gone for good.
  async fn read(&mut self) -> Option<TokenId>;
}

/// The free-text prompt used to ask for a share link while enrolling a card.
pub trait UrlPrompt {
  /// Ask for one link. `None` means no more input will ever arrive.
  async fn prompt(&mut self) -> Option<String>;
}
