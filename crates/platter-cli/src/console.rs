//! Line-oriented card reader and link prompt.
//!
//! USB RFID readers in keyboard mode "type" the card number followed by
//! Enter, so a card scan and a typed link both arrive as one line of input.

use std::io::Write as _;

use platter_core::{
  binding::TokenId,
  input::{TokenReader, UrlPrompt},
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

pub struct Console<R> {
  lines: Lines<R>,
}

impl Console<BufReader<Stdin>> {
  pub fn stdin() -> Self { Self::new(BufReader::new(tokio::io::stdin())) }
}

impl<R: AsyncBufRead + Unpin> Console<R> {
  pub fn new(reader: R) -> Self { Self { lines: reader.lines() } }

  /// Print `prompt` and wait for the next line. `None` at end of input.
  async fn line(&mut self, prompt: &str) -> Option<String> {
    print!("{prompt}");
    std::io::stdout().flush().ok();
    match self.lines.next_line().await {
      Ok(line) => line,
      Err(e) => {
        warn!(error = %e, "failed to read input");
        None
      }
    }
  }
}

impl<R: AsyncBufRead + Unpin> TokenReader for Console<R> {
  async fn read(&mut self) -> Option<TokenId> {
    loop {
      let line = self.line("Scan RFID card: ").await?;
      let line = line.trim();
      if line.is_empty() {
        continue;
      }
      match line.parse::<TokenId>() {
        Ok(card) => {
          info!(%card, "card scanned");
          return Some(card);
        }
        Err(_) => warn!(input = %line, "invalid entry, try again"),
      }
    }
  }
}

impl<R: AsyncBufRead + Unpin> UrlPrompt for Console<R> {
  async fn prompt(&mut self) -> Option<String> {
    self
      .line("Enter new Spotify link: ")
      .await
      .map(|l| l.trim().to_owned())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn skips_invalid_and_blank_lines() {
    let mut console = Console::new(&b"\nO\n  12345  \n"[..]);
    assert_eq!(console.read().await, Some(TokenId(12345)));
    assert_eq!(console.read().await, None);
  }

  #[tokio::test]
  async fn cards_and_links_share_one_stream() {
    let mut console =
      Console::new(&b"42\r\n https://open.spotify.com/track/x \n7\n"[..]);
    assert_eq!(console.read().await, Some(TokenId(42)));
    assert_eq!(
      console.prompt().await.as_deref(),
      Some("https://open.spotify.com/track/x")
    );
    assert_eq!(console.read().await, Some(TokenId(7)));
    assert_eq!(console.prompt().await, None);
  }
}
