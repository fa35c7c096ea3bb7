//! Error type for `platter-store-csv`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("registry error: {0}")]
  Core(#[from] platter_core::Error),

  #[error("I/O error on {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("unexpected header {0:?}")]
  Header(String),

  #[error("line {line}: {reason}")]
  Malformed { line: usize, reason: String },

  /// The file read back after a write does not reflect that write.
  #[error("read-after-write check failed: {0}")]
  ReadAfterWrite(String),
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io { path: path.into(), source }
  }

  /// The registry-level error behind this one, if any.
  pub fn as_core(&self) -> Option<&platter_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
