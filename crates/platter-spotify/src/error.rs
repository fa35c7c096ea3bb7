//! Error type for `platter-spotify`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{context} → {status}: {body}")]
  Status {
    context: String,
    status:  reqwest::StatusCode,
    body:    String,
  },

  #[error("unexpected response from {context}: {reason}")]
  Response { context: String, reason: String },

  #[error("not a spotify reference: {0:?}")]
  InvalidRef(String),

  #[error("{0} has nothing to play")]
  NotPlayable(platter_core::binding::MediaKind),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
