//! Error types for `platter-core`.

use thiserror::Error;

use crate::binding::TokenId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("token {0} is not registered")]
  NotFound(TokenId),

  #[error("token {0} is already registered")]
  DuplicateToken(TokenId),

  #[error("{media_ref} is already bound to token {token_id}")]
  DuplicateMediaRef { media_ref: String, token_id: TokenId },

  #[error("token {0} is the rebind card and cannot be deleted")]
  CannotDeleteSentinel(TokenId),

  #[error("registry already initialized")]
  AlreadyInitialized,

  #[error("invalid media URL: {0}")]
  InvalidMediaUrl(String),

  #[error("unsupported media type: {0:?}")]
  UnsupportedMediaKind(String),

  #[error("catalog error: {0}")]
  Catalog(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("enrollment aborted: {0}")]
  EnrollmentAborted(String),

  #[error("invalid binding record: {0}")]
  InvalidRecord(&'static str),

  #[error("corrupt registry: {0}")]
  CorruptRegistry(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
