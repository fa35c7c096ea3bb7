//! The `RegistryStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `platter-store-csv`).
//! The [`Resolver`](crate::resolver::Resolver) depends on this abstraction,
//! not on any concrete backend.

use crate::{
  Error,
  binding::{BindingRecord, TokenId},
  registry::Registry,
};

/// Durable storage for the registry.
///
/// Every mutation is persisted before it returns, and the backend's in-memory
/// [`Registry`] is re-read from storage afterwards, so a successful call
/// guarantees read-your-writes for subsequent lookups.
pub trait RegistryStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The current, authoritative view of the registry.
  fn registry(&self) -> &Registry;

  /// Persist a new record.
  ///
  /// Fails if the token is already registered or if the media reference is
  /// already bound to another card.
  fn insert(&mut self, record: BindingRecord) -> Result<(), Self::Error>;

  /// Remove the record for `token_id` and return it.
  ///
  /// Fails if the token is unknown or is the rebind card.
  fn delete(&mut self, token_id: TokenId) -> Result<BindingRecord, Self::Error>;

  // ── Provided reads ────────────────────────────────────────────────────────

  fn contains(&self, token_id: TokenId) -> bool { self.registry().contains(token_id) }

  fn lookup(&self, token_id: TokenId) -> Result<&BindingRecord, Error> {
    self.registry().lookup(token_id)
  }
}
