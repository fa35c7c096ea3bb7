//! [`Registry`] — the in-memory, invariant-checked view of all bindings.
//!
//! Storage backends hold a `Registry` as their authoritative copy and rebuild
//! it from disk after every mutation. All uniqueness and sentinel rules live
//! here so that every backend enforces them identically.

use std::collections::{HashMap, HashSet};

use crate::{
  Error, Result,
  binding::{BindingRecord, TokenId},
};

/// The ordered collection of binding records.
///
/// Always contains exactly one sentinel (rebind card) record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
  records: Vec<BindingRecord>,
  index:   HashMap<TokenId, usize>,
}

impl Registry {
  /// A fresh registry holding only the rebind card.
  pub fn bootstrap(sentinel: TokenId) -> Self {
    Self::from_trusted(vec![BindingRecord::sentinel(sentinel)])
  }

  /// Rebuild a registry from records read back from storage, rejecting any
  /// collection that breaks an invariant.
  pub fn from_records(records: Vec<BindingRecord>) -> Result<Self> {
    let sentinels = records.iter().filter(|r| r.is_sentinel()).count();
    if sentinels != 1 {
      return Err(Error::CorruptRegistry(format!(
        "expected exactly one rebind card, found {sentinels}"
      )));
    }

    let mut refs: HashMap<&str, TokenId> = HashMap::new();
    let mut seen: HashSet<TokenId> = HashSet::new();
    for record in &records {
      if !seen.insert(record.token_id()) {
        return Err(Error::CorruptRegistry(format!(
          "token {} appears more than once",
          record.token_id()
        )));
      }
      if record.is_sentinel() {
        continue;
      }
      if let Some(other) = refs.insert(record.media_ref(), record.token_id()) {
        return Err(Error::CorruptRegistry(format!(
          "{} is bound to both {other} and {}",
          record.media_ref(),
          record.token_id()
        )));
      }
    }

    Ok(Self::from_trusted(records))
  }

  fn from_trusted(records: Vec<BindingRecord>) -> Self {
    let index = records
      .iter()
      .enumerate()
      .map(|(i, r)| (r.token_id(), i))
      .collect();
    Self { records, index }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn records(&self) -> &[BindingRecord] { &self.records }

  pub fn len(&self) -> usize { self.records.len() }

  /// Never true for a registry built through this type's constructors.
  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn contains(&self, token_id: TokenId) -> bool { self.index.contains_key(&token_id) }

  pub fn get(&self, token_id: TokenId) -> Option<&BindingRecord> {
    self.index.get(&token_id).map(|&i| &self.records[i])
  }

  /// Like [`get`](Self::get) but failing with [`Error::NotFound`].
  pub fn lookup(&self, token_id: TokenId) -> Result<&BindingRecord> {
    self.get(token_id).ok_or(Error::NotFound(token_id))
  }

  /// The rebind card's record.
  pub fn sentinel(&self) -> Option<&BindingRecord> {
    self.records.iter().find(|r| r.is_sentinel())
  }

  /// Whether any card other than the rebind card is registered.
  pub fn has_bindings(&self) -> bool { self.records.iter().any(|r| !r.is_sentinel()) }

  /// The non-sentinel record bound to `media_ref`, if any.
  pub fn find_media_ref(&self, media_ref: &str) -> Option<&BindingRecord> {
    self
      .records
      .iter()
      .find(|r| !r.is_sentinel() && r.media_ref() == media_ref)
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Check that `record` could be inserted without modifying anything.
  pub fn check_insert(&self, record: &BindingRecord) -> Result<()> {
    if self.contains(record.token_id()) {
      return Err(Error::DuplicateToken(record.token_id()));
    }
    if record.is_sentinel() {
      return Err(Error::InvalidRecord("the registry already has a rebind card"));
    }
    if let Some(existing) = self.find_media_ref(record.media_ref()) {
      return Err(Error::DuplicateMediaRef {
        media_ref: record.media_ref().to_owned(),
        token_id:  existing.token_id(),
      });
    }
    Ok(())
  }

  /// Check that `token_id` could be deleted without modifying anything.
  pub fn check_remove(&self, token_id: TokenId) -> Result<()> {
    if self.lookup(token_id)?.is_sentinel() {
      return Err(Error::CannotDeleteSentinel(token_id));
    }
    Ok(())
  }

  pub fn insert(&mut self, record: BindingRecord) -> Result<()> {
    self.check_insert(&record)?;
    self.index.insert(record.token_id(), self.records.len());
    self.records.push(record);
    Ok(())
  }

  /// Remove and return the record for `token_id`, preserving the order of
  /// the remaining records.
  pub fn remove(&mut self, token_id: TokenId) -> Result<BindingRecord> {
    self.check_remove(token_id)?;
    let position = self.index[&token_id];
    let removed = self.records.remove(position);
    *self = Self::from_trusted(std::mem::take(&mut self.records));
    Ok(removed)
  }
}
