//! The resolution state machine.
//!
//! Given a scanned card, [`Resolver::resolve`] decides whether the card is a
//! known binding, an unknown card that must be enrolled, or the rebind card,
//! and drives the store and catalog to produce the record to play.
//!
//! ```text
//! Idle ─▶ Resolving(card) ─┬─▶ Resolved(record)                 known card
//!                          ├─▶ Enrolling(card) ─┬─▶ Resolved     unknown card
//!                          │                    └─▶ EnrollmentAborted
//!                          └─▶ Rebinding(card) ─▶ Enrolling(other) ─▶ …
//! ```
//!
//! No failure escapes `resolve`: every error is logged and turned into `None`
//! so the caller's read loop can simply wait for the next scan.

use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  binding::{BindingRecord, MediaKind, TokenId},
  input::{TokenReader, UrlPrompt},
  media::MediaCatalog,
  media_url,
  store::RegistryStore,
};

// ─── State ───────────────────────────────────────────────────────────────────

/// Where the state machine stands after the most recent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
  Idle,
  Resolving(TokenId),
  Enrolling(TokenId),
  /// The rebind card was scanned; the payload is the rebind card's id.
  Rebinding(TokenId),
  Resolved(BindingRecord),
  EnrollmentAborted,
}

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ResolverConfig {
  /// How many links an enrollment accepts before giving up when every link
  /// entered is already bound to another card.
  pub max_url_attempts: usize,
}

impl Default for ResolverConfig {
  fn default() -> Self { Self { max_url_attempts: 3 } }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

pub struct Resolver<S, I, C> {
  store:   S,
  input:   I,
  catalog: C,
  config:  ResolverConfig,
  state:   State,
}

impl<S, I, C> Resolver<S, I, C>
where
  S: RegistryStore,
  I: TokenReader + UrlPrompt,
  C: MediaCatalog,
{
  pub fn new(store: S, input: I, catalog: C) -> Self {
    Self { store, input, catalog, config: ResolverConfig::default(), state: State::Idle }
  }

  pub fn with_config(mut self, config: ResolverConfig) -> Self {
    self.config = config;
    self
  }

  pub fn state(&self) -> &State { &self.state }

  pub fn store(&self) -> &S { &self.store }

  /// The card reader / prompt, for the caller's own read loop.
  pub fn input_mut(&mut self) -> &mut I { &mut self.input }

  /// Resolve a scanned card into the record to play.
  ///
  /// Returns `None` when no playable record came out of the scan: the
  /// enrollment or rebind was aborted, or the rebind card had nothing to
  /// overwrite.
  pub async fn resolve(&mut self, token_id: TokenId) -> Option<BindingRecord> {
    self.transition(State::Resolving(token_id));

    let existing = self.store.registry().get(token_id).cloned();
    match existing {
      None => {
        info!(card = %token_id, "card not registered, enrolling");
        self.transition(State::Enrolling(token_id));
        match self.enroll(token_id).await {
          Ok(record) => self.settle(record),
          Err(e) => self.abort(format_args!("failed to create a new entry: {e}")),
        }
      }
      Some(record) if !record.is_sentinel() => {
        info!(%record, "card found");
        self.settle(record)
      }
      Some(_) if !self.store.registry().has_bindings() => {
        self.abort(format_args!("no entries to overwrite, register a card first"))
      }
      Some(_) => {
        info!("rebind activated, scan the card to overwrite");
        self.transition(State::Rebinding(token_id));
        self.rebind(token_id).await
      }
    }
  }

  // ── Sub-flows ─────────────────────────────────────────────────────────────

  /// Replace the binding of a second card. The old record is deleted before
  /// the new link is asked for, so a failed enrollment leaves the card
  /// unregistered.
  async fn rebind(&mut self, sentinel: TokenId) -> Option<BindingRecord> {
    let target = loop {
      match self.input.read().await {
        None => return self.abort(format_args!("card reader closed during rebind")),
        Some(token) if token == sentinel => {
          warn!("the rebind card cannot be overwritten, scan a different card");
        }
        Some(token) => break token,
      }
    };

    if !self.store.contains(target) {
      return self.abort(format_args!("card {target} not found in the registry"));
    }

    match self.store.delete(target) {
      Ok(old) => info!(%old, "entry deleted"),
      Err(e) => return self.abort(format_args!("could not delete card {target}: {e}")),
    }

    self.transition(State::Enrolling(target));
    match self.enroll(target).await {
      Ok(record) => {
        info!(card = %target, "entry successfully overwritten");
        self.settle(record)
      }
      Err(e) => self.abort(format_args!("failed to overwrite card {target}: {e}")),
    }
  }

  /// Ask for a link, resolve its metadata and persist the new record.
  ///
  /// Nothing is written unless every step before the insert succeeded.
  async fn enroll(&mut self, token_id: TokenId) -> Result<BindingRecord> {
    let max_attempts = self.config.max_url_attempts.max(1);
    let mut attempt = 0;

    let (kind, media_ref) = loop {
      attempt += 1;
      let url = self
        .input
        .prompt()
        .await
        .ok_or_else(|| Error::EnrollmentAborted("no link entered".to_owned()))?;

      let parsed = media_url::parse(&url)?;
      let Some(kind) = MediaKind::playable(&parsed.kind) else {
        if parsed.has_locale_segment() {
          warn!(segment = %parsed.kind, "remove the locale segment from the link and try again");
        }
        return Err(Error::UnsupportedMediaKind(parsed.kind));
      };
      let media_ref = parsed.media_ref();

      let Some(existing) = self.store.registry().find_media_ref(&media_ref) else {
        break (kind, media_ref);
      };
      let duplicate = Error::DuplicateMediaRef { media_ref, token_id: existing.token_id() };
      if attempt >= max_attempts {
        return Err(duplicate);
      }
      warn!(attempt, max_attempts, "{duplicate}, enter a different link");
    };

    let info = self
      .catalog
      .resolve(kind, &media_ref)
      .await
      .map_err(|e| Error::Catalog(Box::new(e)))?;

    let record =
      BindingRecord::new(token_id, kind, media_ref, info.media_name, info.artist_name)?;
    self
      .store
      .insert(record.clone())
      .map_err(|e| Error::Store(Box::new(e)))?;

    info!(%record, "new entry created");
    Ok(record)
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  fn transition(&mut self, next: State) {
    debug!(from = ?self.state, to = ?next, "resolver transition");
    self.state = next;
  }

  fn settle(&mut self, record: BindingRecord) -> Option<BindingRecord> {
    self.transition(State::Resolved(record.clone()));
    Some(record)
  }

  fn abort(&mut self, reason: std::fmt::Arguments<'_>) -> Option<BindingRecord> {
    warn!("{reason}");
    self.transition(State::EnrollmentAborted);
    None
  }
}
