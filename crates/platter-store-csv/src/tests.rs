//! Integration tests for `CsvStore` against files in a temporary directory.

use std::{fs, path::PathBuf};

use platter_core::{
  binding::{BindingRecord, MediaKind, TokenId},
  store::RegistryStore,
};
use tempfile::TempDir;

use crate::{CsvStore, Error};

const REBIND: TokenId = TokenId(1000);

fn registry_path(dir: &TempDir) -> PathBuf { dir.path().join("data").join("rfid.csv") }

fn store() -> (CsvStore, TempDir) {
  let dir = TempDir::new().unwrap();
  let store = CsvStore::bootstrap(registry_path(&dir), REBIND).unwrap();
  (store, dir)
}

fn track(token: u64, id: &str) -> BindingRecord {
  BindingRecord::new(
    TokenId(token),
    MediaKind::Track,
    format!("spotify:track:{id}"),
    format!("Song {id}"),
    "The Band",
  )
  .unwrap()
}

fn core_err(e: &Error) -> &platter_core::Error { e.as_core().expect("registry error") }

// ─── Load / bootstrap ────────────────────────────────────────────────────────

#[test]
fn load_missing_file_signals_bootstrap() {
  let dir = TempDir::new().unwrap();
  assert!(CsvStore::load(registry_path(&dir)).unwrap().is_none());
}

#[test]
fn bootstrap_writes_only_the_sentinel() {
  let (store, _dir) = store();
  assert_eq!(store.registry().len(), 1);
  assert_eq!(store.registry().records()[0].media_kind(), MediaKind::Rebind);

  let text = fs::read_to_string(store.path()).unwrap();
  assert_eq!(
    text,
    "RFID,Media Type,Item,Media Name,Artist Name\n1000,overwrite,overwrite,overwrite,overwrite\n"
  );
}

#[test]
fn bootstrap_twice_is_rejected() {
  let (store, _dir) = store();
  let err = CsvStore::bootstrap(store.path(), TokenId(5)).unwrap_err();
  assert!(matches!(core_err(&err), platter_core::Error::AlreadyInitialized));

  // The existing file is untouched.
  let reloaded = CsvStore::load(store.path()).unwrap().unwrap();
  assert_eq!(reloaded.registry().sentinel().unwrap().token_id(), REBIND);
}

#[test]
fn load_rejects_file_without_sentinel() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("rfid.csv");
  fs::write(&path, "RFID,Media Type,Item,Media Name,Artist Name\n1,track,spotify:track:a,A,B\n")
    .unwrap();

  let err = CsvStore::load(&path).unwrap_err();
  assert!(matches!(core_err(&err), platter_core::Error::CorruptRegistry(_)));
}

// ─── Insert ──────────────────────────────────────────────────────────────────

#[test]
fn insert_appends_and_survives_reload() {
  let (mut store, _dir) = store();
  store.insert(track(1, "a")).unwrap();
  store.insert(track(2, "b")).unwrap();

  let reloaded = CsvStore::load(store.path()).unwrap().unwrap();
  assert_eq!(reloaded.registry(), store.registry());
  assert_eq!(reloaded.lookup(TokenId(2)).unwrap(), &track(2, "b"));
}

#[test]
fn insert_keeps_header_and_earlier_rows() {
  let (mut store, _dir) = store();
  store.insert(track(1, "a")).unwrap();

  let text = fs::read_to_string(store.path()).unwrap();
  let lines: Vec<_> = text.lines().collect();
  assert_eq!(lines.len(), 3);
  assert_eq!(lines[0], "RFID,Media Type,Item,Media Name,Artist Name");
  assert_eq!(lines[2], "1,track,spotify:track:a,Song a,The Band");
}

#[test]
fn insert_duplicate_token_is_rejected() {
  let (mut store, _dir) = store();
  store.insert(track(1, "a")).unwrap();

  let err = store.insert(track(1, "b")).unwrap_err();
  assert!(matches!(core_err(&err), platter_core::Error::DuplicateToken(TokenId(1))));
}

#[test]
fn insert_duplicate_media_ref_leaves_file_unchanged() {
  let (mut store, _dir) = store();
  store.insert(track(1, "a")).unwrap();
  let before = fs::read_to_string(store.path()).unwrap();

  let err = store.insert(track(2, "a")).unwrap_err();
  assert!(matches!(
    core_err(&err),
    platter_core::Error::DuplicateMediaRef { token_id: TokenId(1), .. }
  ));
  assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
  assert_eq!(store.registry().len(), 2);
}

#[test]
fn insert_picks_up_rows_written_by_someone_else() {
  let (mut store, _dir) = store();
  let mut file = fs::OpenOptions::new().append(true).open(store.path()).unwrap();
  std::io::Write::write_all(&mut file, b"7,album,spotify:album:x,X,Y\n").unwrap();

  store.insert(track(1, "a")).unwrap();
  assert!(store.contains(TokenId(7)));
  assert_eq!(store.registry().len(), 3);
}

#[test]
fn insert_after_unterminated_last_row() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("rfid.csv");
  fs::write(
    &path,
    "RFID,Media Type,Item,Media Name,Artist Name\n5,overwrite,overwrite,overwrite,overwrite",
  )
  .unwrap();

  let mut store = CsvStore::load(&path).unwrap().unwrap();
  store.insert(track(1, "a")).unwrap();
  assert_eq!(
    fs::read_to_string(&path).unwrap(),
    "RFID,Media Type,Item,Media Name,Artist Name\n5,overwrite,overwrite,overwrite,overwrite\n\
     1,track,spotify:track:a,Song a,The Band\n"
  );

  let reloaded = CsvStore::load(&path).unwrap().unwrap();
  assert_eq!(reloaded.registry().len(), 2);
  assert_eq!(reloaded.lookup(TokenId(1)).unwrap(), &track(1, "a"));
}

#[test]
fn insert_after_crlf_file_adds_no_blank_row() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("rfid.csv");
  fs::write(
    &path,
    "RFID,Media Type,Item,Media Name,Artist Name\r\n5,overwrite,overwrite,overwrite,overwrite\r\n",
  )
  .unwrap();

  let mut store = CsvStore::load(&path).unwrap().unwrap();
  store.insert(track(1, "a")).unwrap();
  let text = fs::read_to_string(&path).unwrap();
  assert!(text.ends_with("overwrite\r\n1,track,spotify:track:a,Song a,The Band\n"));
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[test]
fn delete_rewrites_the_file() {
  let (mut store, _dir) = store();
  store.insert(track(1, "a")).unwrap();
  store.insert(track(2, "b")).unwrap();

  let removed = store.delete(TokenId(1)).unwrap();
  assert_eq!(removed, track(1, "a"));
  assert!(!store.contains(TokenId(1)));

  let reloaded = CsvStore::load(store.path()).unwrap().unwrap();
  let ids: Vec<_> = reloaded.registry().records().iter().map(|r| r.token_id()).collect();
  assert_eq!(ids, vec![REBIND, TokenId(2)]);
}

#[test]
fn delete_then_insert_replaces_binding() {
  let (mut store, _dir) = store();
  store.insert(track(1, "a")).unwrap();

  store.delete(TokenId(1)).unwrap();
  store.insert(track(1, "b")).unwrap();

  let reloaded = CsvStore::load(store.path()).unwrap().unwrap();
  assert_eq!(reloaded.registry().len(), 2);
  assert_eq!(reloaded.lookup(TokenId(1)).unwrap().media_ref(), "spotify:track:b");
}

#[test]
fn delete_sentinel_is_rejected() {
  let (mut store, _dir) = store();
  store.insert(track(1, "a")).unwrap();

  let err = store.delete(REBIND).unwrap_err();
  assert!(matches!(core_err(&err), platter_core::Error::CannotDeleteSentinel(REBIND)));
  assert_eq!(store.registry().len(), 2);
}

#[test]
fn delete_unknown_card_is_not_found() {
  let (mut store, _dir) = store();
  let err = store.delete(TokenId(9)).unwrap_err();
  assert!(matches!(core_err(&err), platter_core::Error::NotFound(TokenId(9))));
}

#[test]
fn delete_leaves_no_temp_files_behind() {
  let (mut store, _dir) = store();
  store.insert(track(1, "a")).unwrap();
  store.delete(TokenId(1)).unwrap();

  let entries = fs::read_dir(store.path().parent().unwrap()).unwrap().count();
  assert_eq!(entries, 1);
}
