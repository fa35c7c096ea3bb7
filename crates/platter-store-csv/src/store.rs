//! [`CsvStore`] — the CSV-file implementation of [`RegistryStore`].

use std::{
  fs::{self, File, OpenOptions},
  io::{self, Read as _, Seek as _, SeekFrom, Write as _},
  path::{Path, PathBuf},
};

use platter_core::{
  binding::{BindingRecord, TokenId},
  registry::Registry,
  store::RegistryStore,
};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{
  Error, Result,
  codec::{decode_table, encode_record, encode_table},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A registry backed by a single CSV file.
///
/// The in-memory [`Registry`] is re-read from the file after every write and
/// checked against the write that was just made.
#[derive(Debug)]
pub struct CsvStore {
  path:     PathBuf,
  registry: Registry,
}

impl CsvStore {
  /// Load the registry at `path`.
  ///
  /// Returns `Ok(None)` when the file does not exist yet; the caller is then
  /// expected to run [`CsvStore::bootstrap`].
  pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
    let path = path.as_ref().to_path_buf();
    let Some(registry) = read_registry(&path)? else {
      return Ok(None);
    };
    debug!(path = %path.display(), records = registry.len(), "registry loaded");
    Ok(Some(Self { path, registry }))
  }

  /// Create a new registry file holding only the rebind card.
  ///
  /// Fails with [`platter_core::Error::AlreadyInitialized`] if the file exists.
  pub fn bootstrap(path: impl AsRef<Path>, sentinel: TokenId) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
      Ok(file) => file,
      Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
        return Err(platter_core::Error::AlreadyInitialized.into());
      }
      Err(e) => return Err(Error::io(&path, e)),
    };

    let registry = Registry::bootstrap(sentinel);
    file
      .write_all(encode_table(registry.records()).as_bytes())
      .and_then(|()| file.sync_all())
      .map_err(|e| Error::io(&path, e))?;

    let mut store = Self { path, registry };
    store.reload()?;
    if store.registry.sentinel().map(BindingRecord::token_id) != Some(sentinel) {
      return Err(Error::ReadAfterWrite(format!(
        "rebind card {sentinel} missing from new registry"
      )));
    }

    info!(path = %store.path.display(), card = %sentinel, "registry created");
    Ok(store)
  }

  pub fn path(&self) -> &Path { &self.path }

  /// Re-read the file, replacing the in-memory view.
  pub fn reload(&mut self) -> Result<()> {
    self.registry = read_registry(&self.path)?.ok_or_else(|| {
      Error::io(&self.path, io::Error::from(io::ErrorKind::NotFound))
    })?;
    Ok(())
  }

  /// Append one row to the end of the file. A last row left without its line
  /// break (e.g. by a hand edit) is terminated first.
  fn append(&self, record: &BindingRecord) -> Result<()> {
    let mut file = OpenOptions::new()
      .read(true)
      .append(true)
      .open(&self.path)
      .map_err(|e| Error::io(&self.path, e))?;

    let mut row = encode_record(record);
    if !ends_with_newline(&mut file).map_err(|e| Error::io(&self.path, e))? {
      row.insert(0, '\n');
    }
    file
      .write_all(row.as_bytes())
      .and_then(|()| file.sync_all())
      .map_err(|e| Error::io(&self.path, e))
  }

  /// Replace the whole file: write a sibling temp file, sync it, then rename
  /// it over the original.
  fn rewrite(&self, registry: &Registry) -> Result<()> {
    let dir = self
      .path
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .unwrap_or(Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    tmp
      .write_all(encode_table(registry.records()).as_bytes())
      .and_then(|()| tmp.as_file().sync_all())
      .map_err(|e| Error::io(tmp.path(), e))?;
    tmp
      .persist(&self.path)
      .map_err(|e| Error::io(&self.path, e.error))?;
    Ok(())
  }
}

/// Whether `file` is empty or ends with a line break.
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
  if file.metadata()?.len() == 0 {
    return Ok(true);
  }
  let mut last = [0u8; 1];
  file.seek(SeekFrom::End(-1))?;
  file.read_exact(&mut last)?;
  Ok(matches!(last[0], b'\n' | b'\r'))
}

fn read_registry(path: &Path) -> Result<Option<Registry>> {
  let text = match fs::read_to_string(path) {
    Ok(text) => text,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(Error::io(path, e)),
  };
  let records = decode_table(&text)?;
  Ok(Some(Registry::from_records(records)?))
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for CsvStore {
  type Error = Error;

  fn registry(&self) -> &Registry { &self.registry }

  fn insert(&mut self, record: BindingRecord) -> Result<()> {
    self.registry.check_insert(&record)?;
    self.append(&record)?;
    self.reload()?;

    if self.registry.get(record.token_id()) != Some(&record) {
      return Err(Error::ReadAfterWrite(format!(
        "card {} missing after append",
        record.token_id()
      )));
    }
    debug!(card = %record.token_id(), "record appended");
    Ok(())
  }

  fn delete(&mut self, token_id: TokenId) -> Result<BindingRecord> {
    let mut next = self.registry.clone();
    let removed = next.remove(token_id)?;
    self.rewrite(&next)?;
    self.reload()?;

    if self.registry.contains(token_id) {
      return Err(Error::ReadAfterWrite(format!(
        "card {token_id} still present after delete"
      )));
    }
    debug!(card = %token_id, "record deleted");
    Ok(removed)
  }
}
