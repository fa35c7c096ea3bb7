//! Encoding and decoding between [`BindingRecord`]s and CSV text.
//!
//! Pipeline:
//!   raw &str
//!     └─ split_rows()       → Vec<Row>          (RFC 4180 quoting)
//!          └─ check header  → column order fixed by [`HEADER`]
//!               └─ decode_row() → BindingRecord
//!
//! Fields containing a comma, a double quote, or a line break are written
//! inside double quotes with embedded quotes doubled. Both LF and CRLF line
//! endings are accepted on input; output always uses LF.

use std::borrow::Cow;

use platter_core::binding::{BindingRecord, MediaKind, SENTINEL_LITERAL, TokenId};

use crate::{Error, Result};

/// Column names, in file order.
pub const HEADER: [&str; 5] = ["RFID", "Media Type", "Item", "Media Name", "Artist Name"];

// ─── Encoding ────────────────────────────────────────────────────────────────

fn encode_field(field: &str) -> Cow<'_, str> {
  if field.contains([',', '"', '\n', '\r']) {
    Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
  } else {
    Cow::Borrowed(field)
  }
}

fn encode_line<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
  let mut line = fields
    .into_iter()
    .map(encode_field)
    .collect::<Vec<_>>()
    .join(",");
  line.push('\n');
  line
}

pub fn encode_header() -> String { encode_line(HEADER) }

/// One row, newline-terminated.
pub fn encode_record(record: &BindingRecord) -> String {
  let token = record.token_id().to_string();
  encode_line([
    token.as_str(),
    record.media_kind().as_ref(),
    record.media_ref(),
    record.media_name(),
    record.artist_name(),
  ])
}

/// Header plus every record, in order.
pub fn encode_table<'a>(records: impl IntoIterator<Item = &'a BindingRecord>) -> String {
  let mut out = encode_header();
  for record in records {
    out.push_str(&encode_record(record));
  }
  out
}

// ─── Tokenizer ───────────────────────────────────────────────────────────────

/// A parsed row and the (1-based) line it started on.
struct Row {
  line:   usize,
  fields: Vec<String>,
}

impl Row {
  fn is_blank(&self) -> bool { self.fields.len() == 1 && self.fields[0].is_empty() }
}

fn split_rows(input: &str) -> Result<Vec<Row>> {
  let mut rows = Vec::new();
  let mut fields = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  let mut line = 1usize;
  let mut row_start = 1usize;
  let mut chars = input.chars().peekable();

  while let Some(c) = chars.next() {
    if in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          chars.next();
          field.push('"');
        }
        '"' => in_quotes = false,
        '\n' => {
          line += 1;
          field.push(c);
        }
        _ => field.push(c),
      }
      continue;
    }

    match c {
      '"' if field.is_empty() => in_quotes = true,
      ',' => fields.push(std::mem::take(&mut field)),
      '\r' if chars.peek() == Some(&'\n') => {}
      '\n' | '\r' => {
        fields.push(std::mem::take(&mut field));
        rows.push(Row { line: row_start, fields: std::mem::take(&mut fields) });
        line += 1;
        row_start = line;
      }
      _ => field.push(c),
    }
  }

  if in_quotes {
    return Err(Error::Malformed {
      line:   row_start,
      reason: "unterminated quoted field".to_owned(),
    });
  }
  if !field.is_empty() || !fields.is_empty() {
    fields.push(field);
    rows.push(Row { line: row_start, fields });
  }

  rows.retain(|r| !r.is_blank());
  Ok(rows)
}

// ─── Decoding ────────────────────────────────────────────────────────────────

fn decode_row(row: Row) -> Result<BindingRecord> {
  let Row { line, fields } = row;
  let malformed = |reason: String| Error::Malformed { line, reason };

  let [token, kind, item, name, artist]: [String; 5] = fields
    .try_into()
    .map_err(|f: Vec<String>| malformed(format!("expected 5 columns, found {}", f.len())))?;

  let token_id: TokenId = token
    .parse()
    .map_err(|_| malformed(format!("RFID {token:?} is not a number")))?;

  if kind == SENTINEL_LITERAL {
    return Ok(BindingRecord::sentinel(token_id));
  }

  let kind = MediaKind::playable(&kind)
    .ok_or_else(|| malformed(format!("unknown media type {kind:?}")))?;

  BindingRecord::new(token_id, kind, item, name, artist)
    .map_err(|e| malformed(e.to_string()))
}

/// Decode a whole file. The header must match [`HEADER`] exactly.
pub fn decode_table(input: &str) -> Result<Vec<BindingRecord>> {
  let mut rows = split_rows(input)?.into_iter();

  let header = rows.next().ok_or_else(|| Error::Header(String::new()))?;
  if header.fields != HEADER {
    return Err(Error::Header(header.fields.join(",")));
  }

  rows.map(decode_row).collect()
}
