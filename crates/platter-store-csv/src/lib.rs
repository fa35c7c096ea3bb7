//! CSV-file backend for the Platter registry.
//!
//! The registry lives in a single comma-separated file with a header row,
//! one row per card. Appends add a row; deletions rewrite the file through a
//! temporary file and an atomic rename.

mod codec;
mod store;

pub mod error;

pub use codec::HEADER;
pub use error::{Error, Result};
pub use store::CsvStore;

#[cfg(test)]
mod tests;
