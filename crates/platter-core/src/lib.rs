//! Core types and trait definitions for Platter.
//!
//! Platter binds RFID cards to streaming-media references and plays the bound
//! media when a card is scanned. This crate holds the registry model, the
//! resolution state machine, and the traits for every outside collaborator
//! (card reader, URL prompt, media catalog, player, durable store). It does no
//! I/O of its own.

// Collaborator traits use native `async fn`; the resolver awaits them on one
// task, so the returned futures need no `Send` bound.
#![allow(async_fn_in_trait)]

pub mod binding;
pub mod error;
pub mod input;
pub mod media;
pub mod media_url;
pub mod registry;
pub mod resolver;
pub mod store;

pub use error::{Error, Result};
