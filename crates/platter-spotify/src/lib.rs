//! Spotify Web API client for Platter.
//!
//! [`SpotifyClient`] implements both [`platter_core::media::MediaCatalog`]
//! (metadata lookups for enrollment) and [`platter_core::media::Player`]
//! (starting playback on a device). Access tokens are obtained with the OAuth
//! refresh-token grant and cached until shortly before they expire.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::Credentials;
pub use client::{SpotifyClient, SpotifyConfig};
pub use error::{Error, Result};
