//! REST API client module for the character catalog.
//!
//! `CharacterSource` is the seam the feed pages through; `ApiClient`
//! implements it against the public HTTP API and adds the detail-view
//! endpoints (single character, episodes) and a connectivity probe.

pub mod client;
pub mod error;
pub mod source;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use source::{CharacterPage, CharacterSource};
