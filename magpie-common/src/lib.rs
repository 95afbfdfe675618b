//! Common types shared across the Magpie crates.
//!
//! This crate holds the shared error type and the centralised tracing setup.
//! It is intentionally lightweight so every other crate can depend on it
//! without pulling in heavy transitive costs.
//!
//! # Overview
//!
//! - [`MagpieError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use magpie_common::{MagpieError, Result};
//!
//! fn needs_key(key: Option<&str>) -> Result<&str> {
//!     key.ok_or_else(|| MagpieError::Config("api key missing".into()))
//! }
//!
//! assert!(needs_key(None).is_err());
//! ```

pub mod observability;

/// Error types used across the Magpie system.
#[derive(thiserror::Error, Debug)]
pub enum MagpieError {
    /// A content source failed to produce material (network/non-2xx/decode).
    #[error("content source error: {0}")]
    Content(String),

    /// The completion service call failed.
    #[error("completion error: {0}")]
    Completion(String),

    /// A publish surface rejected or never received the post.
    #[error("publish error: {0}")]
    Publish(String),

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Anything the layers above did not classify.
    #[error("error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`MagpieError`].
pub type Result<T> = std::result::Result<T, MagpieError>;
