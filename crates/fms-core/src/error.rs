//! Common error types for the field management system.
//!
//! This module provides shared error types that are used across multiple crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the system.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A station key outside of R1..R3 / B1..B3 was provided.
    #[error("invalid alliance station '{0}'")]
    InvalidStation(String),

    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),
}
