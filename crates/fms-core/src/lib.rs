//! Core types and utilities for the field management system.
//!
//! This crate provides the foundational types shared by the store and the arena:
//!
//! - **Identifiers**: Strongly-typed team and match numbers
//! - **Stations**: The six fixed alliance station keys
//! - **Error types**: Common error definitions shared across crates
//!
//! # Example
//!
//! ```
//! use fms_core::{StationKey, TeamId};
//!
//! // Station keys are validated at the boundary
//! let station: StationKey = "B2".parse().unwrap();
//! assert_eq!(station, StationKey::Blue2);
//! assert!("R4".parse::<StationKey>().is_err());
//!
//! // Team zero is the "no team" sentinel
//! assert!(TeamId::NONE.is_none());
//! assert!(!TeamId::new(254).is_none());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod station;

pub use error::{CoreError, Result};
pub use ids::{IdError, MatchId, TeamId};
pub use station::{Alliance, StationKey};
