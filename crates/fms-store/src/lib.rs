//! `RocksDB` storage for the team list and match schedule.
//!
//! The arena consumes this crate only through the [`Store`] trait: it looks
//! teams up by number when binding them to stations and lists matches by type
//! when advancing to the next unplayed match.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `teams`: Team records, keyed by team number
//! - `matches`: Primary match records, keyed by `match_id`
//! - `matches_by_type`: Index for listing matches of a type in id order
//!
//! # Example
//!
//! ```no_run
//! use fms_store::{MatchType, RocksStore, Store};
//!
//! let store = RocksStore::open("/tmp/fms-db").unwrap();
//!
//! // Find the first qualification match that still needs to be played
//! let next = store
//!     .list_matches_by_type(MatchType::Qualification)
//!     .unwrap()
//!     .into_iter()
//!     .find(|m| !m.is_complete());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::{Match, MatchStatus, MatchType, Team};

use fms_core::{MatchId, TeamId};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Team Operations
    // =========================================================================

    /// Insert or update a team record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_team(&self, team: &Team) -> Result<()>;

    /// Get a team by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_team(&self, team_id: TeamId) -> Result<Option<Team>>;

    /// Delete a team by number.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the team doesn't exist.
    fn delete_team(&self, team_id: TeamId) -> Result<()>;

    /// List all teams in team-number order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_teams(&self) -> Result<Vec<Team>>;

    // =========================================================================
    // Match Operations
    // =========================================================================

    /// Insert or update a match record.
    ///
    /// This also maintains the type index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_match(&self, record: &Match) -> Result<()>;

    /// Get a match by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_match(&self, match_id: MatchId) -> Result<Option<Match>>;

    /// Delete a match by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the match doesn't exist.
    fn delete_match(&self, match_id: MatchId) -> Result<()>;

    /// List all matches of a type, ordered by match id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_matches_by_type(&self, match_type: MatchType) -> Result<Vec<Match>>;

    /// Update a match's completion status.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the match doesn't exist.
    fn update_match_status(&self, match_id: MatchId, status: MatchStatus) -> Result<()>;
}
