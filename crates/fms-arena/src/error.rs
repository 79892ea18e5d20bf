//! Error types for the arena.
//!
//! This module defines all errors that can occur while loading matches,
//! assigning teams to stations, and driving the match lifecycle.

use std::time::Duration;

use fms_core::{CoreError, StationKey, TeamId};
use fms_store::MatchType;
use thiserror::Error;

use crate::lifecycle::MatchState;

/// A result type using `ArenaError`.
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Errors reported by a driver station connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The connection could not be established.
    #[error("failed to connect: {0}")]
    Connect(String),

    /// A status update could not be delivered.
    #[error("failed to send update: {0}")]
    Update(String),

    /// The update did not complete within the allotted time.
    #[error("update timed out after {0:?}")]
    Timeout(Duration),

    /// The connection could not be shut down cleanly.
    #[error("failed to close: {0}")]
    Close(String),
}

/// Errors that can occur in arena operations.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// The station key is not one of R1..R3 / B1..B3.
    #[error("invalid alliance station '{0}'")]
    InvalidStation(String),

    /// No team with this number exists in the store.
    #[error("invalid team number '{0}'")]
    UnknownTeam(TeamId),

    /// The operation requires the arena to be idle.
    #[error("cannot do this while a match is in progress or has results pending (state: {0:?})")]
    MatchInProgress(MatchState),

    /// The operation requires a match to be underway.
    #[error("cannot abort match when it is not in progress (state: {0:?})")]
    NotInProgress(MatchState),

    /// Lineups of this match type are fixed.
    #[error("can only substitute teams for test and practice matches, not {0}")]
    SubstitutionNotAllowed(MatchType),

    /// A station's emergency stop is engaged.
    #[error("cannot start match while an emergency stop is active at {0}")]
    EmergencyStopActive(StationKey),

    /// A station is neither connected and linked nor bypassed.
    #[error("cannot start match until all robots are connected or bypassed ({0} is not ready)")]
    RobotNotReady(StationKey),

    /// A driver station connection failed.
    #[error("driver station connection error at {station}: {source}")]
    Connection {
        /// The station whose connection failed.
        station: StationKey,
        /// The underlying connection error.
        #[source]
        source: ConnectionError,
    },

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] fms_store::StoreError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<CoreError> for ArenaError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidStation(key) => Self::InvalidStation(key),
            CoreError::InvalidId(e) => Self::Config(e.to_string()),
        }
    }
}

impl ArenaError {
    /// Returns true if this error blocks a match start for safety reasons.
    #[must_use]
    pub const fn is_safety_block(&self) -> bool {
        matches!(self, Self::EmergencyStopActive(_) | Self::RobotNotReady(_))
    }

    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Store(_) | Self::RobotNotReady(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_station_converts() {
        let err: ArenaError = "R9".parse::<StationKey>().unwrap_err().into();
        assert!(matches!(err, ArenaError::InvalidStation(ref key) if key == "R9"));
        assert_eq!(err.to_string(), "invalid alliance station 'R9'");
    }

    #[test]
    fn classifiers() {
        assert!(ArenaError::EmergencyStopActive(StationKey::Red1).is_safety_block());
        assert!(ArenaError::RobotNotReady(StationKey::Blue2).is_safety_block());
        assert!(!ArenaError::MatchInProgress(MatchState::AutoPeriod).is_safety_block());

        let connection = ArenaError::Connection {
            station: StationKey::Red2,
            source: ConnectionError::Connect("refused".into()),
        };
        assert!(connection.is_retriable());
        assert!(!ArenaError::EmergencyStopActive(StationKey::Red1).is_retriable());
        assert!(!ArenaError::SubstitutionNotAllowed(MatchType::Qualification).is_retriable());
    }

    #[test]
    fn messages_name_the_station() {
        let err = ArenaError::Connection {
            station: StationKey::Blue3,
            source: ConnectionError::Timeout(Duration::from_millis(100)),
        };
        assert_eq!(
            err.to_string(),
            "driver station connection error at B3: update timed out after 100ms"
        );
        assert_eq!(
            ArenaError::UnknownTeam(TeamId::new(9999)).to_string(),
            "invalid team number '9999'"
        );
    }
}
