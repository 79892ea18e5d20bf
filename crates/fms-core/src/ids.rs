//! Core identifier types.
//!
//! Teams are identified by their competition team number and matches by a
//! store-assigned number. Both are plain integers on the wire, wrapped here so
//! a team number can never be passed where a match number is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The value is not a non-negative integer.
    #[error("not a valid number: {0}")]
    InvalidNumber(String),
}

/// A competition team number.
///
/// Team number `0` is reserved as the "no team" sentinel used by empty
/// alliance stations and by test matches.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(u32);

impl TeamId {
    /// The "no team" sentinel.
    pub const NONE: Self = Self(0);

    /// Create a `TeamId` from a team number.
    #[must_use]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// Return the team number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns true if this is the "no team" sentinel.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Big-endian bytes, used for ordered storage keys.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TeamId({})", self.0)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TeamId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| IdError::InvalidNumber(s.to_string()))
    }
}

impl From<u32> for TeamId {
    fn from(number: u32) -> Self {
        Self(number)
    }
}

/// A match record identifier assigned by the store.
///
/// Synthetic test matches use `MatchId::TEST`, which is never persisted.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(u64);

impl MatchId {
    /// Identifier of the synthetic, unpersisted test match.
    pub const TEST: Self = Self(0);

    /// Create a `MatchId` from its number.
    #[must_use]
    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    /// Return the underlying number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Big-endian bytes, used for ordered storage keys.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Rebuild a `MatchId` from big-endian key bytes.
    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Debug for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchId({})", self.0)
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MatchId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| IdError::InvalidNumber(s.to_string()))
    }
}
