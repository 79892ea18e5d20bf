//! Alliance station keys.
//!
//! The field has exactly six driver stations, three per alliance. They are
//! modelled as a closed enum so that arena storage can be a fixed array
//! indexed by [`StationKey::index`] instead of a string-keyed map.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One side of the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alliance {
    /// The red alliance (stations R1..R3).
    Red,
    /// The blue alliance (stations B1..B3).
    Blue,
}

/// One of the six fixed alliance stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StationKey {
    /// Red station 1.
    Red1,
    /// Red station 2.
    Red2,
    /// Red station 3.
    Red3,
    /// Blue station 1.
    Blue1,
    /// Blue station 2.
    Blue2,
    /// Blue station 3.
    Blue3,
}

impl StationKey {
    /// Number of alliance stations on the field.
    pub const COUNT: usize = 6;

    /// All stations in assignment and dispatch order: R1, R2, R3, B1, B2, B3.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Red1,
        Self::Red2,
        Self::Red3,
        Self::Blue1,
        Self::Blue2,
        Self::Blue3,
    ];

    /// Position of this station in [`StationKey::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Red1 => 0,
            Self::Red2 => 1,
            Self::Red3 => 2,
            Self::Blue1 => 3,
            Self::Blue2 => 4,
            Self::Blue3 => 5,
        }
    }

    /// The alliance this station belongs to.
    #[must_use]
    pub const fn alliance(self) -> Alliance {
        match self {
            Self::Red1 | Self::Red2 | Self::Red3 => Alliance::Red,
            Self::Blue1 | Self::Blue2 | Self::Blue3 => Alliance::Blue,
        }
    }

    /// The short key used by operators and the driver station protocol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red1 => "R1",
            Self::Red2 => "R2",
            Self::Red3 => "R3",
            Self::Blue1 => "B1",
            Self::Blue2 => "B2",
            Self::Blue3 => "B3",
        }
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StationKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|station| station.as_str() == s)
            .ok_or_else(|| CoreError::InvalidStation(s.to_string()))
    }
}

impl TryFrom<String> for StationKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StationKey> for String {
    fn from(station: StationKey) -> Self {
        station.as_str().to_string()
    }
}
