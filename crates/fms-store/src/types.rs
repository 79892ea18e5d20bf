//! Domain types stored in the database.
//!
//! These types represent the persisted team list and match schedule.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use fms_core::{MatchId, StationKey, TeamId};
use serde::{Deserialize, Serialize};

/// A team record stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Competition team number.
    pub id: TeamId,
    /// Full sponsor name.
    pub name: String,
    /// Short name announced on the field.
    pub nickname: String,
    /// Home city.
    #[serde(default)]
    pub city: String,
    /// First season the team competed.
    #[serde(default)]
    pub rookie_year: Option<u16>,
    /// Name of this season's robot.
    #[serde(default)]
    pub robot_name: Option<String>,
}

impl Team {
    /// Create a team with just a number and nickname.
    #[must_use]
    pub fn new(id: TeamId, nickname: impl Into<String>) -> Self {
        let nickname = nickname.into();
        Self {
            id,
            name: nickname.clone(),
            nickname,
            city: String::new(),
            rookie_year: None,
            robot_name: None,
        }
    }
}

/// The kind of match being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MatchType {
    /// Ad-hoc field test; never persisted.
    Test = 1,
    /// Practice match.
    Practice = 2,
    /// Qualification match.
    Qualification = 3,
    /// Elimination (playoff) match.
    Elimination = 4,
}

impl MatchType {
    /// Convert the type to its numeric representation.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Try to convert a numeric value to a `MatchType`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Test),
            2 => Some(Self::Practice),
            3 => Some(Self::Qualification),
            4 => Some(Self::Elimination),
            _ => None,
        }
    }

    /// Returns true if teams may be substituted into matches of this type.
    ///
    /// Qualification and elimination lineups are fixed once scheduled.
    #[must_use]
    pub const fn allows_substitution(self) -> bool {
        matches!(self, Self::Test | Self::Practice)
    }

    /// Lowercase name used in logs and operator input.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Practice => "practice",
            Self::Qualification => "qualification",
            Self::Elimination => "elimination",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "test" => Ok(Self::Test),
            "practice" => Ok(Self::Practice),
            "qualification" => Ok(Self::Qualification),
            "elimination" => Ok(Self::Elimination),
            other => Err(format!("unknown match type '{other}'")),
        }
    }
}

/// Completion status of a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Not yet played, or played without committed results.
    #[default]
    Scheduled,
    /// Results committed.
    Complete,
}

/// A match record stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Unique identifier for the match.
    pub id: MatchId,
    /// Kind of match.
    pub match_type: MatchType,
    /// Name shown to the audience (e.g. "Q12").
    pub display_name: String,
    /// Scheduled start time.
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    /// Team in station R1.
    pub red1: TeamId,
    /// Team in station R2.
    pub red2: TeamId,
    /// Team in station R3.
    pub red3: TeamId,
    /// Team in station B1.
    pub blue1: TeamId,
    /// Team in station B2.
    pub blue2: TeamId,
    /// Team in station B3.
    pub blue3: TeamId,
    /// Completion status.
    #[serde(default)]
    pub status: MatchStatus,
}

impl Match {
    /// A synthetic test match with every station empty.
    #[must_use]
    pub fn test() -> Self {
        Self::new(MatchId::TEST, MatchType::Test, "Test Match")
    }

    /// Create a scheduled match with every station empty.
    #[must_use]
    pub fn new(id: MatchId, match_type: MatchType, display_name: impl Into<String>) -> Self {
        Self {
            id,
            match_type,
            display_name: display_name.into(),
            time: None,
            red1: TeamId::NONE,
            red2: TeamId::NONE,
            red3: TeamId::NONE,
            blue1: TeamId::NONE,
            blue2: TeamId::NONE,
            blue3: TeamId::NONE,
            status: MatchStatus::Scheduled,
        }
    }

    /// Builder-style helper setting all six teams in R1..B3 order.
    #[must_use]
    pub fn with_teams(mut self, teams: [TeamId; StationKey::COUNT]) -> Self {
        for (station, team) in StationKey::ALL.into_iter().zip(teams) {
            self.set_team(station, team);
        }
        self
    }

    /// The team scheduled in the given station.
    #[must_use]
    pub const fn team(&self, station: StationKey) -> TeamId {
        match station {
            StationKey::Red1 => self.red1,
            StationKey::Red2 => self.red2,
            StationKey::Red3 => self.red3,
            StationKey::Blue1 => self.blue1,
            StationKey::Blue2 => self.blue2,
            StationKey::Blue3 => self.blue3,
        }
    }

    /// Replace the team scheduled in the given station.
    pub fn set_team(&mut self, station: StationKey, team: TeamId) {
        let slot = match station {
            StationKey::Red1 => &mut self.red1,
            StationKey::Red2 => &mut self.red2,
            StationKey::Red3 => &mut self.red3,
            StationKey::Blue1 => &mut self.blue1,
            StationKey::Blue2 => &mut self.blue2,
            StationKey::Blue3 => &mut self.blue3,
        };
        *slot = team;
    }

    /// Returns true once results have been committed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == MatchStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_is_empty() {
        let m = Match::test();
        assert_eq!(m.match_type, MatchType::Test);
        assert_eq!(m.id, MatchId::TEST);
        for station in StationKey::ALL {
            assert!(m.team(station).is_none());
        }
    }

    #[test]
    fn team_fields_follow_station_order() {
        let teams = [1, 2, 3, 4, 5, 6].map(TeamId::new);
        let m = Match::new(MatchId::new(1), MatchType::Qualification, "Q1").with_teams(teams);
        assert_eq!(m.red1, TeamId::new(1));
        assert_eq!(m.red3, TeamId::new(3));
        assert_eq!(m.blue1, TeamId::new(4));
        assert_eq!(m.blue3, TeamId::new(6));
        assert_eq!(m.team(StationKey::Blue2), TeamId::new(5));
    }

    #[test]
    fn substitution_policy() {
        assert!(MatchType::Test.allows_substitution());
        assert!(MatchType::Practice.allows_substitution());
        assert!(!MatchType::Qualification.allows_substitution());
        assert!(!MatchType::Elimination.allows_substitution());
    }

    #[test]
    fn match_type_codes() {
        for t in [
            MatchType::Test,
            MatchType::Practice,
            MatchType::Qualification,
            MatchType::Elimination,
        ] {
            assert_eq!(MatchType::from_u8(t.as_u8()), Some(t));
            assert_eq!(t.as_str().parse::<MatchType>().unwrap(), t);
        }
        assert_eq!(MatchType::from_u8(0), None);
        assert!("final".parse::<MatchType>().is_err());
    }

    #[test]
    fn match_serde_defaults_status() {
        let json = r#"{"id":7,"match_type":"practice","display_name":"P7",
            "red1":254,"red2":0,"red3":0,"blue1":0,"blue2":0,"blue3":1114}"#;
        let m: Match = serde_json::from_str(json).unwrap();
        assert_eq!(m.status, MatchStatus::Scheduled);
        assert_eq!(m.red1, TeamId::new(254));
        assert_eq!(m.blue3, TeamId::new(1114));
        assert!(m.time.is_none());
    }
}
