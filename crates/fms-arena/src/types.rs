//! Configuration and reporting types for the arena.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fms_core::{MatchId, StationKey, TeamId};
use fms_store::MatchType;
use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, ConnectionError, Result};
use crate::lifecycle::{MatchState, MatchTiming};

/// Longest match the timing configuration may describe.
const MAX_MATCH_SECS: u64 = 24 * 60 * 60;

/// Configuration for the arena loop and match timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArenaConfig {
    /// Interval between control loop ticks in milliseconds.
    #[serde(default = "ArenaConfig::default_loop_period_ms")]
    pub loop_period_ms: u64,

    /// Maximum interval between driver station status packets in milliseconds.
    #[serde(default = "ArenaConfig::default_ds_packet_period_ms")]
    pub ds_packet_period_ms: u64,

    /// Autonomous period length in seconds.
    #[serde(default = "ArenaConfig::default_auto_duration_secs")]
    pub auto_duration_secs: u64,

    /// Pause between autonomous and teleoperated in seconds.
    #[serde(default = "ArenaConfig::default_pause_duration_secs")]
    pub pause_duration_secs: u64,

    /// Teleoperated period length in seconds.
    #[serde(default = "ArenaConfig::default_teleop_duration_secs")]
    pub teleop_duration_secs: u64,

    /// Seconds left in teleoperated when the endgame begins.
    #[serde(default = "ArenaConfig::default_endgame_time_left_secs")]
    pub endgame_time_left_secs: u64,

    /// Upper bound on a single driver station update in milliseconds.
    #[serde(default = "ArenaConfig::default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

impl ArenaConfig {
    const fn default_loop_period_ms() -> u64 {
        10
    }

    const fn default_ds_packet_period_ms() -> u64 {
        250
    }

    const fn default_auto_duration_secs() -> u64 {
        10
    }

    const fn default_pause_duration_secs() -> u64 {
        1
    }

    const fn default_teleop_duration_secs() -> u64 {
        140
    }

    const fn default_endgame_time_left_secs() -> u64 {
        30
    }

    const fn default_connection_timeout_ms() -> u64 {
        100
    }

    /// Build a configuration from defaults overridden by `FMS_*` environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::Config` if a variable is set but not a valid
    /// number, or if the resulting configuration is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from defaults overridden by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::Config` if a value is not a valid number, or if
    /// the resulting configuration is invalid.
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            loop_period_ms: parse_var(&lookup, "FMS_LOOP_PERIOD_MS", defaults.loop_period_ms)?,
            ds_packet_period_ms: parse_var(
                &lookup,
                "FMS_DS_PACKET_PERIOD_MS",
                defaults.ds_packet_period_ms,
            )?,
            auto_duration_secs: parse_var(
                &lookup,
                "FMS_AUTO_DURATION_SECS",
                defaults.auto_duration_secs,
            )?,
            pause_duration_secs: parse_var(
                &lookup,
                "FMS_PAUSE_DURATION_SECS",
                defaults.pause_duration_secs,
            )?,
            teleop_duration_secs: parse_var(
                &lookup,
                "FMS_TELEOP_DURATION_SECS",
                defaults.teleop_duration_secs,
            )?,
            endgame_time_left_secs: parse_var(
                &lookup,
                "FMS_ENDGAME_TIME_LEFT_SECS",
                defaults.endgame_time_left_secs,
            )?,
            connection_timeout_ms: parse_var(
                &lookup,
                "FMS_CONNECTION_TIMEOUT_MS",
                defaults.connection_timeout_ms,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the loop can run with these values.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::Config` on a zero loop period, a match longer
    /// than a day, or an endgame warning longer than the teleoperated period.
    pub fn validate(&self) -> Result<()> {
        if self.loop_period_ms == 0 {
            return Err(ArenaError::Config("loop period must be non-zero".into()));
        }
        let match_secs = self
            .auto_duration_secs
            .checked_add(self.pause_duration_secs)
            .and_then(|secs| secs.checked_add(self.teleop_duration_secs));
        if !match_secs.is_some_and(|secs| secs <= MAX_MATCH_SECS) {
            return Err(ArenaError::Config(format!(
                "match length exceeds {MAX_MATCH_SECS}s"
            )));
        }
        if self.endgame_time_left_secs > self.teleop_duration_secs {
            return Err(ArenaError::Config(format!(
                "endgame warning ({}s) exceeds teleop duration ({}s)",
                self.endgame_time_left_secs, self.teleop_duration_secs
            )));
        }
        Ok(())
    }

    /// Get the control loop period as a `Duration`.
    #[must_use]
    pub fn loop_period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }

    /// Get the status packet period as a `Duration`.
    #[must_use]
    pub fn ds_packet_period(&self) -> Duration {
        Duration::from_millis(self.ds_packet_period_ms)
    }

    /// Get the per-update connection timeout as a `Duration`.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// Get the match period lengths.
    #[must_use]
    pub fn timing(&self) -> MatchTiming {
        MatchTiming {
            auto: Duration::from_secs(self.auto_duration_secs),
            pause: Duration::from_secs(self.pause_duration_secs),
            teleop: Duration::from_secs(self.teleop_duration_secs),
            endgame_time_left: Duration::from_secs(self.endgame_time_left_secs),
        }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            loop_period_ms: Self::default_loop_period_ms(),
            ds_packet_period_ms: Self::default_ds_packet_period_ms(),
            auto_duration_secs: Self::default_auto_duration_secs(),
            pause_duration_secs: Self::default_pause_duration_secs(),
            teleop_duration_secs: Self::default_teleop_duration_secs(),
            endgame_time_left_secs: Self::default_endgame_time_left_secs(),
            connection_timeout_ms: Self::default_connection_timeout_ms(),
        }
    }
}

fn parse_var<L, T>(lookup: &L, name: &str, default: T) -> Result<T>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ArenaError::Config(format!("{name}: '{raw}' is not a valid number"))),
        None => Ok(default),
    }
}

/// A station update that failed during a status dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    /// The station whose update failed.
    pub station: StationKey,
    /// Why it failed.
    pub error: ConnectionError,
}

/// What a single control loop tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// State after the tick.
    pub state: MatchState,
    /// Whether the state changed during this tick.
    pub transitioned: bool,
    /// Whether a status packet was dispatched.
    pub packet_sent: bool,
    /// Stations whose update failed; the others were still updated.
    pub failures: Vec<DispatchFailure>,
}

/// Display view of one alliance station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationSnapshot {
    /// Which station.
    pub station: StationKey,
    /// Team bound to the station.
    pub team: Option<TeamId>,
    /// Nickname of the bound team.
    pub team_nickname: Option<String>,
    /// Whether a driver station connection is open.
    pub connected: bool,
    /// Whether the driver station reports a linked robot.
    pub robot_linked: bool,
    /// Operator bypass.
    pub bypass: bool,
    /// Emergency stop.
    pub emergency_stop: bool,
}

/// Display view of the whole arena, rebuilt after every tick and operator
/// action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArenaSnapshot {
    /// Current match state.
    pub match_state: MatchState,
    /// Whether a match start would currently be accepted.
    pub can_start_match: bool,
    /// Seconds since the match started; zero when idle.
    pub match_time_secs: f64,
    /// Loaded match.
    pub match_id: MatchId,
    /// Type of the loaded match.
    pub match_type: MatchType,
    /// Display name of the loaded match.
    pub match_name: String,
    /// Stations in R1..B3 order.
    pub stations: Vec<StationSnapshot>,
    /// When this snapshot was taken.
    pub taken_at: DateTime<Utc>,
}
