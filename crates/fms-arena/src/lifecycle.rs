//! Match lifecycle state machine.
//!
//! This module defines the match states, the robot flags each state implies,
//! and [`step`], a pure function that advances the state machine from elapsed
//! match time. It performs no I/O and reads no clock, so every transition can
//! be tested without real time.
//!
//! # State Machine
//!
//! ```text
//!     ┌─────────────┐
//!     │  PreMatch   │◀──────────────────────┐
//!     └──────┬──────┘                       │
//!            │ start_match()                │ reset_match()
//!            ▼                              │
//!     ┌─────────────┐                       │
//!     │ StartMatch  │                       │
//!     └──────┬──────┘                       │
//!            │ next tick (start captured)   │
//!            ▼                              │
//!     ┌─────────────┐                       │
//!     │ AutoPeriod  │───────┐               │
//!     └──────┬──────┘       │               │
//!            │ t ≥ auto     │               │
//!            ▼              │               │
//!     ┌─────────────┐       │               │
//!     │ PausePeriod │───────┤               │
//!     └──────┬──────┘       │ abort_match() │
//!            │ t ≥ +pause   │               │
//!            ▼              │               │
//!     ┌──────────────┐      │               │
//!     │ TeleopPeriod │──────┤               │
//!     └──────┬───────┘      │               │
//!            │ t ≥ warning  │               │
//!            ▼              │               │
//!     ┌───────────────┐     │               │
//!     │ EndgamePeriod │─────┤               │
//!     └──────┬────────┘     │               │
//!            │ t ≥ end      ▼               │
//!            │        ┌───────────┐         │
//!            └───────▶│ PostMatch │─────────┘
//!                     └───────────┘
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Progression of match states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// Waiting for the match to be started. Teams may be loaded.
    #[default]
    PreMatch,
    /// Start requested; becomes `AutoPeriod` on the next tick.
    StartMatch,
    /// Autonomous period.
    AutoPeriod,
    /// Pause between autonomous and teleoperated.
    PausePeriod,
    /// Teleoperated period.
    TeleopPeriod,
    /// Final seconds of the teleoperated period.
    EndgamePeriod,
    /// Match over or aborted; results pending.
    PostMatch,
}

/// The mode and enable flags robots should be given in a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodFlags {
    /// Robots run their autonomous routine.
    pub auto: bool,
    /// Robots are allowed to move.
    pub enabled: bool,
}

impl PeriodFlags {
    /// Create a flag pair.
    #[must_use]
    pub const fn new(auto: bool, enabled: bool) -> Self {
        Self { auto, enabled }
    }
}

/// Lengths of the match periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchTiming {
    /// Autonomous period length.
    pub auto: Duration,
    /// Pause between autonomous and teleoperated.
    pub pause: Duration,
    /// Teleoperated period length, endgame included.
    pub teleop: Duration,
    /// Time left in teleoperated when the endgame begins.
    pub endgame_time_left: Duration,
}

impl Default for MatchTiming {
    fn default() -> Self {
        Self {
            auto: Duration::from_secs(10),
            pause: Duration::from_secs(1),
            teleop: Duration::from_secs(140),
            endgame_time_left: Duration::from_secs(30),
        }
    }
}

impl MatchTiming {
    /// Match time at which autonomous ends.
    #[must_use]
    pub fn auto_end(&self) -> Duration {
        self.auto
    }

    /// Match time at which teleoperated begins.
    #[must_use]
    pub fn teleop_start(&self) -> Duration {
        self.auto + self.pause
    }

    /// Match time at which the endgame begins.
    #[must_use]
    pub fn endgame_start(&self) -> Duration {
        self.match_end().saturating_sub(self.endgame_time_left)
    }

    /// Match time at which the match ends.
    #[must_use]
    pub fn match_end(&self) -> Duration {
        self.teleop_start() + self.teleop
    }
}

/// Outcome of evaluating the state machine for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// State after this tick.
    pub state: MatchState,
    /// Flags robots should be given in `state`.
    pub flags: PeriodFlags,
    /// A status packet must go out this tick regardless of cadence.
    pub packet_due: bool,
    /// The match start timestamp must be captured this tick.
    pub capture_start: bool,
}

impl Step {
    const fn stay(state: MatchState) -> Self {
        Self {
            state,
            flags: period_flags(state),
            packet_due: false,
            capture_start: false,
        }
    }

    const fn enter(state: MatchState) -> Self {
        Self {
            state,
            flags: period_flags(state),
            packet_due: true,
            capture_start: false,
        }
    }
}

/// Flags robots should be given while in `state`.
#[must_use]
pub const fn period_flags(state: MatchState) -> PeriodFlags {
    match state {
        MatchState::PreMatch => PeriodFlags::new(true, false),
        MatchState::StartMatch | MatchState::AutoPeriod => PeriodFlags::new(true, true),
        MatchState::PausePeriod | MatchState::PostMatch => PeriodFlags::new(false, false),
        MatchState::TeleopPeriod | MatchState::EndgamePeriod => PeriodFlags::new(false, true),
    }
}

/// Advance the state machine by one tick.
///
/// `elapsed` is match time measured from the captured start timestamp; it is
/// ignored in states that do not leave on a timer. At most one transition
/// happens per call.
///
/// Entering the endgame does not force a packet: robots stay enabled in
/// teleoperated mode, only the remaining time changes.
#[must_use]
pub fn step(state: MatchState, elapsed: Duration, timing: &MatchTiming) -> Step {
    match state {
        MatchState::StartMatch => Step {
            capture_start: true,
            ..Step::enter(MatchState::AutoPeriod)
        },
        MatchState::AutoPeriod if elapsed >= timing.auto_end() => {
            Step::enter(MatchState::PausePeriod)
        }
        MatchState::PausePeriod if elapsed >= timing.teleop_start() => {
            Step::enter(MatchState::TeleopPeriod)
        }
        MatchState::TeleopPeriod if elapsed >= timing.endgame_start() => Step {
            packet_due: false,
            ..Step::enter(MatchState::EndgamePeriod)
        },
        MatchState::EndgamePeriod if elapsed >= timing.match_end() => {
            Step::enter(MatchState::PostMatch)
        }
        _ => Step::stay(state),
    }
}

/// Check if a state transition is valid according to the state machine.
#[must_use]
pub const fn is_valid_transition(from: MatchState, to: MatchState) -> bool {
    use MatchState::{
        AutoPeriod, EndgamePeriod, PausePeriod, PostMatch, PreMatch, StartMatch, TeleopPeriod,
    };

    matches!(
        (from, to),
        (PreMatch, StartMatch)
            | (StartMatch, AutoPeriod)
            | (AutoPeriod, PausePeriod)
            | (PausePeriod, TeleopPeriod)
            | (TeleopPeriod, EndgamePeriod)
            | (EndgamePeriod, PostMatch)
            // abort
            | (StartMatch | AutoPeriod | PausePeriod | TeleopPeriod, PostMatch)
            // reset
            | (PostMatch | PreMatch, PreMatch)
    )
}

/// Returns true while a match is underway (anything but pre- and post-match).
#[must_use]
pub const fn is_in_progress(state: MatchState) -> bool {
    !matches!(state, MatchState::PreMatch | MatchState::PostMatch)
}

/// Returns true if a new match may be loaded.
#[must_use]
pub const fn can_load_match(state: MatchState) -> bool {
    matches!(state, MatchState::PreMatch)
}

/// Returns true if the arena may be reset to pre-match.
#[must_use]
pub const fn can_reset(state: MatchState) -> bool {
    !is_in_progress(state)
}
