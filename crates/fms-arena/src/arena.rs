//! The arena: current match, lifecycle state, and the control loop step.
//!
//! [`Arena`] owns the station registry and the loaded match. Operator
//! actions and [`Arena::tick`] all take `&mut self`; callers serialize them
//! through one lock (see [`crate::handle::ArenaHandle`]).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fms_core::{StationKey, TeamId};
use fms_store::{Match, MatchType, Store};
use tokio::time::Instant;

use crate::connection::ConnectionFactory;
use crate::error::{ArenaError, Result};
use crate::lifecycle::{self, MatchState, MatchTiming};
use crate::station::StationRegistry;
use crate::types::{ArenaConfig, ArenaSnapshot, TickReport};

/// A single field: six alliance stations and the match being played on them.
pub struct Arena<S: Store, F: ConnectionFactory> {
    store: Arc<S>,
    factory: Arc<F>,
    config: ArenaConfig,
    timing: MatchTiming,
    stations: StationRegistry,
    current_match: Match,
    state: MatchState,
    can_start_match: bool,
    match_start: Option<Instant>,
    last_packet_at: Option<Instant>,
    pending_packet: bool,
}

impl<S: Store, F: ConnectionFactory> Arena<S, F> {
    /// Create an arena with the test match loaded.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::Config` if the configuration is invalid.
    pub async fn new(store: Arc<S>, factory: Arc<F>, config: ArenaConfig) -> Result<Self> {
        config.validate()?;

        let mut arena = Self {
            store,
            factory,
            timing: config.timing(),
            config,
            stations: StationRegistry::new(),
            current_match: Match::test(),
            state: MatchState::PreMatch,
            can_start_match: false,
            match_start: None,
            last_packet_at: None,
            pending_packet: false,
        };
        arena.load_test_match().await?;

        tracing::info!(
            loop_period_ms = arena.config.loop_period_ms,
            match_end_secs = arena.timing.match_end().as_secs(),
            "Arena initialized"
        );
        Ok(arena)
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Current match state.
    #[must_use]
    pub const fn state(&self) -> MatchState {
        self.state
    }

    /// The loaded match.
    #[must_use]
    pub const fn current_match(&self) -> &Match {
        &self.current_match
    }

    /// The alliance stations.
    #[must_use]
    pub const fn stations(&self) -> &StationRegistry {
        &self.stations
    }

    /// Whether the last tick found the arena ready to start.
    #[must_use]
    pub const fn can_start_match(&self) -> bool {
        self.can_start_match
    }

    // =========================================================================
    // Match Loading
    // =========================================================================

    /// Load `record` and bind its teams to the stations in R1..B3 order.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::MatchInProgress` unless the arena is in
    /// pre-match. Returns the first station assignment error; stations
    /// before it stay bound to the new teams.
    pub async fn load_match(&mut self, record: Match) -> Result<()> {
        if !lifecycle::can_load_match(self.state) {
            return Err(ArenaError::MatchInProgress(self.state));
        }

        tracing::info!(
            match_id = %record.id,
            match_type = %record.match_type,
            name = %record.display_name,
            "Loading match"
        );
        self.current_match = record;

        for key in StationKey::ALL {
            let team_id = self.current_match.team(key);
            if let Err(e) = self
                .stations
                .assign_team(self.store.as_ref(), self.factory.as_ref(), team_id, key)
                .await
            {
                tracing::error!(
                    station = %key,
                    team = %team_id,
                    error = %e,
                    retriable = e.is_retriable(),
                    "Failed to load match"
                );
                return Err(e);
            }
        }
        Ok(())
    }

    /// Load a test match with every station empty.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::MatchInProgress` unless the arena is in
    /// pre-match, or a connection error from releasing a station.
    pub async fn load_test_match(&mut self) -> Result<()> {
        self.load_match(Match::test()).await
    }

    /// Load the first unplayed match of the current match's type.
    ///
    /// A test match is replaced by a fresh test match. If every match of the
    /// type is complete, the current match stays loaded.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::MatchInProgress` unless the arena is in
    /// pre-match, a store error, or a station assignment error.
    pub async fn load_next_match(&mut self) -> Result<()> {
        if !lifecycle::can_load_match(self.state) {
            return Err(ArenaError::MatchInProgress(self.state));
        }

        let match_type = self.current_match.match_type;
        if match_type == MatchType::Test {
            return self.load_test_match().await;
        }

        let next = self
            .store
            .list_matches_by_type(match_type)?
            .into_iter()
            .find(|m| !m.is_complete());

        match next {
            Some(record) => self.load_match(record).await,
            None => {
                tracing::info!(match_type = %match_type, "No unplayed matches left");
                Ok(())
            }
        }
    }

    // =========================================================================
    // Station Operations
    // =========================================================================

    /// Swap the team at `station` in a test or practice match.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::SubstitutionNotAllowed` for qualification and
    /// elimination matches, `ArenaError::MatchInProgress` while a match is
    /// running, or a station assignment error.
    pub async fn substitute_team(&mut self, team_id: TeamId, station: StationKey) -> Result<()> {
        let match_type = self.current_match.match_type;
        if !match_type.allows_substitution() {
            return Err(ArenaError::SubstitutionNotAllowed(match_type));
        }
        if lifecycle::is_in_progress(self.state) {
            return Err(ArenaError::MatchInProgress(self.state));
        }

        self.stations
            .assign_team(self.store.as_ref(), self.factory.as_ref(), team_id, station)
            .await?;
        self.current_match.set_team(station, team_id);

        tracing::info!(station = %station, team = %team_id, "Substituted team");
        Ok(())
    }

    /// Bind a team to a station without touching the match record.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::MatchInProgress` while a match is running, or a
    /// station assignment error.
    pub async fn assign_team(&mut self, team_id: TeamId, station: StationKey) -> Result<()> {
        if lifecycle::is_in_progress(self.state) {
            return Err(ArenaError::MatchInProgress(self.state));
        }
        self.stations
            .assign_team(self.store.as_ref(), self.factory.as_ref(), team_id, station)
            .await
    }

    /// Engage or release a station's emergency stop.
    pub fn set_emergency_stop(&mut self, station: StationKey, active: bool) {
        if self.stations.set_emergency_stop(station, active) {
            tracing::warn!(station = %station, active, "Emergency stop changed");
            self.pending_packet |= active;
        }
    }

    /// Set or clear a station's bypass.
    pub fn set_bypass(&mut self, station: StationKey, bypass: bool) {
        if self.stations.set_bypass(station, bypass) {
            tracing::info!(station = %station, bypass, "Bypass changed");
            self.pending_packet |= bypass;
        }
    }

    // =========================================================================
    // Lifecycle Operations
    // =========================================================================

    /// Check that a match may start now.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::MatchInProgress` outside pre-match, or the
    /// station registry's readiness error.
    pub fn check_can_start_match(&self) -> Result<()> {
        if self.state != MatchState::PreMatch {
            return Err(ArenaError::MatchInProgress(self.state));
        }
        self.stations.check_readiness()
    }

    /// Start the loaded match. The next tick enters autonomous.
    ///
    /// # Errors
    ///
    /// Returns the error from [`Self::check_can_start_match`]; the state is
    /// unchanged.
    pub fn start_match(&mut self) -> Result<()> {
        self.check_can_start_match()?;
        debug_assert!(lifecycle::is_valid_transition(self.state, MatchState::StartMatch));
        self.state = MatchState::StartMatch;
        self.match_start = None;
        tracing::info!(match_id = %self.current_match.id, "Match started");
        Ok(())
    }

    /// Stop the running match immediately.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::NotInProgress` in pre- and post-match.
    pub fn abort_match(&mut self) -> Result<()> {
        if !lifecycle::is_in_progress(self.state) {
            return Err(ArenaError::NotInProgress(self.state));
        }
        tracing::warn!(
            match_id = %self.current_match.id,
            from = ?self.state,
            elapsed_secs = self.elapsed_match_time_secs(),
            "Match aborted"
        );
        debug_assert!(lifecycle::is_valid_transition(self.state, MatchState::PostMatch));
        self.state = MatchState::PostMatch;
        self.pending_packet = true;
        Ok(())
    }

    /// Return to pre-match and clear every bypass.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::MatchInProgress` while a match is running.
    pub fn reset_match(&mut self) -> Result<()> {
        if !lifecycle::can_reset(self.state) {
            return Err(ArenaError::MatchInProgress(self.state));
        }
        debug_assert!(lifecycle::is_valid_transition(self.state, MatchState::PreMatch));
        self.state = MatchState::PreMatch;
        self.match_start = None;
        self.stations.reset_flags();
        tracing::info!(match_id = %self.current_match.id, "Match reset");
        Ok(())
    }

    // =========================================================================
    // Control Loop
    // =========================================================================

    fn elapsed_at(&self, now: Instant) -> Duration {
        if !lifecycle::is_in_progress(self.state) {
            return Duration::ZERO;
        }
        self.match_start
            .map_or(Duration::ZERO, |start| now.saturating_duration_since(start))
    }

    /// Seconds since the match started; zero in pre- and post-match.
    #[must_use]
    pub fn elapsed_match_time_secs(&self) -> f64 {
        self.elapsed_at(Instant::now()).as_secs_f64()
    }

    /// Run one control loop step.
    ///
    /// Advances the state machine at most once, then sends a status packet
    /// to every connected station if the state changed, an operator action
    /// asked for one, or the packet period has passed. Failed station
    /// updates are reported, never returned as errors.
    pub async fn tick(&mut self) -> TickReport {
        let now = Instant::now();
        self.can_start_match = self.check_can_start_match().is_ok();

        let step = lifecycle::step(self.state, self.elapsed_at(now), &self.timing);
        let transitioned = step.state != self.state;
        if step.capture_start {
            self.match_start = Some(now);
        }
        if transitioned {
            tracing::info!(
                from = ?self.state,
                to = ?step.state,
                elapsed_secs = self.elapsed_at(now).as_secs_f64(),
                "Match state changed"
            );
            debug_assert!(lifecycle::is_valid_transition(self.state, step.state));
            self.state = step.state;
        }

        let cadence_due = match self.last_packet_at {
            Some(last) => now.duration_since(last) >= self.config.ds_packet_period(),
            None => true,
        };
        let packet_sent = step.packet_due || self.pending_packet || cadence_due;

        let failures = if packet_sent {
            self.pending_packet = false;
            let failures = self
                .stations
                .dispatch(step.flags, self.config.connection_timeout())
                .await;
            self.last_packet_at = Some(Instant::now());
            failures
        } else {
            Vec::new()
        };

        TickReport {
            state: self.state,
            transitioned,
            packet_sent,
            failures,
        }
    }

    /// Display view of the arena.
    #[must_use]
    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot {
            match_state: self.state,
            can_start_match: self.check_can_start_match().is_ok(),
            match_time_secs: self.elapsed_match_time_secs(),
            match_id: self.current_match.id,
            match_type: self.current_match.match_type,
            match_name: self.current_match.display_name.clone(),
            stations: self.stations.snapshots(),
            taken_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::mock::MockConnectionFactory;
    use crate::error::ConnectionError;
    use crate::lifecycle::PeriodFlags;
    use fms_core::MatchId;
    use fms_store::{MatchStatus, RocksStore, Team};
    use tempfile::TempDir;
    use tokio::time::advance;

    const TEAMS: [u32; 6] = [254, 1114, 971, 118, 1678, 2056];

    type TestArena = Arena<RocksStore, MockConnectionFactory>;

    struct Fixture {
        arena: TestArena,
        factory: Arc<MockConnectionFactory>,
        store: Arc<RocksStore>,
        _dir: TempDir,
    }

    async fn fixture(factory: MockConnectionFactory) -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        for number in TEAMS {
            store
                .put_team(&Team::new(TeamId::new(number), format!("team {number}")))
                .unwrap();
        }
        let factory = Arc::new(factory);
        let arena = Arena::new(Arc::clone(&store), Arc::clone(&factory), ArenaConfig::default())
            .await
            .unwrap();
        Fixture {
            arena,
            factory,
            store,
            _dir: dir,
        }
    }

    fn scheduled(id: u64, match_type: MatchType) -> Match {
        Match::new(MatchId::new(id), match_type, format!("{match_type} {id}"))
            .with_teams(TEAMS.map(TeamId::new))
    }

    fn bypass_all(arena: &mut TestArena) {
        for key in StationKey::ALL {
            arena.set_bypass(key, true);
        }
    }

    /// A practice match with six linked robots, started and ticked into auto.
    async fn running_practice_match() -> Fixture {
        let mut fx = fixture(MockConnectionFactory::linked()).await;
        fx.arena
            .load_match(scheduled(1, MatchType::Practice))
            .await
            .unwrap();
        fx.arena.start_match().unwrap();
        fx.arena.tick().await;
        assert_eq!(fx.arena.state(), MatchState::AutoPeriod);
        fx
    }

    #[tokio::test(start_paused = true)]
    async fn new_arena_loads_test_match() {
        let fx = fixture(MockConnectionFactory::new()).await;

        assert_eq!(fx.arena.state(), MatchState::PreMatch);
        let current = fx.arena.current_match();
        assert_eq!(current.match_type, MatchType::Test);
        assert!(StationKey::ALL.iter().all(|k| current.team(*k).is_none()));
        assert_eq!(fx.factory.connect_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn start_then_tick_enters_auto() {
        let mut fx = fixture(MockConnectionFactory::new()).await;
        bypass_all(&mut fx.arena);

        fx.arena.start_match().unwrap();
        assert_eq!(fx.arena.state(), MatchState::StartMatch);

        let report = fx.arena.tick().await;
        assert_eq!(report.state, MatchState::AutoPeriod);
        assert!(report.transitioned);
        assert!(report.packet_sent);
        assert!(fx.arena.elapsed_match_time_secs().abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn full_match_state_sequence() {
        let mut fx = fixture(MockConnectionFactory::new()).await;
        bypass_all(&mut fx.arena);
        fx.arena.start_match().unwrap();

        let mut seen = Vec::new();
        for offset in [0, 10, 1, 110, 30] {
            advance(Duration::from_secs(offset)).await;
            let report = fx.arena.tick().await;
            assert!(report.transitioned);
            seen.push(report.state);
        }

        assert_eq!(
            seen,
            vec![
                MatchState::AutoPeriod,
                MatchState::PausePeriod,
                MatchState::TeleopPeriod,
                MatchState::EndgamePeriod,
                MatchState::PostMatch,
            ]
        );
        assert!(fx.arena.elapsed_match_time_secs().abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_tracks_match_clock() {
        let mut fx = running_practice_match().await;
        advance(Duration::from_millis(2500)).await;
        assert!((fx.arena.elapsed_match_time_secs() - 2.5).abs() < 1e-9);

        fx.arena.tick().await;
        assert_eq!(fx.arena.state(), MatchState::AutoPeriod);
    }

    #[tokio::test(start_paused = true)]
    async fn start_blocked_until_ready() {
        let mut fx = fixture(MockConnectionFactory::new()).await;
        fx.arena
            .load_match(scheduled(1, MatchType::Practice))
            .await
            .unwrap();

        let err = fx.arena.start_match().unwrap_err();
        assert!(matches!(err, ArenaError::RobotNotReady(StationKey::Red1)));
        assert_eq!(fx.arena.state(), MatchState::PreMatch);

        fx.arena.tick().await;
        assert!(!fx.arena.can_start_match());

        for key in StationKey::ALL {
            fx.factory.link(key).unwrap().set_linked(true);
        }
        fx.arena.tick().await;
        assert!(fx.arena.can_start_match());

        fx.arena.set_emergency_stop(StationKey::Blue1, true);
        assert!(matches!(
            fx.arena.start_match(),
            Err(ArenaError::EmergencyStopActive(StationKey::Blue1))
        ));
        assert_eq!(fx.arena.state(), MatchState::PreMatch);

        fx.arena.set_emergency_stop(StationKey::Blue1, false);
        fx.arena.start_match().unwrap();
        assert!(matches!(
            fx.arena.check_can_start_match(),
            Err(ArenaError::MatchInProgress(MatchState::StartMatch))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn abort_from_every_running_period() {
        let cases = [
            (None, MatchState::StartMatch),
            (Some(0), MatchState::AutoPeriod),
            (Some(10), MatchState::PausePeriod),
            (Some(11), MatchState::TeleopPeriod),
            (Some(121), MatchState::EndgamePeriod),
        ];

        for (at, expected) in cases {
            let mut fx = fixture(MockConnectionFactory::new()).await;
            bypass_all(&mut fx.arena);
            fx.arena.start_match().unwrap();

            if let Some(secs) = at {
                fx.arena.tick().await;
                advance(Duration::from_secs(secs)).await;
                // One tick per boundary crossed.
                for _ in 0..4 {
                    fx.arena.tick().await;
                }
            }
            assert_eq!(fx.arena.state(), expected);

            fx.arena.abort_match().unwrap();
            assert_eq!(fx.arena.state(), MatchState::PostMatch);

            let report = fx.arena.tick().await;
            assert_eq!(report.state, MatchState::PostMatch);
            assert!(report.packet_sent);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn abort_disables_robots() {
        let mut fx = running_practice_match().await;
        advance(Duration::from_millis(50)).await;

        fx.arena.abort_match().unwrap();
        let report = fx.arena.tick().await;

        assert!(report.packet_sent);
        for key in StationKey::ALL {
            let sent = fx.factory.link(key).unwrap().last_sent().unwrap();
            assert_eq!(sent, PeriodFlags::new(false, false));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn abort_outside_match_fails() {
        let mut fx = fixture(MockConnectionFactory::new()).await;
        assert!(matches!(
            fx.arena.abort_match(),
            Err(ArenaError::NotInProgress(MatchState::PreMatch))
        ));

        bypass_all(&mut fx.arena);
        fx.arena.start_match().unwrap();
        fx.arena.abort_match().unwrap();
        assert!(matches!(
            fx.arena.abort_match(),
            Err(ArenaError::NotInProgress(MatchState::PostMatch))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_bypass() {
        let mut fx = fixture(MockConnectionFactory::new()).await;
        bypass_all(&mut fx.arena);
        fx.arena.set_emergency_stop(StationKey::Red3, true);
        fx.arena.set_emergency_stop(StationKey::Red3, false);
        fx.arena.start_match().unwrap();
        fx.arena.tick().await;

        assert!(matches!(
            fx.arena.reset_match(),
            Err(ArenaError::MatchInProgress(MatchState::AutoPeriod))
        ));
        assert!(fx.arena.stations().iter().all(|s| s.bypass()));

        fx.arena.abort_match().unwrap();
        fx.arena.reset_match().unwrap();

        assert_eq!(fx.arena.state(), MatchState::PreMatch);
        assert!(fx.arena.stations().iter().all(|s| !s.bypass()));
    }

    #[tokio::test(start_paused = true)]
    async fn load_only_in_pre_match() {
        let mut fx = fixture(MockConnectionFactory::new()).await;
        bypass_all(&mut fx.arena);
        fx.arena.start_match().unwrap();

        assert!(matches!(
            fx.arena.load_test_match().await,
            Err(ArenaError::MatchInProgress(MatchState::StartMatch))
        ));

        fx.arena.abort_match().unwrap();
        assert!(matches!(
            fx.arena.load_match(scheduled(2, MatchType::Practice)).await,
            Err(ArenaError::MatchInProgress(MatchState::PostMatch))
        ));
        assert_eq!(fx.arena.current_match().match_type, MatchType::Test);

        fx.arena.reset_match().unwrap();
        fx.arena.load_test_match().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn load_match_binds_every_station() {
        let mut fx = fixture(MockConnectionFactory::new()).await;
        fx.arena
            .load_match(scheduled(7, MatchType::Qualification))
            .await
            .unwrap();

        for (key, number) in StationKey::ALL.into_iter().zip(TEAMS) {
            let station = fx.arena.stations().get(key);
            assert_eq!(station.team().map(|t| t.id), Some(TeamId::new(number)));
        }

        fx.arena.load_test_match().await.unwrap();
        assert_eq!(fx.factory.close_count(), 6);
        assert!(fx.arena.stations().iter().all(|s| !s.is_connected()));
    }

    #[tokio::test(start_paused = true)]
    async fn load_match_stops_at_first_bad_team() {
        let mut fx = fixture(MockConnectionFactory::new()).await;
        let mut record = scheduled(3, MatchType::Qualification);
        record.set_team(StationKey::Blue1, TeamId::new(9999));

        let result = fx.arena.load_match(record).await;

        assert!(matches!(result, Err(ArenaError::UnknownTeam(_))));
        let bound: Vec<_> = fx
            .arena
            .stations()
            .iter()
            .map(|s| s.team().is_some())
            .collect();
        assert_eq!(bound, vec![true, true, true, false, false, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_load_releases_previous_team() {
        let mut fx = fixture(MockConnectionFactory::linked()).await;
        fx.arena
            .load_match(scheduled(1, MatchType::Practice))
            .await
            .unwrap();
        assert_eq!(
            fx.arena.stations().get(StationKey::Red2).team().map(|t| t.id),
            Some(TeamId::new(1114))
        );

        let mut next = scheduled(2, MatchType::Practice);
        next.set_team(StationKey::Red2, TeamId::new(9999));
        let result = fx.arena.load_match(next).await;

        assert!(matches!(result, Err(ArenaError::UnknownTeam(id)) if id == TeamId::new(9999)));
        assert_eq!(fx.arena.current_match().team(StationKey::Red2), TeamId::new(9999));
        let red2 = fx.arena.stations().get(StationKey::Red2);
        assert!(red2.team().is_none());
        assert!(!red2.is_connected());
        assert!(matches!(
            fx.arena.start_match(),
            Err(ArenaError::RobotNotReady(StationKey::Red2))
        ));
        assert_eq!(fx.arena.state(), MatchState::PreMatch);
    }

    #[tokio::test(start_paused = true)]
    async fn load_next_match_skips_complete() {
        let mut fx = fixture(MockConnectionFactory::new()).await;
        for id in [1, 2, 3] {
            fx.store
                .put_match(&scheduled(id, MatchType::Qualification))
                .unwrap();
        }
        fx.store
            .update_match_status(MatchId::new(1), MatchStatus::Complete)
            .unwrap();

        let first = fx.store.get_match(MatchId::new(1)).unwrap().unwrap();
        fx.arena.load_match(first).await.unwrap();
        fx.arena.load_next_match().await.unwrap();
        assert_eq!(fx.arena.current_match().id, MatchId::new(2));

        for id in [2, 3] {
            fx.store
                .update_match_status(MatchId::new(id), MatchStatus::Complete)
                .unwrap();
        }
        fx.arena.load_next_match().await.unwrap();
        assert_eq!(fx.arena.current_match().id, MatchId::new(2));
    }

    #[tokio::test(start_paused = true)]
    async fn load_next_after_test_reloads_test() {
        let mut fx = fixture(MockConnectionFactory::new()).await;
        fx.arena
            .substitute_team(TeamId::new(254), StationKey::Red1)
            .await
            .unwrap();

        fx.arena.load_next_match().await.unwrap();

        assert_eq!(fx.arena.current_match().match_type, MatchType::Test);
        assert!(fx.arena.current_match().red1.is_none());
        assert!(fx.arena.stations().get(StationKey::Red1).team().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn substitution_depends_on_match_type() {
        for match_type in [MatchType::Qualification, MatchType::Elimination] {
            let mut fx = fixture(MockConnectionFactory::new()).await;
            fx.arena.load_match(scheduled(4, match_type)).await.unwrap();

            let result = fx
                .arena
                .substitute_team(TeamId::new(2056), StationKey::Red1)
                .await;
            assert!(
                matches!(result, Err(ArenaError::SubstitutionNotAllowed(t)) if t == match_type)
            );
            assert_eq!(fx.arena.current_match().red1, TeamId::new(254));
        }

        for match_type in [MatchType::Test, MatchType::Practice] {
            let mut fx = fixture(MockConnectionFactory::new()).await;
            if match_type == MatchType::Practice {
                fx.arena.load_match(scheduled(4, match_type)).await.unwrap();
            }

            fx.arena
                .substitute_team(TeamId::new(2056), StationKey::Red1)
                .await
                .unwrap();
            assert_eq!(fx.arena.current_match().red1, TeamId::new(2056));
            assert_eq!(
                fx.arena
                    .stations()
                    .get(StationKey::Red1)
                    .team()
                    .map(|t| t.id),
                Some(TeamId::new(2056))
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn substitution_rejected_mid_match() {
        let mut fx = running_practice_match().await;
        let before = fx.factory.connect_count();

        let result = fx
            .arena
            .substitute_team(TeamId::new(2056), StationKey::Blue3)
            .await;

        assert!(matches!(
            result,
            Err(ArenaError::MatchInProgress(MatchState::AutoPeriod))
        ));
        assert_eq!(fx.factory.connect_count(), before);
        assert!(matches!(
            fx.arena.assign_team(TeamId::NONE, StationKey::Blue3).await,
            Err(ArenaError::MatchInProgress(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_substitution_keeps_record() {
        let mut fx = fixture(MockConnectionFactory::new()).await;
        fx.arena
            .load_match(scheduled(5, MatchType::Practice))
            .await
            .unwrap();

        let result = fx
            .arena
            .substitute_team(TeamId::new(4414), StationKey::Blue2)
            .await;

        assert!(matches!(result, Err(ArenaError::UnknownTeam(_))));
        assert_eq!(fx.arena.current_match().blue2, TeamId::new(1678));
        assert!(fx.arena.stations().get(StationKey::Blue2).team().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn packets_follow_cadence() {
        let mut fx = fixture(MockConnectionFactory::new()).await;
        fx.arena
            .substitute_team(TeamId::new(254), StationKey::Red1)
            .await
            .unwrap();
        let link = fx.factory.link(StationKey::Red1).unwrap();

        let first = fx.arena.tick().await;
        assert!(first.packet_sent);

        let mut sent = 0;
        for _ in 0..100 {
            advance(Duration::from_millis(10)).await;
            if fx.arena.tick().await.packet_sent {
                sent += 1;
            }
        }

        assert_eq!(sent, 4);
        assert_eq!(link.update_count(), 5);
        assert!(link
            .sent()
            .iter()
            .all(|f| *f == PeriodFlags::new(true, false)));
    }

    #[tokio::test(start_paused = true)]
    async fn transitions_force_packets_except_endgame() {
        let mut fx = running_practice_match().await;

        advance(Duration::from_millis(9_900)).await;
        assert!(fx.arena.tick().await.packet_sent);
        advance(Duration::from_millis(100)).await;
        let pause = fx.arena.tick().await;
        assert_eq!(pause.state, MatchState::PausePeriod);
        assert!(pause.packet_sent);

        advance(Duration::from_secs(1)).await;
        let teleop = fx.arena.tick().await;
        assert_eq!(teleop.state, MatchState::TeleopPeriod);

        advance(Duration::from_millis(109_900)).await;
        assert!(fx.arena.tick().await.packet_sent);
        advance(Duration::from_millis(100)).await;
        let endgame = fx.arena.tick().await;
        assert_eq!(endgame.state, MatchState::EndgamePeriod);
        assert!(endgame.transitioned);
        assert!(!endgame.packet_sent);

        let link = fx.factory.link(StationKey::Blue2).unwrap();
        assert_eq!(link.last_sent(), Some(PeriodFlags::new(false, true)));
    }

    #[tokio::test(start_paused = true)]
    async fn emergency_stop_disables_station() {
        let mut fx = running_practice_match().await;
        advance(Duration::from_millis(20)).await;

        fx.arena.set_emergency_stop(StationKey::Red1, true);
        let report = fx.arena.tick().await;
        assert!(report.packet_sent);

        let stopped = fx.factory.link(StationKey::Red1).unwrap();
        assert_eq!(stopped.last_sent(), Some(PeriodFlags::new(true, false)));
        let running = fx.factory.link(StationKey::Red2).unwrap();
        assert_eq!(running.last_sent(), Some(PeriodFlags::new(true, true)));
        assert_eq!(fx.arena.state(), MatchState::AutoPeriod);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_link_does_not_stop_loop() {
        let mut fx = running_practice_match().await;
        fx.factory.link(StationKey::Blue1).unwrap().fail_updates(true);

        advance(Duration::from_secs(10)).await;
        let report = fx.arena.tick().await;

        assert_eq!(report.state, MatchState::PausePeriod);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].station, StationKey::Blue1);
        assert!(matches!(report.failures[0].error, ConnectionError::Update(_)));
        assert_eq!(
            fx.factory.link(StationKey::Blue2).unwrap().last_sent(),
            Some(PeriodFlags::new(false, false))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_reflects_arena() {
        let mut fx = running_practice_match().await;
        advance(Duration::from_secs(3)).await;
        fx.arena.set_bypass(StationKey::Red2, true);

        let snapshot = fx.arena.snapshot();
        assert_eq!(snapshot.match_state, MatchState::AutoPeriod);
        assert!(!snapshot.can_start_match);
        assert!((snapshot.match_time_secs - 3.0).abs() < 1e-9);
        assert_eq!(snapshot.match_type, MatchType::Practice);
        assert_eq!(snapshot.stations.len(), 6);
        assert!(snapshot.stations[1].bypass);
        assert_eq!(snapshot.stations[3].team, Some(TeamId::new(118)));
    }
}
