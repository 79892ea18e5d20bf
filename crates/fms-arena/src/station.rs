//! Alliance station registry.
//!
//! Six fixed slots, one per [`StationKey`]. Each slot may hold a team and the
//! driver station connection opened for it; the two are bound and released
//! together. The emergency stop and bypass flags live on the slot and
//! survive team reassignment.

use std::time::Duration;

use fms_core::{StationKey, TeamId};
use fms_store::{Store, Team};

use crate::connection::{ConnectionFactory, DriverStationConnection};
use crate::error::{ArenaError, ConnectionError, Result};
use crate::lifecycle::PeriodFlags;
use crate::types::{DispatchFailure, StationSnapshot};

/// One alliance station slot.
pub struct AllianceStation {
    key: StationKey,
    team: Option<Team>,
    connection: Option<Box<dyn DriverStationConnection>>,
    emergency_stop: bool,
    bypass: bool,
}

impl AllianceStation {
    fn new(key: StationKey) -> Self {
        Self {
            key,
            team: None,
            connection: None,
            emergency_stop: false,
            bypass: false,
        }
    }

    /// The station key.
    #[must_use]
    pub const fn key(&self) -> StationKey {
        self.key
    }

    /// The team bound to this station.
    #[must_use]
    pub const fn team(&self) -> Option<&Team> {
        self.team.as_ref()
    }

    /// Whether a driver station connection is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Whether the driver station reports a linked robot.
    #[must_use]
    pub fn robot_linked(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| c.robot_linked())
    }

    /// Whether the emergency stop is engaged.
    #[must_use]
    pub const fn emergency_stop(&self) -> bool {
        self.emergency_stop
    }

    /// Whether the operator has bypassed this station.
    #[must_use]
    pub const fn bypass(&self) -> bool {
        self.bypass
    }

    /// Bypassed, or connected with a linked robot.
    fn is_ready(&self) -> bool {
        self.bypass || self.robot_linked()
    }

    /// Enabled flag this station's robot should actually receive.
    const fn effective_enabled(&self, flags: PeriodFlags) -> bool {
        flags.enabled && !self.emergency_stop && !self.bypass
    }

    fn snapshot(&self) -> StationSnapshot {
        StationSnapshot {
            station: self.key,
            team: self.team.as_ref().map(|t| t.id),
            team_nickname: self.team.as_ref().map(|t| t.nickname.clone()),
            connected: self.is_connected(),
            robot_linked: self.robot_linked(),
            bypass: self.bypass,
            emergency_stop: self.emergency_stop,
        }
    }

    /// Close and drop the connection, leaving the slot empty.
    async fn release(&mut self) -> std::result::Result<(), ConnectionError> {
        let previous = self.team.take().map(|t| t.id);
        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };

        let result = connection.close().await;
        match &result {
            Ok(()) => {
                tracing::info!(station = %self.key, team = ?previous, "Released station");
            }
            Err(e) => {
                tracing::warn!(
                    station = %self.key,
                    team = ?previous,
                    error = %e,
                    "Connection did not close cleanly"
                );
            }
        }
        result
    }
}

/// The six alliance stations.
pub struct StationRegistry {
    stations: [AllianceStation; StationKey::COUNT],
}

impl Default for StationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StationRegistry {
    /// Create a registry with six empty stations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stations: std::array::from_fn(|i| AllianceStation::new(StationKey::ALL[i])),
        }
    }

    /// Get a station.
    #[must_use]
    pub fn get(&self, key: StationKey) -> &AllianceStation {
        &self.stations[key.index()]
    }

    /// Iterate over the stations in R1..B3 order.
    pub fn iter(&self) -> impl Iterator<Item = &AllianceStation> {
        self.stations.iter()
    }

    /// Bind `team_id` to the station at `key`.
    ///
    /// Binding the team a station already holds does nothing. Otherwise the
    /// current connection is closed first, then a new one is opened.
    /// [`TeamId::NONE`] leaves the station empty.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::UnknownTeam` if the team is not in the store and
    /// `ArenaError::Store` if the lookup fails. Returns
    /// `ArenaError::Connection` if the old connection fails to close or the
    /// new one fails to open. The old team is released before the lookup, so
    /// the station is left empty on any error.
    pub async fn assign_team<S, F>(
        &mut self,
        store: &S,
        factory: &F,
        team_id: TeamId,
        key: StationKey,
    ) -> Result<()>
    where
        S: Store + ?Sized,
        F: ConnectionFactory + ?Sized,
    {
        let station = &mut self.stations[key.index()];

        if station
            .connection
            .as_ref()
            .is_some_and(|c| c.team_id() == team_id)
        {
            tracing::debug!(station = %key, team = %team_id, "Team already assigned");
            return Ok(());
        }

        station
            .release()
            .await
            .map_err(|source| ArenaError::Connection {
                station: key,
                source,
            })?;

        if team_id.is_none() {
            return Ok(());
        }

        let team = store
            .get_team(team_id)?
            .ok_or(ArenaError::UnknownTeam(team_id))?;

        let connection = factory
            .connect(&team, key)
            .await
            .map_err(|source| ArenaError::Connection {
                station: key,
                source,
            })?;

        tracing::info!(station = %key, team = %team.id, "Assigned team");
        station.team = Some(team);
        station.connection = Some(connection);
        Ok(())
    }

    /// Check that a match may start.
    ///
    /// Any emergency stop blocks the start, bypassed or not. Every other
    /// station must be bypassed or have a linked robot.
    ///
    /// # Errors
    ///
    /// Returns `ArenaError::EmergencyStopActive` or `ArenaError::RobotNotReady`
    /// naming the first offending station.
    pub fn check_readiness(&self) -> Result<()> {
        if let Some(station) = self.stations.iter().find(|s| s.emergency_stop) {
            return Err(ArenaError::EmergencyStopActive(station.key));
        }
        if let Some(station) = self.stations.iter().find(|s| !s.is_ready()) {
            return Err(ArenaError::RobotNotReady(station.key));
        }
        Ok(())
    }

    /// Clear bypass on every station.
    pub fn reset_flags(&mut self) {
        for station in &mut self.stations {
            station.bypass = false;
        }
    }

    /// Set a station's emergency stop. Returns true if the flag changed.
    pub fn set_emergency_stop(&mut self, key: StationKey, active: bool) -> bool {
        let station = &mut self.stations[key.index()];
        let changed = station.emergency_stop != active;
        station.emergency_stop = active;
        changed
    }

    /// Set a station's bypass. Returns true if the flag changed.
    pub fn set_bypass(&mut self, key: StationKey, bypass: bool) -> bool {
        let station = &mut self.stations[key.index()];
        let changed = station.bypass != bypass;
        station.bypass = bypass;
        changed
    }

    /// Push `flags` to every connected station in R1..B3 order.
    ///
    /// Stopped or bypassed stations are sent `enabled = false`. Each update
    /// is bounded by `timeout`; a failed update is reported and the remaining
    /// stations are still updated.
    pub async fn dispatch(&mut self, flags: PeriodFlags, timeout: Duration) -> Vec<DispatchFailure> {
        let mut failures = Vec::new();

        for station in &mut self.stations {
            let enabled = station.effective_enabled(flags);
            let Some(connection) = station.connection.as_mut() else {
                continue;
            };

            connection.set_auto(flags.auto);
            connection.set_enabled(enabled);

            let result = tokio::time::timeout(timeout, connection.update())
                .await
                .unwrap_or(Err(ConnectionError::Timeout(timeout)));

            if let Err(error) = result {
                tracing::warn!(station = %station.key, error = %error, "Driver station update failed");
                failures.push(DispatchFailure {
                    station: station.key,
                    error,
                });
            }
        }

        failures
    }

    /// Display view of every station in R1..B3 order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<StationSnapshot> {
        self.stations.iter().map(AllianceStation::snapshot).collect()
    }
}
