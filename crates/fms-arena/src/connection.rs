//! Driver station connections.
//!
//! The arena never formats or transmits packets itself. Each alliance station
//! owns one [`DriverStationConnection`]; the arena only sets its mode and
//! enable flags and asks it to push an update. Connections are created by a
//! [`ConnectionFactory`] when a team is assigned to a station and closed when
//! the station is released.

use async_trait::async_trait;
use fms_core::{StationKey, TeamId};
use fms_store::Team;

use crate::error::ConnectionError;

/// A live link to one team's driver station.
#[async_trait]
pub trait DriverStationConnection: Send + Sync {
    /// The team this connection was opened for.
    fn team_id(&self) -> TeamId;

    /// Whether the driver station reports a linked robot.
    fn robot_linked(&self) -> bool;

    /// Set the autonomous flag sent with the next update.
    fn set_auto(&mut self, auto: bool);

    /// Set the enabled flag sent with the next update.
    fn set_enabled(&mut self, enabled: bool);

    /// Push the current flags to the driver station.
    ///
    /// # Errors
    ///
    /// Returns an error if the update could not be delivered.
    async fn update(&mut self) -> Result<(), ConnectionError>;

    /// Shut the connection down and release its resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection could not be closed cleanly. The
    /// connection must not be used afterwards either way.
    async fn close(&mut self) -> Result<(), ConnectionError>;
}

/// Opens driver station connections.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Open a connection for `team` at `station`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    async fn connect(
        &self,
        team: &Team,
        station: StationKey,
    ) -> Result<Box<dyn DriverStationConnection>, ConnectionError>;
}

/// A no-op connection factory for running without field hardware.
///
/// Connections it opens accept every update, never report a linked robot,
/// and only log what they would have sent.
#[derive(Debug, Clone, Default)]
pub struct NoopConnectionFactory;

impl NoopConnectionFactory {
    /// Create a new no-op factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConnectionFactory for NoopConnectionFactory {
    async fn connect(
        &self,
        team: &Team,
        station: StationKey,
    ) -> Result<Box<dyn DriverStationConnection>, ConnectionError> {
        tracing::warn!(
            team = %team.id,
            station = %station,
            "NoopConnectionFactory: no driver station transport configured"
        );
        Ok(Box::new(NoopConnection {
            team_id: team.id,
            station,
            auto: false,
            enabled: false,
        }))
    }
}

struct NoopConnection {
    team_id: TeamId,
    station: StationKey,
    auto: bool,
    enabled: bool,
}

#[async_trait]
impl DriverStationConnection for NoopConnection {
    fn team_id(&self) -> TeamId {
        self.team_id
    }

    fn robot_linked(&self) -> bool {
        false
    }

    fn set_auto(&mut self, auto: bool) {
        self.auto = auto;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    async fn update(&mut self) -> Result<(), ConnectionError> {
        tracing::trace!(
            team = %self.team_id,
            station = %self.station,
            auto = self.auto,
            enabled = self.enabled,
            "NoopConnection: update"
        );
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        Ok(())
    }
}

/// In-memory connections for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    use crate::lifecycle::PeriodFlags;

    /// Shared view of one mock connection, kept by the factory after the
    /// connection itself has been handed to a station.
    #[derive(Debug)]
    pub struct MockLink {
        team_id: TeamId,
        station: StationKey,
        state: Mutex<LinkState>,
    }

    #[derive(Debug, Default)]
    struct LinkState {
        linked: bool,
        sent: Vec<PeriodFlags>,
        closed: bool,
        fail_updates: bool,
        hang_updates: bool,
        fail_close: bool,
    }

    impl MockLink {
        /// The team this link was opened for.
        #[must_use]
        pub fn team_id(&self) -> TeamId {
            self.team_id
        }

        /// The station this link was opened at.
        #[must_use]
        pub fn station(&self) -> StationKey {
            self.station
        }

        /// Simulate the robot linking or dropping.
        pub fn set_linked(&self, linked: bool) {
            self.state.lock().linked = linked;
        }

        /// Make subsequent updates fail.
        pub fn fail_updates(&self, fail: bool) {
            self.state.lock().fail_updates = fail;
        }

        /// Make subsequent updates never complete.
        pub fn hang_updates(&self, hang: bool) {
            self.state.lock().hang_updates = hang;
        }

        /// Make closing fail.
        pub fn fail_close(&self, fail: bool) {
            self.state.lock().fail_close = fail;
        }

        /// Flags delivered by successful updates, oldest first.
        #[must_use]
        pub fn sent(&self) -> Vec<PeriodFlags> {
            self.state.lock().sent.clone()
        }

        /// Flags delivered by the most recent successful update.
        #[must_use]
        pub fn last_sent(&self) -> Option<PeriodFlags> {
            self.state.lock().sent.last().copied()
        }

        /// Number of successful updates.
        #[must_use]
        pub fn update_count(&self) -> usize {
            self.state.lock().sent.len()
        }

        /// Whether `close` has been called.
        #[must_use]
        pub fn is_closed(&self) -> bool {
            self.state.lock().closed
        }
    }

    struct MockConnection {
        link: Arc<MockLink>,
        auto: bool,
        enabled: bool,
    }

    #[async_trait]
    impl DriverStationConnection for MockConnection {
        fn team_id(&self) -> TeamId {
            self.link.team_id
        }

        fn robot_linked(&self) -> bool {
            self.link.state.lock().linked
        }

        fn set_auto(&mut self, auto: bool) {
            self.auto = auto;
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }

        async fn update(&mut self) -> Result<(), ConnectionError> {
            let hang = {
                let mut state = self.link.state.lock();
                if state.fail_updates {
                    return Err(ConnectionError::Update("mock link down".into()));
                }
                if !state.hang_updates {
                    state.sent.push(PeriodFlags::new(self.auto, self.enabled));
                }
                state.hang_updates
            };
            if hang {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ConnectionError> {
            let mut state = self.link.state.lock();
            state.closed = true;
            if state.fail_close {
                return Err(ConnectionError::Close("mock close failure".into()));
            }
            Ok(())
        }
    }

    /// A connection factory that records every connection it opens.
    #[derive(Debug, Default)]
    pub struct MockConnectionFactory {
        links: Mutex<Vec<Arc<MockLink>>>,
        linked_by_default: bool,
        refuse: Mutex<HashSet<TeamId>>,
    }

    impl MockConnectionFactory {
        /// Create a factory whose robots start unlinked.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a factory whose robots link as soon as they connect.
        #[must_use]
        pub fn linked() -> Self {
            Self {
                linked_by_default: true,
                ..Self::default()
            }
        }

        /// Refuse future connections for `team`.
        pub fn refuse(&self, team: TeamId) {
            self.refuse.lock().insert(team);
        }

        /// Number of connections opened so far.
        #[must_use]
        pub fn connect_count(&self) -> usize {
            self.links.lock().len()
        }

        /// Number of connections closed so far.
        #[must_use]
        pub fn close_count(&self) -> usize {
            self.links.lock().iter().filter(|l| l.is_closed()).count()
        }

        /// The open link at `station`, if any.
        #[must_use]
        pub fn link(&self, station: StationKey) -> Option<Arc<MockLink>> {
            self.links
                .lock()
                .iter()
                .rev()
                .find(|l| l.station == station && !l.is_closed())
                .cloned()
        }

        /// Every link opened so far, oldest first.
        #[must_use]
        pub fn links(&self) -> Vec<Arc<MockLink>> {
            self.links.lock().clone()
        }
    }

    #[async_trait]
    impl ConnectionFactory for MockConnectionFactory {
        async fn connect(
            &self,
            team: &Team,
            station: StationKey,
        ) -> Result<Box<dyn DriverStationConnection>, ConnectionError> {
            if self.refuse.lock().contains(&team.id) {
                return Err(ConnectionError::Connect(format!(
                    "team {} refused",
                    team.id
                )));
            }

            let link = Arc::new(MockLink {
                team_id: team.id,
                station,
                state: Mutex::new(LinkState {
                    linked: self.linked_by_default,
                    ..LinkState::default()
                }),
            });
            self.links.lock().push(Arc::clone(&link));

            Ok(Box::new(MockConnection {
                link,
                auto: false,
                enabled: false,
            }))
        }
    }
}
