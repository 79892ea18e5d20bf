//! Shared access to an [`Arena`] and the periodic driver.
//!
//! Ticks and operator actions go through one async mutex, so no two of them
//! ever interleave. Display readers use [`ArenaHandle::snapshot`] instead,
//! which never waits on the arena lock.

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use fms_store::Store;
use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::MissedTickBehavior;

use crate::arena::Arena;
use crate::connection::ConnectionFactory;
use crate::types::{ArenaSnapshot, TickReport};

/// Cloneable handle to a shared arena.
pub struct ArenaHandle<S: Store, F: ConnectionFactory> {
    arena: Arc<Mutex<Arena<S, F>>>,
    snapshot: Arc<RwLock<ArenaSnapshot>>,
    loop_period: Duration,
}

impl<S: Store, F: ConnectionFactory> Clone for ArenaHandle<S, F> {
    fn clone(&self) -> Self {
        Self {
            arena: Arc::clone(&self.arena),
            snapshot: Arc::clone(&self.snapshot),
            loop_period: self.loop_period,
        }
    }
}

impl<S: Store, F: ConnectionFactory> ArenaHandle<S, F> {
    /// Wrap an arena for shared use.
    #[must_use]
    pub fn new(arena: Arena<S, F>) -> Self {
        let snapshot = arena.snapshot();
        let loop_period = arena.config().loop_period();
        Self {
            arena: Arc::new(Mutex::new(arena)),
            snapshot: Arc::new(RwLock::new(snapshot)),
            loop_period,
        }
    }

    /// Take exclusive access to the arena.
    ///
    /// The display snapshot is refreshed when the guard is dropped.
    pub async fn lock(&self) -> ArenaGuard<'_, S, F> {
        ArenaGuard {
            arena: self.arena.lock().await,
            snapshot: &self.snapshot,
        }
    }

    /// The most recently published display view.
    #[must_use]
    pub fn snapshot(&self) -> ArenaSnapshot {
        self.snapshot.read().clone()
    }

    /// Run one control loop step under the arena lock.
    pub async fn tick(&self) -> TickReport {
        let mut arena = self.lock().await;
        arena.tick().await
    }

    /// Tick every loop period until `shutdown` completes.
    ///
    /// Late ticks are skipped rather than bunched; the state machine works
    /// from elapsed match time, so a skipped tick only delays a transition.
    pub async fn run<Sd>(&self, shutdown: Sd)
    where
        Sd: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.loop_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        tracing::info!(period = ?self.loop_period, "Control loop started");

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Control loop stopping");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.tick().await;
                    if report.transitioned {
                        tracing::debug!(state = ?report.state, "Tick advanced match");
                    }
                }
            }
        }
    }
}

/// Exclusive access to the arena. Publishes a fresh snapshot on drop.
pub struct ArenaGuard<'a, S: Store, F: ConnectionFactory> {
    arena: MutexGuard<'a, Arena<S, F>>,
    snapshot: &'a RwLock<ArenaSnapshot>,
}

impl<S: Store, F: ConnectionFactory> Deref for ArenaGuard<'_, S, F> {
    type Target = Arena<S, F>;

    fn deref(&self) -> &Self::Target {
        &self.arena
    }
}

impl<S: Store, F: ConnectionFactory> DerefMut for ArenaGuard<'_, S, F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.arena
    }
}

impl<S: Store, F: ConnectionFactory> Drop for ArenaGuard<'_, S, F> {
    fn drop(&mut self) {
        *self.snapshot.write() = self.arena.snapshot();
    }
}
