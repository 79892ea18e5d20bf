//! Arena core for the field management system.
//!
//! This crate runs a single competition field: it tracks the loaded match,
//! steps the match through its timed periods, decides when a match may
//! start, and tells each team's driver station whether its robot is enabled.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Operator actions          Control loop           │
//! │          (load, start, abort)     (ArenaHandle::run)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ one lock
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           Arena                             │
//! │  ┌──────────────┐ ┌──────────────────┐ ┌────────────────┐   │
//! │  │ Current      │ │ Lifecycle        │ │ Station        │   │
//! │  │ match        │ │ state machine    │ │ registry       │   │
//! │  └──────────────┘ └──────────────────┘ └────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                  │                                │
//!                  ▼                                ▼
//!          ┌───────────────┐             ┌─────────────────────┐
//!          │    Store      │             │ Driver station      │
//!          │  (RocksDB)    │             │ connections (x6)    │
//!          └───────────────┘             └─────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use fms_arena::{Arena, ArenaConfig, ArenaHandle, NoopConnectionFactory};
//! use fms_core::{StationKey, TeamId};
//! use fms_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/fms")?);
//! let factory = Arc::new(NoopConnectionFactory::new());
//! let arena = Arena::new(store, factory, ArenaConfig::default()).await?;
//! let handle = ArenaHandle::new(arena);
//!
//! {
//!     let mut arena = handle.lock().await;
//!     arena.substitute_team(TeamId::new(254), StationKey::Red1).await?;
//!     arena.set_bypass(StationKey::Red1, true);
//! }
//!
//! // Drive the loop until Ctrl-C
//! handle
//!     .run(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! # Match Periods
//!
//! With the default timing a started match runs 10 s of autonomous, a 1 s
//! pause, then 140 s of teleoperated play whose final 30 s are the endgame.
//! See the [`lifecycle`] module for the state machine.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod connection;
pub mod error;
pub mod handle;
pub mod lifecycle;
pub mod station;
pub mod types;

pub use arena::Arena;
pub use connection::{ConnectionFactory, DriverStationConnection, NoopConnectionFactory};
pub use error::{ArenaError, ConnectionError, Result};
pub use handle::{ArenaGuard, ArenaHandle};
pub use lifecycle::{MatchState, MatchTiming, PeriodFlags};
pub use station::{AllianceStation, StationRegistry};
pub use types::{ArenaConfig, ArenaSnapshot, DispatchFailure, StationSnapshot, TickReport};

// Re-export commonly used types from dependencies for convenience
pub use fms_core::{StationKey, TeamId};
pub use fms_store::{Match, MatchType};
