//! # Pomoalarm Core Library
//!
//! Core logic for the Pomoalarm interval timer. Everything is usable from the
//! `pomoalarm` CLI, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Storage**: SQLite document tables (`users`, `alarms`, `sessions`) with
//!   declared secondary indexes, a small key-value table standing in for local
//!   storage, and TOML configuration
//! - **Auth**: registration and login against the store; the logged-in user is
//!   an explicit [`UserContext`]
//! - **Timer Engine**: a tick-driven state machine alternating uptime and
//!   downtime phases for a number of repetitions
//! - **Services**: owner-scoped alarm management, achievements and statistics,
//!   sample data
//!
//! ## Key Components
//!
//! - [`Database`]: record persistence
//! - [`AuthGateway`]: credential checks and the saved current user
//! - [`TimerEngine`] / [`TimerRun`]: the countdown, and a run that records its
//!   session on completion
//! - [`Config`]: application configuration management

pub mod achievements;
pub mod alarms;
pub mod auth;
pub mod error;
pub mod events;
pub mod models;
pub mod seed;
pub mod storage;
pub mod timer;

pub use achievements::{Achievement, AchievementService, AchievementStats, LinkedAlarm};
pub use alarms::AlarmService;
pub use auth::{AuthGateway, AuthOutcome, UserContext};
pub use error::{AuthError, ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::Event;
pub use models::{Alarm, AlarmPatch, AlarmSettings, NewAlarm, NewSession, NewUser, Session, User};
pub use seed::{SeedMode, SeedSummary};
pub use storage::{Config, Database, Table};
pub use timer::{Phase, RunProfile, TimerEngine, TimerRun, TimerState};
