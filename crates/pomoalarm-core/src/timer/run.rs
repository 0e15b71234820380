//! A timer run bound to the user who started it.
//!
//! [`TimerRun`] wraps a [`TimerEngine`] and writes the completed session to
//! the store the moment the engine reports `RunFinished`. The recorded
//! session id is kept on the run, so however often it is ticked afterwards
//! (or reloaded from local storage) a run records at most one session.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::engine::{TimerEngine, TimerState};
use super::profile::RunProfile;
use crate::auth::UserContext;
use crate::error::{AuthError, Result};
use crate::events::Event;
use crate::models::{Alarm, NewSession};
use crate::storage::Database;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerRun {
    user_id: i64,
    engine: TimerEngine,
    #[serde(default)]
    session_id: Option<i64>,
}

impl TimerRun {
    /// Start a run of one of the caller's alarms.
    ///
    /// # Errors
    /// `Forbidden` if the alarm belongs to another user.
    pub fn start(ctx: &UserContext, alarm: &Alarm) -> Result<(Self, Event)> {
        if alarm.user_id != ctx.user_id() {
            return Err(AuthError::Forbidden {
                resource: "alarm",
                id: alarm.id,
            }
            .into());
        }
        let engine = TimerEngine::new(RunProfile::from(alarm));
        let event = engine.started_event();
        info!(alarm_id = alarm.id, user_id = ctx.user_id(), "run started");
        Ok((
            Self {
                user_id: ctx.user_id(),
                engine,
                session_id: None,
            },
            event,
        ))
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn state(&self) -> TimerState {
        self.engine.state()
    }

    /// Id of the session written when the run finished.
    pub fn session_id(&self) -> Option<i64> {
        self.session_id
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.engine.pause()
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.engine.resume()
    }

    /// Discard the run. Nothing is written to the store.
    pub fn cancel(self) -> Option<Event> {
        let event = self.engine.cancel();
        if event.is_some() {
            info!(user_id = self.user_id, "run cancelled");
        }
        event
    }

    /// Advance one second, recording the session if the run finishes.
    pub fn tick(&mut self, db: &Database) -> Result<Vec<Event>> {
        let events = self.engine.tick().into_iter().collect();
        self.record_if_finished(db, events)
    }

    /// Advance `secs` seconds, recording the session if the run finishes.
    pub fn advance(&mut self, db: &Database, secs: u64) -> Result<Vec<Event>> {
        let events = self.engine.advance(secs);
        self.record_if_finished(db, events)
    }

    /// Apply the wall-clock seconds since the last call.
    pub fn catch_up(&mut self, db: &Database, now_epoch_ms: u64) -> Result<Vec<Event>> {
        let events = self.engine.catch_up(now_epoch_ms);
        self.record_if_finished(db, events)
    }

    fn record_if_finished(&mut self, db: &Database, mut events: Vec<Event>) -> Result<Vec<Event>> {
        if self.session_id.is_some() {
            return Ok(events);
        }
        let finished = events.iter().find_map(|event| match event {
            Event::RunFinished {
                alarm_id,
                total_duration_minutes,
                completed_at,
                ..
            } => Some(NewSession {
                alarm_id: *alarm_id,
                user_id: self.user_id,
                completed_at: *completed_at,
                total_duration_minutes: *total_duration_minutes,
            }),
            _ => None,
        });

        if let Some(new_session) = finished {
            let session = db.create_session(&new_session)?;
            info!(
                session_id = session.id,
                alarm_id = session.alarm_id,
                minutes = session.total_duration_minutes,
                "session recorded"
            );
            self.session_id = Some(session.id);
            events.push(Event::SessionRecorded {
                session_id: session.id,
                alarm_id: session.alarm_id,
                total_duration_minutes: session.total_duration_minutes,
                at: Utc::now(),
            });
        }
        Ok(events)
    }
}
