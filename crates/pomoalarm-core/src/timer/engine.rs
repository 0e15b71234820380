//! Timer engine implementation.
//!
//! The engine is a plain state machine with no internal thread and no clock
//! of its own. One call to [`TimerEngine::tick`] is one elapsed second; the
//! caller decides where seconds come from (a `tokio` interval, a wall-clock
//! catch-up, or a test loop).
//!
//! ## State Transitions
//!
//! ```text
//! Uptime(1) -> Downtime(1) -> Uptime(2) -> ... -> Downtime(n) -> Finished
//! ```
//!
//! A tick with time left on the clock only counts down. The tick that finds
//! the clock at zero performs the transition and does not count as elapsed
//! time, so the accumulated total is exactly the sum of all phase lengths.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(profile);
//! // Once per second:
//! if let Some(event) = engine.tick() { /* phase changed or finished */ }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::{Phase, RunProfile};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Running,
    Paused,
    Finished,
}

/// Countdown state machine for one run of an alarm profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerEngine {
    profile: RunProfile,
    phase: Phase,
    /// 1-based repetition counter.
    repetition: u32,
    remaining_secs: u64,
    /// Seconds actually counted down so far.
    elapsed_secs: u64,
    paused: bool,
    /// Wall-clock anchor (ms since epoch) for [`TimerEngine::catch_up`].
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

impl TimerEngine {
    /// Create a running engine at `Uptime(1)` with the full uptime on the clock.
    pub fn new(profile: RunProfile) -> Self {
        let remaining_secs = profile.phase_secs(Phase::Uptime);
        Self {
            profile,
            phase: Phase::Uptime,
            repetition: 1,
            remaining_secs,
            elapsed_secs: 0,
            paused: false,
            last_tick_epoch_ms: None,
            completed_at: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        if self.phase == Phase::Finished {
            TimerState::Finished
        } else if self.paused {
            TimerState::Paused
        } else {
            TimerState::Running
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn repetition(&self) -> u32 {
        self.repetition
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn profile(&self) -> &RunProfile {
        &self.profile
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// `floor(elapsed / 60)`, the value recorded on the session.
    pub fn total_duration_minutes(&self) -> u32 {
        u32::try_from(self.elapsed_secs / 60).unwrap_or(u32::MAX)
    }

    /// Remaining time of the current phase as `MM:SS`.
    pub fn remaining_display(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_secs / 60,
            self.remaining_secs % 60
        )
    }

    /// Phase title shown to the user, e.g. `Uptime (Repetition 2)`.
    pub fn title(&self) -> String {
        match self.phase {
            Phase::Finished => Phase::Finished.label().to_string(),
            phase => format!("{} (Repetition {})", phase.label(), self.repetition),
        }
    }

    /// 0.0 .. 100.0 progress across the entire run.
    pub fn progress_pct(&self) -> f64 {
        let total = self.profile.total_secs();
        if total == 0 {
            return 0.0;
        }
        (self.elapsed_secs as f64 / total as f64 * 100.0).min(100.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            alarm_id: self.profile.alarm_id,
            alarm_name: self.profile.alarm_name.clone(),
            phase: self.phase,
            title: self.title(),
            instruction: self.phase.instruction().to_string(),
            repetition: self.repetition,
            repetitions: self.profile.repetitions,
            remaining_secs: self.remaining_secs,
            remaining_display: self.remaining_display(),
            elapsed_secs: self.elapsed_secs,
            progress_pct: self.progress_pct(),
            at: Utc::now(),
        }
    }

    /// Event announcing the run, for callers that just created the engine.
    pub fn started_event(&self) -> Event {
        Event::RunStarted {
            alarm_id: self.profile.alarm_id,
            alarm_name: self.profile.alarm_name.clone(),
            repetitions: self.profile.repetitions,
            duration_secs: self.profile.total_secs(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn pause(&mut self) -> Option<Event> {
        if self.state() != TimerState::Running {
            return None;
        }
        self.paused = true;
        self.last_tick_epoch_ms = None;
        Some(Event::RunPaused {
            remaining_secs: self.remaining_secs,
            elapsed_secs: self.elapsed_secs,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state() != TimerState::Paused {
            return None;
        }
        self.paused = false;
        self.last_tick_epoch_ms = None;
        Some(Event::RunResumed {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Abandon the run. Returns `None` if it had already finished.
    pub fn cancel(self) -> Option<Event> {
        if self.phase == Phase::Finished {
            return None;
        }
        Some(Event::RunCancelled {
            alarm_id: self.profile.alarm_id,
            discarded_secs: self.elapsed_secs,
            at: Utc::now(),
        })
    }

    /// Advance by one second.
    ///
    /// Returns `Some(Event::PhaseChanged)` on a transition and
    /// `Some(Event::RunFinished)` exactly once, when the last downtime ends.
    /// Does nothing while paused or finished.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state() != TimerState::Running {
            return None;
        }

        if self.remaining_secs > 0 {
            self.remaining_secs -= 1;
            self.elapsed_secs += 1;
            return None;
        }

        match self.phase {
            Phase::Uptime => Some(self.enter(Phase::Downtime)),
            Phase::Downtime if self.repetition < self.profile.repetitions => {
                self.repetition += 1;
                Some(self.enter(Phase::Uptime))
            }
            Phase::Downtime => Some(self.finish()),
            Phase::Finished => None,
        }
    }

    /// Apply `secs` ticks, stopping early once the run finishes.
    pub fn advance(&mut self, secs: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..secs {
            if self.state() != TimerState::Running {
                break;
            }
            if let Some(event) = self.tick() {
                events.push(event);
            }
        }
        events
    }

    /// Apply the whole seconds that passed since the last call.
    ///
    /// The first call after creation or resume only sets the anchor.
    /// Sub-second remainders carry over to the next call.
    pub fn catch_up(&mut self, now_epoch_ms: u64) -> Vec<Event> {
        if self.state() != TimerState::Running {
            return Vec::new();
        }
        let Some(last) = self.last_tick_epoch_ms else {
            self.last_tick_epoch_ms = Some(now_epoch_ms);
            return Vec::new();
        };
        let whole_secs = now_epoch_ms.saturating_sub(last) / 1000;
        self.last_tick_epoch_ms = Some(last + whole_secs * 1000);
        self.advance(whole_secs)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter(&mut self, phase: Phase) -> Event {
        self.phase = phase;
        self.remaining_secs = self.profile.phase_secs(phase);
        Event::PhaseChanged {
            phase,
            repetition: self.repetition,
            duration_secs: self.remaining_secs,
            at: Utc::now(),
        }
    }

    fn finish(&mut self) -> Event {
        let completed_at = Utc::now();
        self.phase = Phase::Finished;
        self.last_tick_epoch_ms = None;
        self.completed_at = Some(completed_at);
        Event::RunFinished {
            alarm_id: self.profile.alarm_id,
            elapsed_secs: self.elapsed_secs,
            total_duration_minutes: self.total_duration_minutes(),
            completed_at,
        }
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(uptime: u32, downtime: u32, repetitions: u32) -> RunProfile {
        RunProfile {
            alarm_id: 9,
            alarm_name: "Test".into(),
            uptime_minutes: uptime,
            downtime_minutes: downtime,
            repetitions,
        }
    }

    fn run_to_end(engine: &mut TimerEngine) -> Vec<Event> {
        let mut events = Vec::new();
        while engine.state() != TimerState::Finished {
            events.extend(engine.tick());
        }
        events
    }

    #[test]
    fn starts_in_first_uptime() {
        let engine = TimerEngine::new(profile(25, 5, 4));
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.phase(), Phase::Uptime);
        assert_eq!(engine.repetition(), 1);
        assert_eq!(engine.remaining_secs(), 25 * 60);
        assert_eq!(engine.remaining_display(), "25:00");
        assert_eq!(engine.title(), "Uptime (Repetition 1)");
    }

    #[test]
    fn uptime_hands_over_to_downtime() {
        let mut engine = TimerEngine::new(profile(1, 1, 2));
        assert!(engine.advance(60).is_empty());
        assert_eq!(engine.remaining_secs(), 0);
        assert_eq!(engine.phase(), Phase::Uptime);

        match engine.tick() {
            Some(Event::PhaseChanged {
                phase,
                repetition,
                duration_secs,
                ..
            }) => {
                assert_eq!(phase, Phase::Downtime);
                assert_eq!(repetition, 1);
                assert_eq!(duration_secs, 60);
            }
            other => panic!("Expected PhaseChanged, got {other:?}"),
        }
        assert_eq!(engine.elapsed_secs(), 60);
    }

    #[test]
    fn downtime_starts_next_repetition() {
        let mut engine = TimerEngine::new(profile(1, 1, 2));
        engine.advance(60 + 1 + 60);
        let event = engine.tick();
        assert!(matches!(
            event,
            Some(Event::PhaseChanged {
                phase: Phase::Uptime,
                repetition: 2,
                ..
            })
        ));
        assert_eq!(engine.remaining_secs(), 60);
    }

    #[test]
    fn classic_pomodoro_finishes_once_with_120_minutes() {
        let mut engine = TimerEngine::new(profile(25, 5, 4));
        let events = run_to_end(&mut engine);

        let finished: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, Event::RunFinished { .. }))
            .collect();
        assert_eq!(finished.len(), 1);
        match finished[0] {
            Event::RunFinished {
                total_duration_minutes,
                elapsed_secs,
                ..
            } => {
                assert_eq!(*total_duration_minutes, 120);
                assert_eq!(*elapsed_secs, 120 * 60);
            }
            _ => unreachable!(),
        }

        let phase_changes = events
            .iter()
            .filter(|e| matches!(e, Event::PhaseChanged { .. }))
            .count();
        assert_eq!(phase_changes, 4 + 3);
        assert!(engine.completed_at().is_some());
        assert_eq!(engine.progress_pct(), 100.0);
    }

    #[test]
    fn finished_engine_ignores_further_ticks() {
        let mut engine = TimerEngine::new(profile(1, 1, 1));
        run_to_end(&mut engine);
        let before = engine.clone();
        assert!(engine.tick().is_none());
        assert!(engine.advance(500).is_empty());
        assert_eq!(engine, before);
        assert!(engine.pause().is_none());
    }

    #[test]
    fn pause_and_resume_preserve_counters() {
        let mut engine = TimerEngine::new(profile(25, 5, 4));
        engine.advance(1234);
        let remaining = engine.remaining_secs();
        let elapsed = engine.elapsed_secs();

        assert!(engine.pause().is_some());
        assert_eq!(engine.state(), TimerState::Paused);
        assert!(engine.pause().is_none());
        assert!(engine.advance(999).is_empty());
        assert_eq!(engine.remaining_secs(), remaining);
        assert_eq!(engine.elapsed_secs(), elapsed);

        assert!(engine.resume().is_some());
        assert!(engine.resume().is_none());
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.remaining_secs(), remaining);
        assert_eq!(engine.elapsed_secs(), elapsed);

        engine.tick();
        assert_eq!(engine.remaining_secs(), remaining - 1);
    }

    #[test]
    fn cancel_reports_discarded_progress() {
        let mut engine = TimerEngine::new(profile(25, 5, 4));
        engine.advance(90);
        match engine.cancel() {
            Some(Event::RunCancelled { discarded_secs, .. }) => assert_eq!(discarded_secs, 90),
            other => panic!("Expected RunCancelled, got {other:?}"),
        }
    }

    #[test]
    fn catch_up_applies_whole_seconds() {
        let mut engine = TimerEngine::new(profile(25, 5, 4));
        assert!(engine.catch_up(10_000).is_empty());
        assert_eq!(engine.elapsed_secs(), 0);

        engine.catch_up(12_500);
        assert_eq!(engine.elapsed_secs(), 2);
        engine.catch_up(13_000);
        assert_eq!(engine.elapsed_secs(), 3);
    }

    #[test]
    fn catch_up_ignores_time_spent_paused() {
        let mut engine = TimerEngine::new(profile(25, 5, 4));
        engine.catch_up(0);
        engine.catch_up(5_000);
        engine.pause();
        engine.catch_up(60_000);
        engine.resume();
        engine.catch_up(60_000);
        engine.catch_up(61_000);
        assert_eq!(engine.elapsed_secs(), 6);
    }

    #[test]
    fn engine_survives_serialization_mid_run() {
        let mut engine = TimerEngine::new(profile(2, 1, 3));
        engine.advance(200);
        engine.pause();
        let json = serde_json::to_string(&engine).unwrap();
        let restored: TimerEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, engine);
        assert_eq!(restored.state(), TimerState::Paused);
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let engine = TimerEngine::new(profile(25, 5, 4));
        match engine.snapshot() {
            Event::StateSnapshot {
                state,
                phase,
                repetition,
                remaining_secs,
                ..
            } => {
                assert_eq!(state, TimerState::Running);
                assert_eq!(phase, Phase::Uptime);
                assert_eq!(repetition, 1);
                assert_eq!(remaining_secs, 25 * 60);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_carries_title_and_instruction() {
        let mut engine = TimerEngine::new(profile(1, 1, 2));
        engine.advance(61);
        match engine.snapshot() {
            Event::StateSnapshot {
                title, instruction, ..
            } => {
                assert_eq!(title, "Downtime (Repetition 1)");
                assert_eq!(instruction, "Take a break.");
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }

        run_to_end(&mut engine);
        match engine.snapshot() {
            Event::StateSnapshot {
                title, instruction, ..
            } => {
                assert_eq!(title, "Finished");
                assert_eq!(instruction, "Session complete.");
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }
}
