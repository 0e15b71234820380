use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerState};

/// Every timer state change produces an Event.
/// The CLI prints them as JSON; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    RunStarted {
        alarm_id: i64,
        alarm_name: String,
        repetitions: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    RunPaused {
        remaining_secs: u64,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    RunResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Uptime turned into downtime or the next repetition began.
    PhaseChanged {
        phase: Phase,
        repetition: u32,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// The last downtime ended. Emitted exactly once per run.
    RunFinished {
        alarm_id: i64,
        elapsed_secs: u64,
        total_duration_minutes: u32,
        completed_at: DateTime<Utc>,
    },
    /// The run was abandoned; nothing is recorded.
    RunCancelled {
        alarm_id: i64,
        discarded_secs: u64,
        at: DateTime<Utc>,
    },
    SessionRecorded {
        session_id: i64,
        alarm_id: i64,
        total_duration_minutes: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        alarm_id: i64,
        alarm_name: String,
        phase: Phase,
        /// e.g. `Uptime (Repetition 2)`
        title: String,
        /// What to do during the current phase.
        instruction: String,
        repetition: u32,
        repetitions: u32,
        remaining_secs: u64,
        remaining_display: String,
        elapsed_secs: u64,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}
