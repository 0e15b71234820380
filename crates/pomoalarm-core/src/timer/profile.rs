use serde::{Deserialize, Serialize};

use crate::models::Alarm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Uptime,
    Downtime,
    Finished,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Uptime => "Uptime",
            Phase::Downtime => "Downtime",
            Phase::Finished => "Finished",
        }
    }

    /// What the user is expected to do during the phase.
    pub fn instruction(self) -> &'static str {
        match self {
            Phase::Uptime => "Work on the chosen activity.",
            Phase::Downtime => "Take a break.",
            Phase::Finished => "Session complete.",
        }
    }
}

/// The alarm values a run is driven by, frozen when the run starts.
///
/// Editing the alarm mid-run does not affect a run in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProfile {
    pub alarm_id: i64,
    pub alarm_name: String,
    pub uptime_minutes: u32,
    pub downtime_minutes: u32,
    pub repetitions: u32,
}

impl RunProfile {
    /// Phase duration in seconds. Uses saturating arithmetic.
    pub fn phase_secs(&self, phase: Phase) -> u64 {
        let minutes = match phase {
            Phase::Uptime => self.uptime_minutes,
            Phase::Downtime => self.downtime_minutes,
            Phase::Finished => 0,
        };
        u64::from(minutes).saturating_mul(60)
    }

    /// Seconds of countdown in one uptime+downtime cycle.
    pub fn cycle_secs(&self) -> u64 {
        self.phase_secs(Phase::Uptime) + self.phase_secs(Phase::Downtime)
    }

    pub fn total_secs(&self) -> u64 {
        self.cycle_secs().saturating_mul(u64::from(self.repetitions))
    }

}

impl From<&Alarm> for RunProfile {
    fn from(alarm: &Alarm) -> Self {
        Self {
            alarm_id: alarm.id,
            alarm_name: alarm.name.clone(),
            uptime_minutes: alarm.uptime_minutes,
            downtime_minutes: alarm.downtime_minutes,
            repetitions: alarm.repetitions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> RunProfile {
        RunProfile {
            alarm_id: 1,
            alarm_name: "Pomodoro".into(),
            uptime_minutes: 25,
            downtime_minutes: 5,
            repetitions: 4,
        }
    }

    #[test]
    fn durations() {
        let p = profile();
        assert_eq!(p.phase_secs(Phase::Uptime), 1500);
        assert_eq!(p.phase_secs(Phase::Downtime), 300);
        assert_eq!(p.phase_secs(Phase::Finished), 0);
        assert_eq!(p.cycle_secs(), 1800);
        assert_eq!(p.total_secs(), 7200);
    }

    #[test]
    fn instructions_per_phase() {
        assert_eq!(Phase::Uptime.instruction(), "Work on the chosen activity.");
        assert_eq!(Phase::Downtime.instruction(), "Take a break.");
        assert_eq!(Phase::Finished.instruction(), "Session complete.");
    }
}
