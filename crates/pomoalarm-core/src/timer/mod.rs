mod engine;
mod profile;
mod run;

pub use engine::{now_ms, TimerEngine, TimerState};
pub use profile::{Phase, RunProfile};
pub use run::TimerRun;
