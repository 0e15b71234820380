use std::time::Duration;

use clap::Subcommand;
use pomoalarm_core::storage::Database;
use pomoalarm_core::timer::now_ms;
use pomoalarm_core::{AlarmService, Event, TimerRun, TimerState, UserContext};
use tracing::warn;

use super::{current_user, open_store, print_json, CmdResult};

/// Local-storage key holding the serialized active run.
const RUN_KEY: &str = "activeRun";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a run of one of your alarms in the background
    Start {
        /// Alarm ID
        alarm: i64,
    },
    /// Pause the active run
    Pause,
    /// Resume the paused run
    Resume,
    /// Print the active run's state as JSON
    Status,
    /// Abandon the active run without recording a session
    Cancel,
    /// Run an alarm in the foreground, printing events until it finishes.
    /// Ctrl-C cancels.
    Run {
        /// Alarm ID
        alarm: i64,
        /// Milliseconds per timer second
        #[arg(long, default_value = "1000", hide = true)]
        tick_ms: u64,
    },
}

pub fn load_run(db: &Database) -> Result<Option<TimerRun>, Box<dyn std::error::Error>> {
    let Some(json) = db.kv_get(RUN_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str::<TimerRun>(&json) {
        Ok(run) => Ok(Some(run)),
        Err(e) => {
            warn!(error = %e, "discarding unreadable active run");
            clear_run(db)?;
            Ok(None)
        }
    }
}

fn save_run(db: &Database, run: &TimerRun) -> CmdResult {
    let json = serde_json::to_string(run)?;
    db.kv_set(RUN_KEY, &json)?;
    Ok(())
}

pub fn clear_run(db: &Database) -> CmdResult {
    db.kv_delete(RUN_KEY)?;
    Ok(())
}

/// Load the caller's run and apply the wall-clock time since it was last
/// touched. Any events that produced (including the recorded session) are
/// returned for printing.
fn active_run(
    db: &Database,
    ctx: &UserContext,
) -> Result<(TimerRun, Vec<Event>), Box<dyn std::error::Error>> {
    let mut run = match load_run(db)? {
        Some(run) if run.user_id() == ctx.user_id() => run,
        _ => return Err("no active run; start one with `timer start <alarm>`".into()),
    };
    // Saved even when recording fails, so the finish is not replayed.
    let caught_up = run.catch_up(db, now_ms());
    save_run(db, &run)?;
    Ok((run, caught_up?))
}

fn print_events(events: &[Event]) -> CmdResult {
    for event in events {
        print_json(event)?;
    }
    Ok(())
}

pub fn run(action: TimerAction) -> CmdResult {
    let db = open_store()?;
    let ctx = current_user(&db)?;

    match action {
        TimerAction::Start { alarm } => {
            if let Some(existing) = load_run(&db)? {
                if existing.user_id() == ctx.user_id() && existing.state() != TimerState::Finished
                {
                    return Err("a run is already active; cancel it first".into());
                }
            }
            let alarm = AlarmService::new(&db).get(&ctx, alarm)?;
            let (mut run, started) = TimerRun::start(&ctx, &alarm)?;
            run.catch_up(&db, now_ms())?;
            save_run(&db, &run)?;
            print_json(&started)?;
        }
        TimerAction::Pause => {
            let (mut run, events) = active_run(&db, &ctx)?;
            print_events(&events)?;
            match run.pause() {
                Some(event) => {
                    save_run(&db, &run)?;
                    print_json(&event)?;
                }
                None => print_json(&run.engine().snapshot())?,
            }
        }
        TimerAction::Resume => {
            let (mut run, events) = active_run(&db, &ctx)?;
            print_events(&events)?;
            match run.resume() {
                Some(event) => {
                    run.catch_up(&db, now_ms())?;
                    save_run(&db, &run)?;
                    print_json(&event)?;
                }
                None => print_json(&run.engine().snapshot())?,
            }
        }
        TimerAction::Status => {
            let (run, events) = active_run(&db, &ctx)?;
            print_events(&events)?;
            print_json(&run.engine().snapshot())?;
        }
        TimerAction::Cancel => {
            let (run, events) = active_run(&db, &ctx)?;
            print_events(&events)?;
            clear_run(&db)?;
            match run.cancel() {
                Some(event) => print_json(&event)?,
                None => println!("run already finished"),
            }
        }
        TimerAction::Run { alarm, tick_ms } => {
            let alarm = AlarmService::new(&db).get(&ctx, alarm)?;
            let (run, started) = TimerRun::start(&ctx, &alarm)?;
            print_json(&started)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(foreground(&db, run, Duration::from_millis(tick_ms.max(1))))?;
        }
    }
    Ok(())
}

/// Tick `run` on an interval until it finishes or Ctrl-C cancels it.
async fn foreground(db: &Database, mut run: TimerRun, period: Duration) -> CmdResult {
    let mut interval = tokio::time::interval(period);
    // The first tick of a tokio interval completes immediately.
    interval.tick().await;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                if let Some(event) = run.cancel() {
                    print_json(&event)?;
                }
                return Ok(());
            }
            _ = interval.tick() => {
                print_events(&run.tick(db)?)?;
                if run.state() == TimerState::Finished {
                    return Ok(());
                }
            }
        }
    }
}
