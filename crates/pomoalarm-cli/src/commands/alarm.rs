use clap::Subcommand;
use pomoalarm_core::{AchievementService, AlarmPatch, AlarmService, Config};

use super::{current_user, open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// List your alarms
    List,
    /// Show one alarm
    Show {
        /// Alarm ID
        id: i64,
    },
    /// Create an alarm; omitted values come from the config defaults
    Create {
        #[arg(long)]
        name: Option<String>,
        /// Uptime minutes (1-120)
        #[arg(long)]
        uptime: Option<u32>,
        /// Downtime minutes (1-60)
        #[arg(long)]
        downtime: Option<u32>,
        /// Repetitions (1-20)
        #[arg(long)]
        repetitions: Option<u32>,
    },
    /// Change some of an alarm's settings
    Edit {
        /// Alarm ID
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        uptime: Option<u32>,
        #[arg(long)]
        downtime: Option<u32>,
        #[arg(long)]
        repetitions: Option<u32>,
    },
    /// Delete an alarm (its recorded sessions are kept)
    Delete {
        /// Alarm ID
        id: i64,
    },
    /// Sessions recorded for an alarm, including deleted ones
    History {
        /// Alarm ID
        id: i64,
    },
}

pub fn run(action: AlarmAction) -> CmdResult {
    let db = open_store()?;
    let ctx = current_user(&db)?;
    let alarms = AlarmService::new(&db);

    match action {
        AlarmAction::List => print_json(&alarms.list(&ctx)?)?,
        AlarmAction::Show { id } => print_json(&alarms.get(&ctx, id)?)?,
        AlarmAction::Create {
            name,
            uptime,
            downtime,
            repetitions,
        } => {
            let mut settings = Config::load()?.alarm_defaults();
            if let Some(name) = name {
                settings.name = name;
            }
            if let Some(v) = uptime {
                settings.uptime_minutes = v;
            }
            if let Some(v) = downtime {
                settings.downtime_minutes = v;
            }
            if let Some(v) = repetitions {
                settings.repetitions = v;
            }
            print_json(&alarms.create(&ctx, settings)?)?;
        }
        AlarmAction::Edit {
            id,
            name,
            uptime,
            downtime,
            repetitions,
        } => {
            let patch = AlarmPatch {
                name,
                uptime_minutes: uptime,
                downtime_minutes: downtime,
                repetitions,
            };
            print_json(&alarms.update(&ctx, id, patch)?)?;
        }
        AlarmAction::Delete { id } => {
            let alarm = alarms.delete(&ctx, id)?;
            println!("deleted alarm {} ({})", alarm.id, alarm.name);
        }
        AlarmAction::History { id } => {
            print_json(&AchievementService::new(&db).history(&ctx, id)?)?;
        }
    }
    Ok(())
}
