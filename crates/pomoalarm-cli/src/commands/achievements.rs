use clap::Subcommand;
use pomoalarm_core::AchievementService;

use super::{current_user, open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// Completed sessions with their alarm, newest first
    List,
    /// Session totals: all time, today and the last 7 days
    Stats,
}

pub fn run(action: AchievementsAction) -> CmdResult {
    let db = open_store()?;
    let ctx = current_user(&db)?;
    let achievements = AchievementService::new(&db);

    match action {
        AchievementsAction::List => print_json(&achievements.with_alarms(&ctx)?)?,
        AchievementsAction::Stats => print_json(&achievements.stats(&ctx)?)?,
    }
    Ok(())
}
