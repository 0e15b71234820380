use clap::Subcommand;
use pomoalarm_core::seed::{self, SeedMode};
use pomoalarm_core::AuthGateway;

use super::{current_user, open_store, print_json, timer, CmdResult};

#[derive(Subcommand)]
pub enum DataAction {
    /// Create the demo account with sample alarms and sessions
    Seed {
        /// Wipe all users, alarms and sessions first
        #[arg(long, conflicts_with = "mine")]
        force: bool,
        /// Replace the logged-in user's alarms and sessions with the samples
        #[arg(long)]
        mine: bool,
    },
    /// Delete all users, alarms and sessions
    Reset,
}

pub fn run(action: DataAction) -> CmdResult {
    let db = open_store()?;

    match action {
        DataAction::Seed { force, mine } => {
            let mode = if mine {
                SeedMode::ForceUser(current_user(&db)?.user_id())
            } else if force {
                SeedMode::ForceAll
            } else {
                SeedMode::IfEmpty
            };
            if mode != SeedMode::IfEmpty {
                timer::clear_run(&db)?;
            }
            if mode == SeedMode::ForceAll {
                AuthGateway::new(&db).logout()?;
            }
            match seed::create_sample_data(&db, mode)? {
                Some(summary) => print_json(&summary)?,
                None => println!("store already has users; use --force to recreate"),
            }
        }
        DataAction::Reset => {
            seed::clear_all_data(&db)?;
            AuthGateway::new(&db).logout()?;
            timer::clear_run(&db)?;
            println!("all data cleared");
        }
    }
    Ok(())
}
