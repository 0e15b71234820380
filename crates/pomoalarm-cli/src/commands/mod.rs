pub mod achievements;
pub mod alarm;
pub mod auth;
pub mod config;
pub mod data;
pub mod timer;

use pomoalarm_core::seed;
use pomoalarm_core::storage::Database;
use pomoalarm_core::{AuthGateway, Config, UserContext};
use serde::Serialize;
use tracing::debug;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the store in the data directory, seeding it on first use when the
/// config asks for sample data.
pub fn open_store() -> Result<Database, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    if config.data.seed_sample_data {
        if let Some(summary) = seed::seed_on_first_open(&db)? {
            debug!(user_id = summary.user_id, "seeded sample data");
        }
    }
    Ok(db)
}

/// The user saved by the last login.
pub fn current_user(db: &Database) -> Result<UserContext, Box<dyn std::error::Error>> {
    Ok(AuthGateway::new(db).require()?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
