//! Demo account, alarms and a few weeks of session history.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::models::{AlarmSettings, NewAlarm, NewSession, NewUser};
use crate::storage::{Database, Table};

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "password123";
pub const DEMO_NAME: &str = "Demo User";

/// Local-storage marker set once first-run seeding has happened.
pub const SEEDED_KEY: &str = "sampleDataSeeded";

/// Hours before "now" and which of the two sample alarms each session used.
const SAMPLE_SESSIONS: [(i64, usize); 12] = [
    (2, 0),
    (4, 1),
    (25, 0),
    (27, 1),
    (50, 0),
    (73, 1),
    (76, 0),
    (170, 0),
    (173, 1),
    (337, 0),
    (723, 1),
    (726, 0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    /// Seed only when there are no users yet.
    IfEmpty,
    /// Wipe every table, then seed a fresh demo user.
    ForceAll,
    /// Replace one user's alarms and sessions with the sample set.
    ForceUser(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub user_id: i64,
    pub alarms: usize,
    pub sessions: usize,
}

/// Populate the store with sample data.
///
/// Returns `None` when `IfEmpty` finds existing users.
pub fn create_sample_data(db: &Database, mode: SeedMode) -> Result<Option<SeedSummary>> {
    create_sample_data_at(db, mode, Utc::now())
}

pub fn create_sample_data_at(
    db: &Database,
    mode: SeedMode,
    now: DateTime<Utc>,
) -> Result<Option<SeedSummary>> {
    let user_id = match mode {
        SeedMode::IfEmpty => {
            if !db.all_users()?.is_empty() {
                return Ok(None);
            }
            create_demo_user(db, now)?
        }
        SeedMode::ForceAll => {
            clear_all_data(db)?;
            create_demo_user(db, now)?
        }
        SeedMode::ForceUser(user_id) => {
            clear_user_data(db, user_id)?;
            user_id
        }
    };

    let mut alarm_ids = Vec::new();
    for settings in [
        AlarmSettings::new("Pomodoro 1", 25, 5, 4),
        AlarmSettings::new("Pomodoro 2", 30, 10, 3),
    ] {
        let alarm = db.create_alarm(&NewAlarm {
            user_id,
            settings,
            created_at: now,
        })?;
        alarm_ids.push(alarm.id);
    }

    for (hours_ago, alarm) in SAMPLE_SESSIONS {
        db.create_session(&NewSession {
            alarm_id: alarm_ids[alarm],
            user_id,
            completed_at: now - Duration::hours(hours_ago),
            total_duration_minutes: 120,
        })?;
    }

    let summary = SeedSummary {
        user_id,
        alarms: alarm_ids.len(),
        sessions: SAMPLE_SESSIONS.len(),
    };
    info!(?mode, user_id, "sample data created");
    Ok(Some(summary))
}

/// Seed the first time a store is opened, and never again.
///
/// Later resets leave the store empty instead of re-seeding it.
pub fn seed_on_first_open(db: &Database) -> Result<Option<SeedSummary>> {
    if db.kv_get(SEEDED_KEY)?.is_some() {
        return Ok(None);
    }
    let summary = create_sample_data(db, SeedMode::IfEmpty)?;
    db.kv_set(SEEDED_KEY, &Utc::now().to_rfc3339())?;
    Ok(summary)
}

fn create_demo_user(db: &Database, now: DateTime<Utc>) -> Result<i64> {
    let user = db.create_user(&NewUser {
        email: DEMO_EMAIL.to_string(),
        password: DEMO_PASSWORD.to_string(),
        full_name: DEMO_NAME.to_string(),
        created_at: now,
    })?;
    Ok(user.id)
}

/// Empty the users, alarms and sessions tables. Local storage is untouched.
pub fn clear_all_data(db: &Database) -> Result<()> {
    for table in Table::ALL {
        db.clear(table)?;
    }
    info!("all data cleared");
    Ok(())
}

/// Delete one user's alarms and sessions. The account itself stays.
pub fn clear_user_data(db: &Database, user_id: i64) -> Result<()> {
    let alarms = db.delete_by_index(Table::Alarms, "userId", &json!(user_id))?;
    let sessions = db.delete_by_index(Table::Sessions, "userId", &json!(user_id))?;
    info!(user_id, alarms, sessions, "user data cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthGateway;

    #[test]
    fn seeds_once_when_empty() {
        let db = Database::open_memory().unwrap();
        let summary = create_sample_data(&db, SeedMode::IfEmpty).unwrap().unwrap();
        assert_eq!(summary.alarms, 2);
        assert_eq!(summary.sessions, 12);

        assert!(create_sample_data(&db, SeedMode::IfEmpty).unwrap().is_none());
        assert_eq!(db.all_users().unwrap().len(), 1);
        assert_eq!(db.all_alarms().unwrap().len(), 2);
        assert_eq!(db.all_sessions().unwrap().len(), 12);
    }

    #[test]
    fn sample_sessions_match_their_alarms() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        let summary = create_sample_data_at(&db, SeedMode::IfEmpty, now)
            .unwrap()
            .unwrap();
        for alarm in db.alarms_by_user(summary.user_id).unwrap() {
            assert_eq!(alarm.total_minutes(), 120);
        }
        let sessions = db.sessions_by_user(summary.user_id).unwrap();
        assert!(sessions.iter().all(|s| s.completed_at < now));
        assert_eq!(sessions[0].completed_at, now - Duration::hours(2));
    }

    #[test]
    fn force_all_resets_everything() {
        let db = Database::open_memory().unwrap();
        AuthGateway::new(&db).register("Other", "other@example.com", "secret1");
        create_sample_data(&db, SeedMode::IfEmpty).unwrap();
        assert_eq!(db.all_users().unwrap().len(), 1);

        create_sample_data(&db, SeedMode::ForceAll).unwrap().unwrap();
        let users = db.all_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, DEMO_EMAIL);
        assert_eq!(db.all_sessions().unwrap().len(), 12);
    }

    #[test]
    fn force_user_replaces_only_that_users_data() {
        let db = Database::open_memory().unwrap();
        let demo = create_sample_data(&db, SeedMode::IfEmpty).unwrap().unwrap();
        let me = AuthGateway::new(&db)
            .register("Me", "me@example.com", "secret1")
            .context()
            .unwrap();

        create_sample_data(&db, SeedMode::ForceUser(me.user_id())).unwrap();
        create_sample_data(&db, SeedMode::ForceUser(me.user_id())).unwrap();

        assert_eq!(db.alarms_by_user(me.user_id()).unwrap().len(), 2);
        assert_eq!(db.sessions_by_user(me.user_id()).unwrap().len(), 12);
        assert_eq!(db.sessions_by_user(demo.user_id).unwrap().len(), 12);
        assert_eq!(db.all_users().unwrap().len(), 2);
    }

    #[test]
    fn first_open_seeds_only_once() {
        let db = Database::open_memory().unwrap();
        assert!(seed_on_first_open(&db).unwrap().is_some());
        clear_all_data(&db).unwrap();
        assert!(seed_on_first_open(&db).unwrap().is_none());
        assert!(db.all_users().unwrap().is_empty());
    }

    #[test]
    fn demo_login_works_after_seeding() {
        let db = Database::open_memory().unwrap();
        create_sample_data(&db, SeedMode::IfEmpty).unwrap();
        let auth = AuthGateway::new(&db);
        assert!(auth.login(DEMO_EMAIL, DEMO_PASSWORD).success);
        assert!(!auth.login(DEMO_EMAIL, "wrong").success);
    }
}
