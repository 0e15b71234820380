//! Owner-scoped management of alarm profiles.
//!
//! Every operation takes the caller's [`UserContext`]; alarms belonging to
//! someone else are reported as [`AuthError::Forbidden`] and are never read
//! back or modified.

use chrono::Utc;
use tracing::info;

use crate::auth::UserContext;
use crate::error::{AuthError, DatabaseError, Result};
use crate::models::{Alarm, AlarmPatch, AlarmSettings, NewAlarm};
use crate::storage::{Database, Table};

pub struct AlarmService<'a> {
    db: &'a Database,
}

impl<'a> AlarmService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// The caller's alarms, oldest first.
    pub fn list(&self, ctx: &UserContext) -> Result<Vec<Alarm>> {
        self.db.alarms_by_user(ctx.user_id())
    }

    /// One of the caller's alarms.
    ///
    /// # Errors
    /// `NotFound` if it does not exist, `Forbidden` if it is someone else's.
    pub fn get(&self, ctx: &UserContext, id: i64) -> Result<Alarm> {
        let alarm = self.db.alarm(id)?.ok_or_else(|| DatabaseError::NotFound {
            table: Table::Alarms.name().to_string(),
            id,
        })?;
        if alarm.user_id != ctx.user_id() {
            return Err(AuthError::Forbidden {
                resource: "alarm",
                id,
            }
            .into());
        }
        Ok(alarm)
    }

    pub fn create(&self, ctx: &UserContext, settings: AlarmSettings) -> Result<Alarm> {
        let settings = settings.validated()?;
        let alarm = self.db.create_alarm(&NewAlarm {
            user_id: ctx.user_id(),
            settings,
            created_at: Utc::now(),
        })?;
        info!(alarm_id = alarm.id, user_id = alarm.user_id, "alarm created");
        Ok(alarm)
    }

    /// Apply a partial edit. An empty patch returns the alarm unchanged.
    pub fn update(&self, ctx: &UserContext, id: i64, patch: AlarmPatch) -> Result<Alarm> {
        let patch = patch.validated()?;
        let current = self.get(ctx, id)?;
        if patch.is_empty() {
            return Ok(current);
        }
        let alarm = self.db.update_alarm(id, &patch)?;
        info!(alarm_id = id, "alarm updated");
        Ok(alarm)
    }

    /// Delete one of the caller's alarms.
    ///
    /// Sessions recorded against it are kept and keep the dangling id.
    pub fn delete(&self, ctx: &UserContext, id: i64) -> Result<Alarm> {
        let alarm = self.get(ctx, id)?;
        self.db.delete_alarm(id)?;
        info!(alarm_id = id, "alarm deleted");
        Ok(alarm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthGateway;
    use crate::error::{CoreError, ValidationError};

    fn login(db: &Database, email: &str) -> UserContext {
        AuthGateway::new(db)
            .register("Someone", email, "secret1")
            .context()
            .unwrap()
    }

    #[test]
    fn create_and_list_own_alarms() {
        let db = Database::open_memory().unwrap();
        let me = login(&db, "me@example.com");
        let other = login(&db, "other@example.com");
        let service = AlarmService::new(&db);

        service
            .create(&me, AlarmSettings::new("Focus", 25, 5, 4))
            .unwrap();
        service
            .create(&other, AlarmSettings::new("Theirs", 30, 10, 3))
            .unwrap();

        let mine = service.list(&me).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Focus");
        assert_eq!(mine[0].user_id, me.user_id());
    }

    #[test]
    fn create_rejects_invalid_settings() {
        let db = Database::open_memory().unwrap();
        let me = login(&db, "me@example.com");
        let err = AlarmService::new(&db)
            .create(&me, AlarmSettings::new("Focus", 25, 5, 0))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange {
                field: "repetitions",
                ..
            })
        ));
        assert!(db.all_alarms().unwrap().is_empty());
    }

    #[test]
    fn other_users_alarms_are_forbidden() {
        let db = Database::open_memory().unwrap();
        let me = login(&db, "me@example.com");
        let other = login(&db, "other@example.com");
        let service = AlarmService::new(&db);
        let theirs = service
            .create(&other, AlarmSettings::new("Theirs", 30, 10, 3))
            .unwrap();

        let forbidden = |r: Result<Alarm>| {
            matches!(
                r,
                Err(CoreError::Auth(AuthError::Forbidden { resource: "alarm", .. }))
            )
        };
        assert!(forbidden(service.get(&me, theirs.id)));
        assert!(forbidden(service.update(
            &me,
            theirs.id,
            AlarmPatch {
                name: Some("Mine now".into()),
                ..Default::default()
            }
        )));
        assert!(forbidden(service.delete(&me, theirs.id)));
        assert_eq!(db.alarm(theirs.id).unwrap().unwrap(), theirs);
    }

    #[test]
    fn update_applies_partial_edit() {
        let db = Database::open_memory().unwrap();
        let me = login(&db, "me@example.com");
        let service = AlarmService::new(&db);
        let alarm = service
            .create(&me, AlarmSettings::new("Focus", 25, 5, 4))
            .unwrap();

        let updated = service
            .update(
                &me,
                alarm.id,
                AlarmPatch {
                    downtime_minutes: Some(10),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.downtime_minutes, 10);
        assert_eq!(updated.uptime_minutes, 25);
        assert_eq!(updated.user_id, me.user_id());

        let err = service
            .update(
                &me,
                alarm.id,
                AlarmPatch {
                    downtime_minutes: Some(61),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn missing_alarm_is_not_found() {
        let db = Database::open_memory().unwrap();
        let me = login(&db, "me@example.com");
        let err = AlarmService::new(&db).get(&me, 404).unwrap_err();
        assert!(err.is_not_found());
    }
}
