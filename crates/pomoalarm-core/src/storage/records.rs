//! Typed access to the users, alarms and sessions tables.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::database::Database;
use super::tables::Table;
use crate::error::{CoreError, DatabaseError, Result};
use crate::models::{Alarm, AlarmPatch, NewAlarm, NewSession, NewUser, Session, User};

impl Database {
    // ── Users ────────────────────────────────────────────────────────

    /// Insert a user.
    ///
    /// # Errors
    /// `DatabaseError::ConstraintViolation` if the email is already taken.
    pub fn create_user(&self, user: &NewUser) -> Result<User> {
        let doc = self.create(Table::Users, encode(user)?)?;
        decode(Table::Users, doc)
    }

    pub fn user(&self, id: i64) -> Result<Option<User>> {
        self.get_by_id(Table::Users, id)?
            .map(|doc| decode(Table::Users, doc))
            .transpose()
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let docs = self.get_all_by_index(Table::Users, "email", &json!(email))?;
        docs.into_iter()
            .next()
            .map(|doc| decode(Table::Users, doc))
            .transpose()
    }

    pub fn all_users(&self) -> Result<Vec<User>> {
        decode_all(Table::Users, self.get_all(Table::Users)?)
    }

    // ── Alarms ───────────────────────────────────────────────────────

    pub fn create_alarm(&self, alarm: &NewAlarm) -> Result<Alarm> {
        let doc = self.create(Table::Alarms, encode(alarm)?)?;
        decode(Table::Alarms, doc)
    }

    pub fn alarm(&self, id: i64) -> Result<Option<Alarm>> {
        self.get_by_id(Table::Alarms, id)?
            .map(|doc| decode(Table::Alarms, doc))
            .transpose()
    }

    pub fn alarms_by_user(&self, user_id: i64) -> Result<Vec<Alarm>> {
        decode_all(
            Table::Alarms,
            self.get_all_by_index(Table::Alarms, "userId", &json!(user_id))?,
        )
    }

    pub fn all_alarms(&self) -> Result<Vec<Alarm>> {
        decode_all(Table::Alarms, self.get_all(Table::Alarms)?)
    }

    /// Apply a partial edit. `userId` and `createdAt` are never touched.
    pub fn update_alarm(&self, id: i64, patch: &AlarmPatch) -> Result<Alarm> {
        let doc = self.update(Table::Alarms, id, encode(patch)?)?;
        decode(Table::Alarms, doc)
    }

    /// Remove an alarm. Its sessions stay behind and keep pointing at `id`.
    pub fn delete_alarm(&self, id: i64) -> Result<()> {
        self.delete(Table::Alarms, id)
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub fn create_session(&self, session: &NewSession) -> Result<Session> {
        let doc = self.create(Table::Sessions, encode(session)?)?;
        decode(Table::Sessions, doc)
    }

    pub fn sessions_by_user(&self, user_id: i64) -> Result<Vec<Session>> {
        decode_all(
            Table::Sessions,
            self.get_all_by_index(Table::Sessions, "userId", &json!(user_id))?,
        )
    }

    pub fn sessions_by_alarm(&self, alarm_id: i64) -> Result<Vec<Session>> {
        decode_all(
            Table::Sessions,
            self.get_all_by_index(Table::Sessions, "alarmId", &json!(alarm_id))?,
        )
    }

    pub fn all_sessions(&self) -> Result<Vec<Session>> {
        decode_all(Table::Sessions, self.get_all(Table::Sessions)?)
    }
}

fn encode<T: Serialize>(record: &T) -> Result<Value> {
    Ok(serde_json::to_value(record)?)
}

fn decode<T: DeserializeOwned>(table: Table, doc: Value) -> Result<T> {
    serde_json::from_value(doc).map_err(|e| {
        CoreError::from(DatabaseError::Corrupt {
            table: table.name().to_string(),
            message: e.to_string(),
        })
    })
}

fn decode_all<T: DeserializeOwned>(table: Table, docs: Vec<Value>) -> Result<Vec<T>> {
    docs.into_iter().map(|doc| decode(table, doc)).collect()
}
