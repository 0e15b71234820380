//! Record types persisted in the `users`, `alarms` and `sessions` tables.
//!
//! Documents are stored as camelCase JSON so the field names match the
//! declared index names (`email`, `userId`, `alarmId`).

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const UPTIME_MINUTES: RangeInclusive<u32> = 1..=120;
pub const DOWNTIME_MINUTES: RangeInclusive<u32> = 1..=60;
pub const REPETITIONS: RangeInclusive<u32> = 1..=20;
pub const MIN_ALARM_NAME_LEN: usize = 2;

/// A registered account.
///
/// The password is stored and compared as plaintext. This is a known weak
/// point, kept so existing records stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

/// A named uptime/downtime/repetition profile owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub uptime_minutes: u32,
    pub downtime_minutes: u32,
    pub repetitions: u32,
    pub created_at: DateTime<Utc>,
}

impl Alarm {
    /// Minutes a full run of this profile takes.
    pub fn total_minutes(&self) -> u32 {
        self.repetitions * (self.uptime_minutes + self.downtime_minutes)
    }
}

/// The user-editable part of an alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSettings {
    pub name: String,
    pub uptime_minutes: u32,
    pub downtime_minutes: u32,
    pub repetitions: u32,
}

impl AlarmSettings {
    pub fn new(name: impl Into<String>, uptime: u32, downtime: u32, repetitions: u32) -> Self {
        Self {
            name: name.into(),
            uptime_minutes: uptime,
            downtime_minutes: downtime,
            repetitions,
        }
    }

    /// Check every field and return the settings with a trimmed name.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.name = validate_name(&self.name)?;
        check_range("uptimeMinutes", &UPTIME_MINUTES, self.uptime_minutes)?;
        check_range("downtimeMinutes", &DOWNTIME_MINUTES, self.downtime_minutes)?;
        check_range("repetitions", &REPETITIONS, self.repetitions)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlarm {
    pub user_id: i64,
    #[serde(flatten)]
    pub settings: AlarmSettings,
    pub created_at: DateTime<Utc>,
}

/// Partial alarm edit. Absent fields keep their stored value.
///
/// There is no `user_id` here: ownership never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downtime_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<u32>,
}

impl AlarmPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.uptime_minutes.is_none()
            && self.downtime_minutes.is_none()
            && self.repetitions.is_none()
    }

    pub fn validated(mut self) -> Result<Self, ValidationError> {
        if let Some(name) = self.name.take() {
            self.name = Some(validate_name(&name)?);
        }
        if let Some(v) = self.uptime_minutes {
            check_range("uptimeMinutes", &UPTIME_MINUTES, v)?;
        }
        if let Some(v) = self.downtime_minutes {
            check_range("downtimeMinutes", &DOWNTIME_MINUTES, v)?;
        }
        if let Some(v) = self.repetitions {
            check_range("repetitions", &REPETITIONS, v)?;
        }
        Ok(self)
    }
}

/// One completed run of an alarm. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub alarm_id: i64,
    pub user_id: i64,
    pub completed_at: DateTime<Utc>,
    pub total_duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub alarm_id: i64,
    pub user_id: i64,
    pub completed_at: DateTime<Utc>,
    pub total_duration_minutes: u32,
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_ALARM_NAME_LEN {
        return Err(ValidationError::TooShort {
            field: "name",
            min: MIN_ALARM_NAME_LEN,
        });
    }
    Ok(trimmed.to_string())
}

fn check_range(
    field: &'static str,
    range: &RangeInclusive<u32>,
    value: u32,
) -> Result<(), ValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min: *range.start(),
            max: *range.end(),
            value,
        })
    }
}
