//! Completed sessions ("achievements") and statistics over them.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::UserContext;
use crate::error::Result;
use crate::models::{Alarm, Session};
use crate::storage::Database;

/// The alarm a session points at, which may have been deleted since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LinkedAlarm {
    Found(Alarm),
    NotFound { alarm_id: i64 },
}

impl LinkedAlarm {
    pub fn name(&self) -> &str {
        match self {
            LinkedAlarm::Found(alarm) => &alarm.name,
            LinkedAlarm::NotFound { .. } => "not found",
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LinkedAlarm::Found(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub session: Session,
    pub alarm: LinkedAlarm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AchievementStats {
    pub total_sessions: u64,
    pub total_minutes: u64,
    pub today_sessions: u64,
    pub today_minutes: u64,
    pub last_7_days_sessions: u64,
    pub last_7_days_minutes: u64,
    pub longest_session_minutes: u32,
    pub distinct_alarms: u64,
    pub last_completed_at: Option<DateTime<Utc>>,
}

pub struct AchievementService<'a> {
    db: &'a Database,
}

impl<'a> AchievementService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// The caller's sessions, most recent first.
    pub fn list(&self, ctx: &UserContext) -> Result<Vec<Session>> {
        let mut sessions = self.db.sessions_by_user(ctx.user_id())?;
        sessions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at).then(b.id.cmp(&a.id)));
        Ok(sessions)
    }

    /// The caller's sessions for one alarm, most recent first.
    ///
    /// Works for deleted alarms too: sessions keep their alarm id.
    pub fn history(&self, ctx: &UserContext, alarm_id: i64) -> Result<Vec<Session>> {
        let mut sessions: Vec<_> = self
            .db
            .sessions_by_alarm(alarm_id)?
            .into_iter()
            .filter(|s| s.user_id == ctx.user_id())
            .collect();
        sessions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at).then(b.id.cmp(&a.id)));
        Ok(sessions)
    }

    /// The caller's sessions joined with their alarm.
    ///
    /// A session whose alarm was deleted resolves to [`LinkedAlarm::NotFound`].
    pub fn with_alarms(&self, ctx: &UserContext) -> Result<Vec<Achievement>> {
        let sessions = self.list(ctx)?;
        let mut alarms: HashMap<i64, LinkedAlarm> = HashMap::new();
        let mut out = Vec::with_capacity(sessions.len());
        for session in sessions {
            let alarm = match alarms.get(&session.alarm_id) {
                Some(linked) => linked.clone(),
                None => {
                    let linked = match self.db.alarm(session.alarm_id)? {
                        Some(alarm) => LinkedAlarm::Found(alarm),
                        None => LinkedAlarm::NotFound {
                            alarm_id: session.alarm_id,
                        },
                    };
                    alarms.insert(session.alarm_id, linked.clone());
                    linked
                }
            };
            out.push(Achievement { session, alarm });
        }
        Ok(out)
    }

    pub fn stats(&self, ctx: &UserContext) -> Result<AchievementStats> {
        Ok(stats_at(&self.db.sessions_by_user(ctx.user_id())?, Utc::now()))
    }
}

/// Aggregate `sessions` as seen at `now`. "Today" is the UTC calendar day.
pub fn stats_at(sessions: &[Session], now: DateTime<Utc>) -> AchievementStats {
    let today = now.date_naive();
    let week_start = now - Duration::days(7);
    let mut alarm_ids = HashSet::new();
    let mut stats = AchievementStats::default();

    for session in sessions {
        let minutes = u64::from(session.total_duration_minutes);
        stats.total_sessions += 1;
        stats.total_minutes += minutes;
        if session.completed_at.date_naive() == today {
            stats.today_sessions += 1;
            stats.today_minutes += minutes;
        }
        if session.completed_at > week_start && session.completed_at <= now {
            stats.last_7_days_sessions += 1;
            stats.last_7_days_minutes += minutes;
        }
        stats.longest_session_minutes = stats
            .longest_session_minutes
            .max(session.total_duration_minutes);
        alarm_ids.insert(session.alarm_id);
        stats.last_completed_at = stats.last_completed_at.max(Some(session.completed_at));
    }

    stats.distinct_alarms = alarm_ids.len() as u64;
    stats
}
