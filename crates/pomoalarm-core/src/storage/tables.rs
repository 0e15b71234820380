//! Object-store table declarations.

use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

/// A secondary index over one top-level document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    /// Index name, identical to the JSON field it covers.
    pub name: &'static str,
    /// SQLite column holding the extracted value.
    pub column: &'static str,
    pub unique: bool,
}

const USER_INDEXES: &[IndexDef] = &[IndexDef {
    name: "email",
    column: "idx_email",
    unique: true,
}];

const ALARM_INDEXES: &[IndexDef] = &[IndexDef {
    name: "userId",
    column: "idx_user_id",
    unique: false,
}];

const SESSION_INDEXES: &[IndexDef] = &[
    IndexDef {
        name: "userId",
        column: "idx_user_id",
        unique: false,
    },
    IndexDef {
        name: "alarmId",
        column: "idx_alarm_id",
        unique: false,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Users,
    Alarms,
    Sessions,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Users, Table::Alarms, Table::Sessions];

    pub fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Alarms => "alarms",
            Table::Sessions => "sessions",
        }
    }

    pub fn indexes(self) -> &'static [IndexDef] {
        match self {
            Table::Users => USER_INDEXES,
            Table::Alarms => ALARM_INDEXES,
            Table::Sessions => SESSION_INDEXES,
        }
    }

    /// Look up a declared index by name.
    pub fn index(self, name: &str) -> Result<&'static IndexDef, DatabaseError> {
        self.indexes()
            .iter()
            .find(|idx| idx.name == name)
            .ok_or_else(|| DatabaseError::UnknownIndex {
                table: self.name().to_string(),
                index: name.to_string(),
            })
    }

    pub(crate) fn unique_index(self) -> Option<&'static IndexDef> {
        self.indexes().iter().find(|idx| idx.unique)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
