//! SQLite-backed object store.
//!
//! Each table holds JSON documents addressed by an auto-increment id, plus
//! one column per declared secondary index so lookups never scan documents.
//! The `id` column is the source of truth: it is stripped from the stored
//! document and injected again on every read.
//!
//! A small `kv` table stands in for local storage (current user, active run).

use std::path::Path;
use std::time::Duration;

use indoc::indoc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use serde_json::{Map, Value};
use tracing::debug;

use super::data_dir;
use super::tables::Table;
use crate::error::{CoreError, DatabaseError, Result, ValidationError};

/// File name of the database inside the data directory.
pub const DB_FILE: &str = "pomoalarm.db";

const SCHEMA: &str = indoc! {"
    CREATE TABLE IF NOT EXISTS users (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        data        TEXT NOT NULL,
        idx_email   TEXT UNIQUE
    );

    CREATE TABLE IF NOT EXISTS alarms (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        data        TEXT NOT NULL,
        idx_user_id INTEGER
    );

    CREATE TABLE IF NOT EXISTS sessions (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        data         TEXT NOT NULL,
        idx_user_id  INTEGER,
        idx_alarm_id INTEGER
    );

    CREATE TABLE IF NOT EXISTS kv (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_alarms_user_id ON alarms(idx_user_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(idx_user_id);
    CREATE INDEX IF NOT EXISTS idx_sessions_alarm_id ON sessions(idx_alarm_id);
"};

/// Local object store for users, alarms and sessions.
///
/// Every operation commits on its own. There are no cross-table
/// transactions: creating an alarm and then a session referencing it is two
/// independent writes.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/pomoalarm.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join(DB_FILE);
        Self::open_at(&path)
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let db = Self { conn };
        db.migrate()?;
        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(SCHEMA)
    }

    // ── Object store ─────────────────────────────────────────────────

    /// Insert a document and return it with its assigned id.
    ///
    /// Any `id` in the input is ignored.
    pub fn create(&self, table: Table, record: Value) -> Result<Value> {
        let mut doc = into_object(table, record)?;
        doc.remove("id");

        let indexes = table.indexes();
        let mut columns = vec!["data"];
        columns.extend(indexes.iter().map(|idx| idx.column));
        let placeholders = (1..=columns.len())
            .map(|n| format!("?{n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name(),
            columns.join(", "),
            placeholders
        );

        let mut values = vec![SqlValue::Text(serde_json::to_string(&doc)?)];
        values.extend(indexes.iter().map(|idx| index_value(doc.get(idx.name))));

        self.conn
            .execute(&sql, params_from_iter(values))
            .map_err(|e| write_error(table, e))?;

        let id = self.conn.last_insert_rowid();
        debug!(%table, id, "record created");
        doc.insert("id".to_string(), Value::from(id));
        Ok(Value::Object(doc))
    }

    pub fn get_by_id(&self, table: Table, id: i64) -> Result<Option<Value>> {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", table.name());
        let data = self
            .conn
            .query_row(&sql, params![id], |row| row.get::<_, String>(0))
            .optional()?;
        data.map(|data| decode_document(table, id, &data)).transpose()
    }

    /// Every document in the table, in id order.
    pub fn get_all(&self, table: Table) -> Result<Vec<Value>> {
        let sql = format!("SELECT id, data FROM {} ORDER BY id", table.name());
        self.query_documents(table, &sql, params![])
    }

    /// Every document whose `index` field equals `value`, in id order.
    pub fn get_all_by_index(&self, table: Table, index: &str, value: &Value) -> Result<Vec<Value>> {
        let idx = table.index(index)?;
        let sql = format!(
            "SELECT id, data FROM {} WHERE {} = ?1 ORDER BY id",
            table.name(),
            idx.column
        );
        self.query_documents(table, &sql, params![index_value(Some(value))])
    }

    /// Shallow-merge `partial` into the stored document.
    ///
    /// The `id` field is never overwritten.
    ///
    /// # Errors
    /// `DatabaseError::NotFound` if no record has this id.
    pub fn update(&self, table: Table, id: i64, partial: Value) -> Result<Value> {
        let patch = into_object(table, partial)?;
        let tx = self.conn.unchecked_transaction()?;

        let select = format!("SELECT data FROM {} WHERE id = ?1", table.name());
        let data = tx
            .query_row(&select, params![id], |row| row.get::<_, String>(0))
            .optional()?
            .ok_or_else(|| DatabaseError::NotFound {
                table: table.name().to_string(),
                id,
            })?;

        let mut doc = parse_object(table, &data)?;
        for (key, value) in patch {
            if key != "id" {
                doc.insert(key, value);
            }
        }

        let indexes = table.indexes();
        let assignments = std::iter::once("data = ?1".to_string())
            .chain(
                indexes
                    .iter()
                    .enumerate()
                    .map(|(i, idx)| format!("{} = ?{}", idx.column, i + 2)),
            )
            .collect::<Vec<_>>()
            .join(", ");
        let update = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table.name(),
            assignments,
            indexes.len() + 2
        );

        let mut values = vec![SqlValue::Text(serde_json::to_string(&doc)?)];
        values.extend(indexes.iter().map(|idx| index_value(doc.get(idx.name))));
        values.push(SqlValue::Integer(id));

        tx.execute(&update, params_from_iter(values))
            .map_err(|e| write_error(table, e))?;
        tx.commit()?;

        debug!(%table, id, "record updated");
        doc.insert("id".to_string(), Value::from(id));
        Ok(Value::Object(doc))
    }

    /// Remove a record. Removing an absent id is a no-op.
    pub fn delete(&self, table: Table, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table.name());
        let removed = self.conn.execute(&sql, params![id])?;
        debug!(%table, id, removed, "record deleted");
        Ok(())
    }

    /// Remove every record whose `index` field equals `value`.
    pub fn delete_by_index(&self, table: Table, index: &str, value: &Value) -> Result<usize> {
        let idx = table.index(index)?;
        let sql = format!("DELETE FROM {} WHERE {} = ?1", table.name(), idx.column);
        let removed = self.conn.execute(&sql, params![index_value(Some(value))])?;
        debug!(%table, index, removed, "records deleted by index");
        Ok(removed)
    }

    /// Remove every record in the table. Ids keep increasing afterwards.
    pub fn clear(&self, table: Table) -> Result<usize> {
        let sql = format!("DELETE FROM {}", table.name());
        let removed = self.conn.execute(&sql, [])?;
        debug!(%table, removed, "table cleared");
        Ok(removed)
    }

    fn query_documents<P: rusqlite::Params>(
        &self,
        table: Table,
        sql: &str,
        params: P,
    ) -> Result<Vec<Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, data) = row?;
            docs.push(decode_document(table, id, &data)?);
        }
        Ok(docs)
    }

    // ── Local storage ────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn into_object(table: Table, record: Value) -> Result<Map<String, Value>> {
    match record {
        Value::Object(map) => Ok(map),
        other => Err(ValidationError::InvalidValue {
            field: table.name().to_string(),
            message: format!("expected a JSON object, got {other}"),
        }
        .into()),
    }
}

fn parse_object(table: Table, data: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(data).map_err(|e| {
        CoreError::from(DatabaseError::Corrupt {
            table: table.name().to_string(),
            message: e.to_string(),
        })
    })
}

fn decode_document(table: Table, id: i64, data: &str) -> Result<Value> {
    let mut doc = parse_object(table, data)?;
    doc.insert("id".to_string(), Value::from(id));
    Ok(Value::Object(doc))
}

/// Convert a JSON field into the SQLite value stored in an index column.
fn index_value(value: Option<&Value>) -> SqlValue {
    match value {
        None | Some(Value::Null) => SqlValue::Null,
        Some(Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
        Some(other) => SqlValue::Text(other.to_string()),
    }
}

fn write_error(table: Table, err: rusqlite::Error) -> CoreError {
    if let rusqlite::Error::SqliteFailure(code, _) = &err {
        if code.code == ErrorCode::ConstraintViolation {
            let index = table
                .unique_index()
                .map(|idx| idx.name)
                .unwrap_or("id");
            return DatabaseError::ConstraintViolation {
                table: table.name().to_string(),
                index: index.to_string(),
            }
            .into();
        }
    }
    DatabaseError::from(err).into()
}

/// Storage-failure hooks for tests in other modules.
#[cfg(test)]
impl Database {
    /// Drop a table so every later operation on it fails.
    pub(crate) fn drop_table(&self, name: &str) {
        self.conn
            .execute_batch(&format!("DROP TABLE {name}"))
            .unwrap();
    }

    /// Recreate any missing tables.
    pub(crate) fn recreate_schema(&self) {
        self.migrate().unwrap();
    }
}
