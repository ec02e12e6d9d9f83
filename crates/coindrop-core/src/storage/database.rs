//! SQLite-based session and activity storage.
//!
//! Provides persistent storage for:
//! - Collected focus-session records (append-only)
//! - Activities (seeded with defaults, user entries editable)
//! - Key-value store for application state (selected activity)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DatabaseError;

use super::data_dir;

const SELECTED_ACTIVITY_KEY: &str = "selected_activity";

/// Seeded on first launch when no activities exist.
const DEFAULT_ACTIVITIES: [(&str, &str); 5] = [
    ("Study", "📚"),
    ("Work", "💻"),
    ("Read", "📖"),
    ("Exercise", "🏃"),
    ("Meditate", "🧘"),
];

/// One collected batch of coins. Append-only; activity name and glyph are
/// denormalized snapshots, so deleting an activity never rewrites history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusSessionRecord {
    pub id: i64,
    pub activity_name: String,
    pub activity_glyph: String,
    pub collected_count: u32,
    /// Always `collected_count * 30`.
    pub duration_secs: u32,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub glyph: String,
    pub is_custom: bool,
}

/// SQLite database for session and activity storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/coindrop/coindrop.db`.
    ///
    /// Creates the database file, schema, and default activities if they
    /// don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?
            .join("coindrop.db");
        Self::open_at(path)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: impl AsRef<std::path::Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS focus_sessions (
                    id              INTEGER PRIMARY KEY AUTOINCREMENT,
                    activity_name   TEXT NOT NULL,
                    activity_glyph  TEXT NOT NULL,
                    collected_count INTEGER NOT NULL,
                    duration_secs   INTEGER NOT NULL,
                    completed_at    TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS activities (
                    id        TEXT PRIMARY KEY,
                    name      TEXT NOT NULL,
                    glyph     TEXT NOT NULL,
                    is_custom INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_focus_sessions_completed_at
                    ON focus_sessions(completed_at);
                CREATE INDEX IF NOT EXISTS idx_focus_sessions_activity
                    ON focus_sessions(activity_name);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        self.seed_default_activities()?;
        Ok(())
    }

    fn seed_default_activities(&self) -> Result<(), DatabaseError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM activities", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }
        for (name, glyph) in DEFAULT_ACTIVITIES {
            self.conn.execute(
                "INSERT INTO activities (id, name, glyph, is_custom) VALUES (?1, ?2, ?3, 0)",
                params![Uuid::new_v4().to_string(), name, glyph],
            )?;
        }
        log::debug!("seeded {} default activities", DEFAULT_ACTIVITIES.len());
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Append one collected session record.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_session(
        &self,
        activity_name: &str,
        activity_glyph: &str,
        collected_count: u32,
        duration_secs: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO focus_sessions
                (activity_name, activity_glyph, collected_count, duration_secs, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                activity_name,
                activity_glyph,
                collected_count,
                duration_secs,
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Full session log, chronological.
    pub fn list_sessions(&self) -> Result<Vec<FocusSessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, activity_name, activity_glyph, collected_count, duration_secs, completed_at
             FROM focus_sessions
             ORDER BY completed_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let completed_at: String = row.get(5)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Utc);
            Ok(FocusSessionRecord {
                id: row.get(0)?,
                activity_name: row.get(1)?,
                activity_glyph: row.get(2)?,
                collected_count: row.get(3)?,
                duration_secs: row.get(4)?,
                completed_at,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete one record by id (manual history edit; activity deletion
    /// never cascades here).
    pub fn delete_session(&self, id: i64) -> Result<bool, DatabaseError> {
        let affected = self
            .conn
            .execute("DELETE FROM focus_sessions WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    // ── Activities ───────────────────────────────────────────────────

    pub fn list_activities(&self) -> Result<Vec<Activity>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, glyph, is_custom FROM activities ORDER BY is_custom ASC, name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Activity {
                id: row.get(0)?,
                name: row.get(1)?,
                glyph: row.get(2)?,
                is_custom: row.get::<_, i64>(3)? != 0,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn get_activity(&self, id: &str) -> Result<Option<Activity>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, glyph, is_custom FROM activities WHERE id = ?1")?;
        let result = stmt.query_row(params![id], |row| {
            Ok(Activity {
                id: row.get(0)?,
                name: row.get(1)?,
                glyph: row.get(2)?,
                is_custom: row.get::<_, i64>(3)? != 0,
            })
        });
        match result {
            Ok(activity) => Ok(Some(activity)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a user-defined activity.
    pub fn create_activity(&self, name: &str, glyph: &str) -> Result<Activity, DatabaseError> {
        let activity = Activity {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            glyph: glyph.to_string(),
            is_custom: true,
        };
        self.conn.execute(
            "INSERT INTO activities (id, name, glyph, is_custom) VALUES (?1, ?2, ?3, 1)",
            params![activity.id, activity.name, activity.glyph],
        )?;
        Ok(activity)
    }

    pub fn update_activity(&self, id: &str, name: &str, glyph: &str) -> Result<bool, DatabaseError> {
        let affected = self.conn.execute(
            "UPDATE activities SET name = ?2, glyph = ?3 WHERE id = ?1",
            params![id, name, glyph],
        )?;
        Ok(affected > 0)
    }

    /// Delete an activity. Past session records keep their denormalized
    /// name/glyph snapshots; only the live selection is cleared when it
    /// pointed at the deleted entry.
    pub fn delete_activity(&self, id: &str) -> Result<bool, DatabaseError> {
        let affected = self
            .conn
            .execute("DELETE FROM activities WHERE id = ?1", params![id])?;
        if affected > 0 && self.selected_activity_id()?.as_deref() == Some(id) {
            self.clear_selected_activity()?;
        }
        Ok(affected > 0)
    }

    // ── Selection ────────────────────────────────────────────────────

    pub fn selected_activity_id(&self) -> Result<Option<String>, DatabaseError> {
        self.kv_get(SELECTED_ACTIVITY_KEY)
    }

    pub fn set_selected_activity(&self, id: &str) -> Result<(), DatabaseError> {
        self.kv_set(SELECTED_ACTIVITY_KEY, id)
    }

    pub fn clear_selected_activity(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "DELETE FROM kv WHERE key = ?1",
            params![SELECTED_ACTIVITY_KEY],
        )?;
        Ok(())
    }

    // ── Key-value ────────────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_list_sessions() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.insert_session("Study", "📚", 3, 90, now).unwrap();
        db.insert_session("Work", "💻", 1, 30, now).unwrap();

        let records = db.list_sessions().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].activity_name, "Study");
        assert_eq!(records[0].collected_count, 3);
        assert_eq!(records[0].duration_secs, 90);
        // Round-trips through RFC 3339 text.
        assert_eq!(records[0].completed_at.timestamp(), now.timestamp());
    }

    #[test]
    fn defaults_seeded_once() {
        let db = Database::open_memory().unwrap();
        let activities = db.list_activities().unwrap();
        assert_eq!(activities.len(), DEFAULT_ACTIVITIES.len());
        assert!(activities.iter().all(|a| !a.is_custom));

        // A second migration pass must not duplicate the seed.
        db.migrate().unwrap();
        assert_eq!(db.list_activities().unwrap().len(), DEFAULT_ACTIVITIES.len());
    }

    #[test]
    fn activity_crud() {
        let db = Database::open_memory().unwrap();
        let activity = db.create_activity("Piano", "🎹").unwrap();
        assert!(activity.is_custom);

        assert!(db.update_activity(&activity.id, "Guitar", "🎸").unwrap());
        let fetched = db.get_activity(&activity.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Guitar");

        assert!(db.delete_activity(&activity.id).unwrap());
        assert!(db.get_activity(&activity.id).unwrap().is_none());
        assert!(!db.delete_activity(&activity.id).unwrap());
    }

    #[test]
    fn deleting_selected_activity_clears_selection() {
        let db = Database::open_memory().unwrap();
        let activity = db.create_activity("Piano", "🎹").unwrap();
        db.set_selected_activity(&activity.id).unwrap();
        assert_eq!(
            db.selected_activity_id().unwrap().as_deref(),
            Some(activity.id.as_str())
        );

        db.delete_activity(&activity.id).unwrap();
        assert!(db.selected_activity_id().unwrap().is_none());
    }

    #[test]
    fn deleting_other_activity_keeps_selection() {
        let db = Database::open_memory().unwrap();
        let keep = db.create_activity("Piano", "🎹").unwrap();
        let other = db.create_activity("Chess", "♟️").unwrap();
        db.set_selected_activity(&keep.id).unwrap();

        db.delete_activity(&other.id).unwrap();
        assert_eq!(
            db.selected_activity_id().unwrap().as_deref(),
            Some(keep.id.as_str())
        );
    }

    #[test]
    fn deleting_activity_keeps_past_records() {
        let db = Database::open_memory().unwrap();
        let activity = db.create_activity("Piano", "🎹").unwrap();
        db.insert_session(&activity.name, &activity.glyph, 2, 60, Utc::now())
            .unwrap();

        db.delete_activity(&activity.id).unwrap();
        let records = db.list_sessions().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].activity_name, "Piano");
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coindrop.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.insert_session("Study", "📚", 1, 30, Utc::now()).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.list_sessions().unwrap().len(), 1);
        // Seeding only happens while the activities table is empty.
        assert_eq!(db.list_activities().unwrap().len(), DEFAULT_ACTIVITIES.len());
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }
}
