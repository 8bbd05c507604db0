use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, params};
use std::fs;
use std::path::Path;

/// Report store and entitlement lookup. One database per install; every
/// report row is scoped to the identity that created it.
pub struct Database {
    conn: Connection,
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

impl Database {
    pub fn drop(path: &Path) {
        let _ = fs::remove_file(path);
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS user_entitlements (
                user_id INTEGER PRIMARY KEY,
                is_pro INTEGER NOT NULL DEFAULT 0,
                pro_until TEXT,
                FOREIGN KEY(user_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS reports (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                target_url TEXT NOT NULL,
                created_at TEXT NOT NULL,
                report_json TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_reports_user ON reports(user_id);
            ",
        )?;
        Ok(())
    }

    // identity

    pub fn create_user(&self) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO users(created_at) VALUES (?1)",
            params![now_iso()],
        )?;
        let user_id = self.conn.last_insert_rowid();
        self.conn.execute(
            "INSERT OR REPLACE INTO user_entitlements(user_id, is_pro, pro_until) VALUES (?1, 0, NULL)",
            params![user_id],
        )?;
        Ok(user_id)
    }

    /// Reuse the first identity in the database, creating one if needed.
    /// A CLI install is effectively single-user.
    pub fn default_user(&self) -> Result<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row("SELECT id FROM users ORDER BY id LIMIT 1", [], |row| row.get(0))
            .optional()?;
        match existing {
            Some(id) => Ok(id),
            None => self.create_user(),
        }
    }

    // entitlements

    pub fn is_user_pro(&self, user_id: i64) -> Result<bool> {
        let row: Option<(i64, Option<String>)> = self
            .conn
            .query_row(
                "SELECT is_pro, pro_until FROM user_entitlements WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((is_pro, pro_until)) = row else {
            return Ok(false);
        };
        if is_pro != 1 {
            return Ok(false);
        }
        let Some(pro_until) = pro_until else {
            return Ok(true);
        };
        // an unreadable expiry keeps the entitlement rather than revoking it
        match DateTime::parse_from_rfc3339(&pro_until) {
            Ok(until) => Ok(until.with_timezone(&Utc) >= Utc::now()),
            Err(_) => Ok(true),
        }
    }

    pub fn set_pro(&self, user_id: i64, is_pro: bool, pro_until: Option<&str>) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO user_entitlements(user_id, is_pro, pro_until) VALUES (?1, ?2, ?3)",
            params![user_id, is_pro as i64, pro_until],
        )?;
        Ok(())
    }

    // reports

    pub fn insert_report(&self, user_id: i64, target_url: &str, report_json: &str) -> Result<String> {
        let report_id = uuid::Uuid::new_v4().simple().to_string()[..12].to_string();
        self.conn.execute(
            "INSERT INTO reports(id, user_id, target_url, created_at, report_json) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![report_id, user_id, target_url, now_iso(), report_json],
        )?;
        Ok(report_id)
    }

    /// Fetch a report by id, scoped to the identity that stored it.
    pub fn get_report(&self, report_id: &str, user_id: i64) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT report_json FROM reports WHERE id = ?1 AND user_id = ?2",
                params![report_id, user_id],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn list_reports(&self, user_id: i64) -> Result<Vec<(String, String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, target_url, created_at FROM reports WHERE user_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}
