use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{ChatMessage, JournalEntry, Streak, Task, User};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Failed to serialize record '{key}': {source}")]
    SerializeError {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The five independently stored records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKey {
    Tasks,
    Journal,
    Streak,
    ChatHistory,
    User,
}

impl RecordKey {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKey::Tasks => "aurora_tasks",
            RecordKey::Journal => "aurora_journal",
            RecordKey::Streak => "aurora_streak",
            RecordKey::ChatHistory => "aurora_chat_history",
            RecordKey::User => "aurora_user",
        }
    }
}

/// Key/value record store backed by a single SQLite table.
///
/// Every record is stored as JSON text under its key. Writes are
/// independent; nothing ties two records together transactionally.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        tracing::debug!(path = %db_path.display(), "opened record store");

        let db = Database { conn };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Open a throwaway in-memory store
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Read the raw stored text for a key
    pub fn get_raw(&self, key: RecordKey) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM records WHERE key = ?1",
                rusqlite::params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Store raw text under a key, replacing any previous value
    pub fn put_raw(&self, key: RecordKey, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO records (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![
                key.as_str(),
                value,
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
            ],
        )?;
        Ok(())
    }

    fn save<T: Serialize + ?Sized>(&self, key: RecordKey, record: &T) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(record).map_err(|source| DatabaseError::SerializeError {
            key: key.as_str(),
            source,
        })?;
        self.put_raw(key, &json)
    }

    /// Load a record, treating absence, read failures and corrupt values as "no record"
    fn load<T: DeserializeOwned>(&self, key: RecordKey) -> Option<T> {
        let raw = match self.get_raw(key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "failed to read record, using default");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "corrupt record, using default");
                None
            }
        }
    }

    /// Store the full task collection (every day, not only today)
    pub fn save_tasks(&self, tasks: &[Task]) -> Result<(), DatabaseError> {
        self.save(RecordKey::Tasks, tasks)
    }

    /// Tasks belonging to one calendar day (YYYY-MM-DD)
    pub fn load_tasks(&self, date: &str) -> Vec<Task> {
        self.load_all_tasks()
            .into_iter()
            .filter(|task| task.date == date)
            .collect()
    }

    pub fn load_all_tasks(&self) -> Vec<Task> {
        self.load(RecordKey::Tasks).unwrap_or_default()
    }

    pub fn save_journal_entries(&self, entries: &[JournalEntry]) -> Result<(), DatabaseError> {
        self.save(RecordKey::Journal, entries)
    }

    pub fn load_journal_entries(&self) -> Vec<JournalEntry> {
        self.load(RecordKey::Journal).unwrap_or_default()
    }

    pub fn save_streak(&self, streak: &Streak) -> Result<(), DatabaseError> {
        self.save(RecordKey::Streak, streak)
    }

    pub fn load_streak(&self) -> Streak {
        self.load(RecordKey::Streak).unwrap_or_default()
    }

    pub fn save_chat_history(&self, messages: &[ChatMessage]) -> Result<(), DatabaseError> {
        self.save(RecordKey::ChatHistory, messages)
    }

    pub fn load_chat_history(&self) -> Vec<ChatMessage> {
        self.load(RecordKey::ChatHistory).unwrap_or_default()
    }

    pub fn save_user(&self, user: &User) -> Result<(), DatabaseError> {
        self.save(RecordKey::User, user)
    }

    pub fn load_user(&self) -> Option<User> {
        self.load(RecordKey::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;

    fn task(id: &str, text: &str, date: &str) -> Task {
        Task {
            id: id.to_string(),
            text: text.to_string(),
            completed: false,
            date: date.to_string(),
        }
    }

    #[test]
    fn empty_store_yields_defaults() {
        let db = Database::in_memory().unwrap();
        assert!(db.load_all_tasks().is_empty());
        assert!(db.load_tasks("2026-10-19").is_empty());
        assert!(db.load_journal_entries().is_empty());
        assert_eq!(db.load_streak(), Streak { count: 0, last_update: String::new() });
        assert!(db.load_chat_history().is_empty());
        assert_eq!(db.load_user(), None);
    }

    #[test]
    fn records_round_trip() {
        let db = Database::in_memory().unwrap();

        let tasks = vec![task("2026-10-19-1", "Walk", "2026-10-19")];
        db.save_tasks(&tasks).unwrap();
        assert_eq!(db.load_all_tasks(), tasks);

        let entries = vec![JournalEntry {
            id: "1760900000000".into(),
            title: "Morning".into(),
            content: "Slept well".into(),
            date: "2026-10-19T08:00:00".into(),
        }];
        db.save_journal_entries(&entries).unwrap();
        assert_eq!(db.load_journal_entries(), entries);

        let streak = Streak { count: 3, last_update: "2026-10-19".into() };
        db.save_streak(&streak).unwrap();
        assert_eq!(db.load_streak(), streak);

        let history = vec![
            ChatMessage::user("hello"),
            ChatMessage::model("ideas").with_suggestions(vec!["Stretch".into()]),
        ];
        db.save_chat_history(&history).unwrap();
        assert_eq!(db.load_chat_history(), history);
        assert_eq!(db.load_chat_history()[1].role, ChatRole::Model);

        let user = User { name: "Sam".into() };
        db.save_user(&user).unwrap();
        assert_eq!(db.load_user(), Some(user));
    }

    #[test]
    fn saving_replaces_previous_value() {
        let db = Database::in_memory().unwrap();
        db.save_streak(&Streak { count: 1, last_update: "2026-10-18".into() }).unwrap();
        db.save_streak(&Streak { count: 2, last_update: "2026-10-19".into() }).unwrap();
        assert_eq!(db.load_streak().count, 2);
    }

    #[test]
    fn load_tasks_filters_by_day() {
        let db = Database::in_memory().unwrap();
        db.save_tasks(&[
            task("2026-10-18-1", "Walk", "2026-10-18"),
            task("2026-10-19-1", "Walk", "2026-10-19"),
            task("2026-10-19-2", "Read", "2026-10-19"),
        ])
        .unwrap();

        let today = db.load_tasks("2026-10-19");
        assert_eq!(today.len(), 2);
        assert!(today.iter().all(|t| t.date == "2026-10-19"));
        assert_eq!(db.load_tasks("2026-10-17"), Vec::new());
    }

    #[test]
    fn corrupt_values_are_treated_as_absent() {
        let db = Database::in_memory().unwrap();
        db.put_raw(RecordKey::Tasks, "[{not json").unwrap();
        db.put_raw(RecordKey::Streak, r#"{"count":"many"}"#).unwrap();
        db.put_raw(RecordKey::User, "42").unwrap();

        assert!(db.load_all_tasks().is_empty());
        assert_eq!(db.load_streak(), Streak::default());
        assert_eq!(db.load_user(), None);
    }

    #[test]
    fn file_backed_store_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("app.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::new(path).unwrap();
            db.save_user(&User { name: "Ada".into() }).unwrap();
        }

        let db = Database::new(path).unwrap();
        assert_eq!(db.load_user(), Some(User { name: "Ada".into() }));
    }
}
