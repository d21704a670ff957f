use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{Connection, params};
use shopchat_common::{ConversationTurn, Error, Result};
use tracing::info;

use crate::history::{HistoryStore, parse_lines};

/// Conversation history kept in a local SQLite database.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening history store at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Store(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| Error::Store(format!("failed to set pragmas: {e}")))?;

        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Store(format!("failed to open in-memory database: {e}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS turns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                line TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_turns_user
                ON turns(user_id, id);",
        )
        .map_err(|e| Error::Store(format!("migration failed: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Store("history connection lock poisoned".into()))
    }

    /// Number of stored turns for a user.
    pub fn count(&self, user_id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM turns WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(|e| Error::Store(format!("failed to count turns: {e}")))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    fn backend(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, user_id: &str, turn: &ConversationTurn) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO turns (user_id, line, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, turn.to_string(), chrono::Utc::now().to_rfc3339()],
        )
        .map_err(|e| Error::Store(format!("failed to append turn: {e}")))?;
        Ok(())
    }

    async fn append_many(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Store(format!("failed to begin append: {e}")))?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO turns (user_id, line, created_at) VALUES (?1, ?2, ?3)")
                .map_err(|e| Error::Store(format!("failed to prepare append: {e}")))?;
            let now = chrono::Utc::now().to_rfc3339();
            for turn in turns {
                stmt.execute(params![user_id, turn.to_string(), now])
                    .map_err(|e| Error::Store(format!("failed to append turn: {e}")))?;
            }
        }
        tx.commit()
            .map_err(|e| Error::Store(format!("failed to commit append: {e}")))?;
        Ok(())
    }

    async fn read_all(&self, user_id: &str) -> Result<Vec<ConversationTurn>> {
        let lines = {
            let conn = self.lock()?;
            let mut stmt = conn
                .prepare("SELECT line FROM turns WHERE user_id = ?1 ORDER BY id ASC")
                .map_err(|e| Error::Store(format!("failed to prepare history query: {e}")))?;

            let rows = stmt
                .query_map(params![user_id], |row| row.get::<_, String>(0))
                .map_err(|e| Error::Store(format!("failed to load history: {e}")))?;

            let mut lines = Vec::new();
            for row in rows {
                lines.push(
                    row.map_err(|e| Error::Store(format!("failed to read history row: {e}")))?,
                );
            }
            lines
        };

        Ok(parse_lines(user_id, lines))
    }

    async fn trim(&self, user_id: &str, keep_last: usize) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn
            .execute(
                "DELETE FROM turns WHERE user_id = ?1 AND id NOT IN (
                    SELECT id FROM turns WHERE user_id = ?1
                    ORDER BY id DESC LIMIT ?2
                )",
                params![user_id, keep_last as i64],
            )
            .map_err(|e| Error::Store(format!("failed to trim history: {e}")))?;
        Ok(deleted)
    }

    async fn health_check(&self) -> Result<bool> {
        let conn = self.lock()?;
        Ok(conn.execute_batch("SELECT 1;").is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopchat_common::TurnRole;

    #[tokio::test]
    async fn append_and_read_in_order() {
        let store = SqliteHistoryStore::in_memory().expect("in-memory store should open");

        store
            .append("u1", &ConversationTurn::user("show me laptops"))
            .await
            .unwrap();
        store
            .append("u1", &ConversationTurn::ai("We have Laptop X."))
            .await
            .unwrap();
        store
            .append("u2", &ConversationTurn::user("hello"))
            .await
            .unwrap();

        let turns = store.read_all("u1").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], ConversationTurn::user("show me laptops"));
        assert_eq!(turns[1].role, TurnRole::Ai);
        assert_eq!(store.count("u2").unwrap(), 1);
    }

    #[tokio::test]
    async fn append_many_is_all_or_nothing() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store
            .append_many(
                "u1",
                &[ConversationTurn::user("hi"), ConversationTurn::ai("hello")],
            )
            .await
            .unwrap();

        store
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_ai BEFORE INSERT ON turns
                 WHEN NEW.line LIKE 'AI:%'
                 BEGIN SELECT RAISE(ABORT, 'connection reset'); END;",
            )
            .unwrap();

        let err = store
            .append_many(
                "u1",
                &[ConversationTurn::user("again"), ConversationTurn::ai("lost")],
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"), "got {err}");

        let turns = store.read_all("u1").await.unwrap();
        assert_eq!(
            turns,
            vec![ConversationTurn::user("hi"), ConversationTurn::ai("hello")]
        );
    }

    #[tokio::test]
    async fn unknown_user_reads_empty() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        assert!(store.read_all("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn trim_keeps_newest_turns() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        for i in 0..6 {
            store
                .append("u1", &ConversationTurn::user(format!("q{i}")))
                .await
                .unwrap();
        }
        store.append("u2", &ConversationTurn::user("other")).await.unwrap();

        let deleted = store.trim("u1", 4).await.unwrap();
        assert_eq!(deleted, 2);

        let texts: Vec<String> = store
            .read_all("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, vec!["q2", "q3", "q4", "q5"]);
        assert_eq!(store.count("u2").unwrap(), 1);
    }

    #[tokio::test]
    async fn unreadable_lines_are_skipped() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO turns (user_id, line, created_at) VALUES ('u1', 'garbage', '')",
                [],
            )
            .unwrap();
        store.append("u1", &ConversationTurn::ai("ok")).await.unwrap();

        let turns = store.read_all("u1").await.unwrap();
        assert_eq!(turns, vec![ConversationTurn::ai("ok")]);
    }

    #[tokio::test]
    async fn history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let store = SqliteHistoryStore::open(&path).unwrap();
            store.append("u1", &ConversationTurn::user("hi")).await.unwrap();
            store.append("u1", &ConversationTurn::ai("hello")).await.unwrap();
        }

        let reopened = SqliteHistoryStore::open(&path).unwrap();
        assert_eq!(reopened.read_all("u1").await.unwrap().len(), 2);
        assert!(reopened.health_check().await.unwrap());
    }
}
