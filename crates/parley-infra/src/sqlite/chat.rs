//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `parley-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reads on the reader
//! pool and every write on the single writer connection.
//!
//! Each appended message gets the next per-session `seq` inside the same
//! transaction that bumps the session's counters. `seq` is the log order;
//! `created_at` is clamped so it never goes backwards within a session.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use parley_core::chat::repository::ChatRepository;
use parley_types::chat::{ChatMessage, ChatSession};
use parley_types::error::RepositoryError;
use parley_types::llm::MessageRole;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatSessionRow {
    id: String,
    owner_id: String,
    title: String,
    is_active: i64,
    message_count: i64,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            is_active: row.try_get("is_active")?,
            message_count: row.try_get("message_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        Ok(ChatSession {
            id: parse_uuid(&self.id, "session id")?,
            owner_id: parse_uuid(&self.owner_id, "owner_id")?,
            title: self.title,
            is_active: self.is_active != 0,
            message_count: self.message_count as u32,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct ChatMessageRow {
    id: String,
    session_id: String,
    role: String,
    content: String,
    metadata: Option<String>,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let metadata = self
            .metadata
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid message metadata: {e}")))?;

        Ok(ChatMessage {
            id: parse_uuid(&self.id, "message id")?,
            session_id: parse_uuid(&self.session_id, "session_id")?,
            role,
            content: self.content,
            metadata,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width UTC timestamps so `ORDER BY` on the text column is
/// chronological.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Drop precision the column cannot hold, so returned values equal what a
/// later read produces.
fn stored_precision(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.trunc_subsecs(6)
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        let mut stored = session.clone();
        stored.created_at = stored_precision(session.created_at);
        stored.updated_at = stored_precision(session.updated_at);

        sqlx::query(
            r#"INSERT INTO chat_sessions (id, owner_id, title, is_active, message_count, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(stored.id.to_string())
        .bind(stored.owner_id.to_string())
        .bind(&stored.title)
        .bind(stored.is_active as i64)
        .bind(stored.message_count as i64)
        .bind(format_datetime(&stored.created_at))
        .bind(format_datetime(&stored.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.message().contains("UNIQUE") {
                    return RepositoryError::Conflict(format!("session {} already exists", session.id));
                }
            }
            query_err(e)
        })?;

        Ok(stored)
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row).map_err(query_err)?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list_active_sessions(&self, owner_id: &Uuid) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_sessions WHERE owner_id = ? AND is_active = 1 ORDER BY updated_at DESC, id DESC",
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row = ChatSessionRow::from_row(row).map_err(query_err)?;
            sessions.push(session_row.into_session()?);
        }

        Ok(sessions)
    }

    async fn rename_session(
        &self,
        session_id: &Uuid,
        owner_id: &Uuid,
        title: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE chat_sessions SET title = ?, updated_at = ? WHERE id = ? AND owner_id = ? AND is_active = 1",
        )
        .bind(title)
        .bind(format_datetime(&Utc::now()))
        .bind(session_id.to_string())
        .bind(owner_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_session(&self, session_id: &Uuid, owner_id: &Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE chat_sessions SET is_active = 0, updated_at = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(format_datetime(&Utc::now()))
        .bind(session_id.to_string())
        .bind(owner_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<ChatMessage, RepositoryError> {
        let session_id = message.session_id.to_string();
        let metadata = message
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid message metadata: {e}")))?;

        // Transaction: next seq + INSERT message + UPDATE session counters
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let last: Option<(i64, String)> = sqlx::query_as(
            "SELECT seq, created_at FROM chat_messages WHERE session_id = ? ORDER BY seq DESC LIMIT 1",
        )
        .bind(&session_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_err)?;

        let mut created_at = stored_precision(message.created_at);
        let seq = match last {
            Some((last_seq, last_created_at)) => {
                created_at = created_at.max(parse_datetime(&last_created_at)?);
                last_seq + 1
            }
            None => 1,
        };

        sqlx::query(
            r#"INSERT INTO chat_messages (id, session_id, seq, role, content, metadata, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(&session_id)
        .bind(seq)
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(metadata)
        .bind(format_datetime(&created_at))
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        let updated = sqlx::query(
            "UPDATE chat_sessions SET message_count = message_count + 1, updated_at = ? WHERE id = ?",
        )
        .bind(format_datetime(&Utc::now()))
        .bind(&session_id)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(query_err)?;

        let mut stored = message.clone();
        stored.created_at = created_at;
        Ok(stored)
    }

    async fn get_messages(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM chat_messages WHERE session_id = ? ORDER BY seq ASC")
            .bind(session_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row = ChatMessageRow::from_row(row).map_err(query_err)?;
            messages.push(msg_row.into_message()?);
        }

        Ok(messages)
    }

    async fn last_message(&self, session_id: &Uuid) -> Result<Option<ChatMessage>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_messages WHERE session_id = ? ORDER BY seq DESC LIMIT 1")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => Ok(Some(ChatMessageRow::from_row(&row).map_err(query_err)?.into_message()?)),
            None => Ok(None),
        }
    }

    async fn get_message_count(&self, session_id: &Uuid) -> Result<u32, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM chat_messages WHERE session_id = ?")
            .bind(session_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let count: i64 = row.try_get("cnt").map_err(query_err)?;
        Ok(count as u32)
    }
}
