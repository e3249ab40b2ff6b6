//! Question/answer history.
//!
//! Two logs share one shape: answers to clarifying questions, fed back into
//! the next analysis prompt, and the corpus chat conversation. Stores are
//! injected so handlers never touch a concrete backend.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing::info;

use crate::models::history::QaHistoryRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
}

impl From<QaHistoryRow> for QaRecord {
    fn from(row: QaHistoryRow) -> Self {
        Self {
            question: row.question,
            answer: row.answer,
        }
    }
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All records, oldest first.
    async fn load(&self) -> Result<Vec<QaRecord>>;
    async fn append(&self, record: QaRecord) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Which log a Postgres store reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryLog {
    Clarify,
    Chat,
}

impl HistoryLog {
    fn table(self) -> &'static str {
        match self {
            HistoryLog::Clarify => "qa_history",
            HistoryLog::Chat => "chat_history",
        }
    }
}

/// Renders history as `Q: ..\nA: ..` blocks separated by blank lines.
pub fn format_history(records: &[QaRecord]) -> String {
    records
        .iter()
        .map(|r| format!("Q: {}\nA: {}", r.question, r.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres
// ────────────────────────────────────────────────────────────────────────────

pub struct PgHistoryStore {
    pool: PgPool,
    log: HistoryLog,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool, log: HistoryLog) -> Self {
        Self { pool, log }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn load(&self) -> Result<Vec<QaRecord>> {
        let sql = format!(
            "SELECT id, question, answer, created_at FROM {} ORDER BY id ASC",
            self.log.table()
        );
        let rows = sqlx::query_as::<_, QaHistoryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(QaRecord::from).collect())
    }

    async fn append(&self, record: QaRecord) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (question, answer) VALUES ($1, $2)",
            self.log.table()
        );
        sqlx::query(&sql)
            .bind(&record.question)
            .bind(&record.answer)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let sql = format!("DELETE FROM {}", self.log.table());
        let deleted = sqlx::query(&sql).execute(&self.pool).await?.rows_affected();
        info!("Cleared {deleted} rows from {}", self.log.table());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: Mutex<Vec<QaRecord>>,
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn load(&self) -> Result<Vec<QaRecord>> {
        Ok(self.records.lock().await.clone())
    }

    async fn append(&self, record: QaRecord) -> Result<()> {
        self.records.lock().await.push(record);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.records.lock().await.clear();
        Ok(())
    }
}
